/// A named location known to the location filter (§4.6 of the concierge
/// requirements), with a canonical label, its common aliases, and the
/// center point used for the bounding-box fallback check.
#[derive(Debug, Clone, Copy)]
pub struct Municipality {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub center_lat: f64,
    pub center_lon: f64,
}

/// The 16 Algarve municipalities plus the major non-Algarve localities
/// referenced in housing listings (Lisboa, Porto, Cascais, Sintra, and a
/// handful of their parishes). Used by the research agent's location filter
/// and by its bounding-box fallback.
pub const MUNICIPALITIES: &[Municipality] = &[
    Municipality {
        canonical: "Albufeira",
        aliases: &["albufeira"],
        center_lat: 37.0891,
        center_lon: -8.2482,
    },
    Municipality {
        canonical: "Alcoutim",
        aliases: &["alcoutim"],
        center_lat: 37.4694,
        center_lon: -7.4722,
    },
    Municipality {
        canonical: "Aljezur",
        aliases: &["aljezur"],
        center_lat: 37.3189,
        center_lon: -8.8028,
    },
    Municipality {
        canonical: "Castro Marim",
        aliases: &["castro marim"],
        center_lat: 37.2192,
        center_lon: -7.4428,
    },
    Municipality {
        canonical: "Faro",
        aliases: &["faro"],
        center_lat: 37.0194,
        center_lon: -7.9304,
    },
    Municipality {
        canonical: "Lagoa",
        aliases: &["lagoa", "lagoa (algarve)"],
        center_lat: 37.1392,
        center_lon: -8.4528,
    },
    Municipality {
        canonical: "Lagos",
        aliases: &["lagos"],
        center_lat: 37.1022,
        center_lon: -8.6742,
    },
    Municipality {
        canonical: "Loulé",
        aliases: &["loule", "loulé"],
        center_lat: 37.1372,
        center_lon: -8.0224,
    },
    Municipality {
        canonical: "Monchique",
        aliases: &["monchique"],
        center_lat: 37.3167,
        center_lon: -8.5583,
    },
    Municipality {
        canonical: "Olhão",
        aliases: &["olhao", "olhão"],
        center_lat: 37.0272,
        center_lon: -7.8408,
    },
    Municipality {
        canonical: "Portimão",
        aliases: &["portimao", "portimão"],
        center_lat: 37.1392,
        center_lon: -8.5383,
    },
    Municipality {
        canonical: "São Brás de Alportel",
        aliases: &["sao bras de alportel", "são brás de alportel", "sao bras"],
        center_lat: 37.1508,
        center_lon: -7.8883,
    },
    Municipality {
        canonical: "Silves",
        aliases: &["silves"],
        center_lat: 37.1908,
        center_lon: -8.4386,
    },
    Municipality {
        canonical: "Tavira",
        aliases: &["tavira"],
        center_lat: 37.1264,
        center_lon: -7.6486,
    },
    Municipality {
        canonical: "Vila do Bispo",
        aliases: &["vila do bispo"],
        center_lat: 37.0833,
        center_lon: -8.9,
    },
    Municipality {
        canonical: "Vila Real de Santo António",
        aliases: &[
            "vila real de santo antonio",
            "vila real de santo antónio",
            "vrsa",
        ],
        center_lat: 37.1950,
        center_lon: -7.4153,
    },
    Municipality {
        canonical: "Lisboa",
        aliases: &["lisboa", "lisbon"],
        center_lat: 38.7223,
        center_lon: -9.1393,
    },
    Municipality {
        canonical: "Porto",
        aliases: &["porto", "oporto"],
        center_lat: 41.1579,
        center_lon: -8.6291,
    },
    Municipality {
        canonical: "Cascais",
        aliases: &["cascais"],
        center_lat: 38.6979,
        center_lon: -9.4215,
    },
    Municipality {
        canonical: "Sintra",
        aliases: &["sintra"],
        center_lat: 38.8029,
        center_lon: -9.3817,
    },
];

/// Looks up a municipality by canonical name or any known alias,
/// case-insensitively. Callers normalize diacritics before calling this
/// (see `concierge_research`'s location filter), so aliases are listed in
/// both accented and unaccented forms.
#[must_use]
pub fn find(token: &str) -> Option<&'static Municipality> {
    let token = token.to_lowercase();
    MUNICIPALITIES.iter().find(|m| {
        m.canonical.to_lowercase() == token || m.aliases.iter().any(|a| *a == token)
    })
}

/// Half-width, in degrees, of the bounding box used by
/// [`coordinates_within_bounding_box`].
const BOUNDING_BOX_DEGREES: f64 = 0.5;

/// `true` if `(lat, lon)` falls within a ~0.5° bounding box around
/// `location`'s known center. A `location` not found in [`MUNICIPALITIES`]
/// is treated as unconstrained (returns `true`) rather than rejecting
/// every candidate for a locality the table doesn't cover.
#[must_use]
pub fn coordinates_within_bounding_box(lat: f64, lon: f64, location: &str) -> bool {
    let Some(municipality) = find(location) else {
        return true;
    };
    (lat - municipality.center_lat).abs() <= BOUNDING_BOX_DEGREES
        && (lon - municipality.center_lon).abs() <= BOUNDING_BOX_DEGREES
}

#[cfg(test)]
mod tests {
    use super::{coordinates_within_bounding_box, find, MUNICIPALITIES};

    #[test]
    fn covers_sixteen_algarve_municipalities_plus_majors() {
        assert!(MUNICIPALITIES.len() >= 20);
    }

    #[test]
    fn finds_by_alias_case_insensitive() {
        assert_eq!(find("FARO").unwrap().canonical, "Faro");
        assert_eq!(find("loule").unwrap().canonical, "Loulé");
    }

    #[test]
    fn unknown_token_is_none() {
        assert!(find("Neverland").is_none());
    }

    #[test]
    fn bounding_box_accepts_nearby_coordinate() {
        assert!(coordinates_within_bounding_box(37.02, -7.93, "Faro"));
    }

    #[test]
    fn bounding_box_rejects_distant_coordinate() {
        assert!(!coordinates_within_bounding_box(41.15, -8.62, "Faro"));
    }

    #[test]
    fn bounding_box_is_unconstrained_for_unknown_location() {
        assert!(coordinates_within_bounding_box(0.0, 0.0, "Neverland"));
    }
}
