/// Known real-estate domains search hits are allowed to come from. A hit
/// whose URL host isn't on this list is dropped before extraction spends
/// an LLM call on it.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "idealista.pt",
    "imovirtual.com",
    "casa.sapo.pt",
    "olx.pt",
    "zillow.com",
    "redfin.com",
];

#[must_use]
pub fn is_allowed(url: &str) -> bool {
    source_priority(url) > 0
}

/// Ranks `url`'s host by its position in [`DEFAULT_ALLOWED_DOMAINS`]: the
/// earlier a domain appears in the list, the higher its priority. Returns
/// `0` for a host not on the allow-list at all (candidates from such a
/// host never reach the ranking step, since [`is_allowed`] already dropped
/// them before extraction, but the ranking key needs a total order).
#[must_use]
pub fn source_priority(url: &str) -> usize {
    let Some(host) = extract_host(url) else {
        return 0;
    };
    DEFAULT_ALLOWED_DOMAINS
        .iter()
        .position(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        .map_or(0, |index| DEFAULT_ALLOWED_DOMAINS.len() - index)
}

fn extract_host(url: &str) -> Option<&str> {
    let without_scheme = url.split("://").nth(1)?;
    let host = without_scheme.split('/').next()?;
    Some(host.trim_start_matches("www."))
}

#[cfg(test)]
mod tests {
    use super::is_allowed;

    #[test]
    fn allows_known_domain() {
        assert!(is_allowed("https://www.idealista.pt/imovel/123"));
    }

    #[test]
    fn rejects_unknown_domain() {
        assert!(!is_allowed("https://example.com/imovel/123"));
    }

    #[test]
    fn allows_subdomain_of_known_domain() {
        assert!(is_allowed("https://m.olx.pt/anuncio/1"));
    }

    #[test]
    fn earlier_domain_in_list_has_higher_priority() {
        use super::source_priority;
        let idealista = source_priority("https://www.idealista.pt/imovel/1");
        let redfin = source_priority("https://www.redfin.com/home/1");
        assert!(idealista > redfin);
    }

    #[test]
    fn unknown_domain_has_zero_priority() {
        use super::source_priority;
        assert_eq!(source_priority("https://example.com/x"), 0);
    }
}
