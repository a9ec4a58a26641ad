//! Coerces an LLM's free-text reply into parseable JSON.
//!
//! Three steps, each attempted only if the previous one did not already
//! yield valid JSON:
//!
//! 1. Strip surrounding markdown code fences.
//! 2. Extract the largest balanced `{...}` or `[...]` substring.
//! 3. Give up — the caller decides whether to retry with a stricter
//!    prompt.

/// Attempts to coerce `raw` into a JSON string that `serde_json` can
/// parse. Returns `None` if no balanced JSON value could be recovered.
#[must_use]
pub fn repair(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed.to_owned());
    }

    let unfenced = strip_fences(trimmed);
    if serde_json::from_str::<serde_json::Value>(&unfenced).is_ok() {
        return Some(unfenced);
    }

    let extracted = extract_balanced(&unfenced)?;
    if serde_json::from_str::<serde_json::Value>(&extracted).is_ok() {
        return Some(extracted);
    }

    None
}

/// Removes a leading ` ```json ` / ` ``` ` fence and trailing ` ``` `, if
/// present. Leaves the input untouched otherwise.
fn strip_fences(input: &str) -> String {
    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start_matches("json").trim_start_matches("JSON");
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim().to_owned()
}

/// Scans `input` for the largest substring that starts with `{`/`[` and
/// ends with the matching balanced `}`/`]`, ignoring brace/bracket
/// characters that occur inside string literals.
fn extract_balanced(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut best: Option<(usize, usize)> = None;

    for (start, &open) in bytes.iter().enumerate() {
        let close = match open {
            b'{' => b'}',
            b'[' => b']',
            _ => continue,
        };

        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
                continue;
            }

            match c {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' if c == close || depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset + 1;
                        let len = end - start;
                        if best.is_none_or(|(bs, be)| len > be - bs) {
                            best = Some((start, end));
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    best.map(|(s, e)| input[s..e].to_owned())
}

#[cfg(test)]
mod tests {
    use super::repair;

    #[test]
    fn accepts_already_valid_json() {
        assert_eq!(repair("{\"a\":1}"), Some("{\"a\":1}".to_owned()));
    }

    #[test]
    fn strips_markdown_fence() {
        let input = "```json\n{\"a\":1}\n```";
        assert_eq!(repair(input), Some("{\"a\":1}".to_owned()));
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let input = "Sure, here you go: {\"a\":1,\"b\":[1,2,3]} hope that helps!";
        let got = repair(input).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&got).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn rejects_input_with_no_balanced_json() {
        assert_eq!(repair("just some prose, no json here"), None);
    }

    #[test]
    fn ignores_braces_inside_string_literals() {
        let input = "{\"text\":\"a { b } c\",\"n\":1}";
        let got = repair(input).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&got).unwrap();
        assert_eq!(parsed["n"], 1);
    }
}
