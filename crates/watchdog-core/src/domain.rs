//! Parsing of user-entered domain lists

/// Full-width comma, as typed by CJK input methods
const FULL_WIDTH_COMMA: char = '，';

/// Split a user-entered domain list into trimmed domain names
///
/// Domains may be separated by `,` or the full-width `，`, with any
/// whitespace around them. Order is preserved and duplicates are kept.
/// Empty entries (from `a.com,,b.com` or a trailing comma) are dropped.
///
/// ```
/// use watchdog_core::domain::parse_domains;
///
/// assert_eq!(parse_domains(" a.com， b.com "), vec!["a.com", "b.com"]);
/// assert!(parse_domains("   ").is_empty());
/// ```
pub fn parse_domains(input: &str) -> Vec<String> {
    let normalized = input.replace(FULL_WIDTH_COMMA, ",");
    let normalized = normalized.trim();

    if normalized.is_empty() {
        return Vec::new();
    }

    normalized
        .split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_domains() {
        assert!(parse_domains("").is_empty());
        assert!(parse_domains(" \t ").is_empty());
    }

    #[test]
    fn single_domain_is_trimmed() {
        assert_eq!(parse_domains("a.com"), vec!["a.com"]);
        assert_eq!(parse_domains("  a.com \n"), vec!["a.com"]);
    }

    #[test]
    fn comma_separated_domains_keep_order_and_duplicates() {
        assert_eq!(parse_domains("a.com, b.com"), vec!["a.com", "b.com"]);
        assert_eq!(
            parse_domains("b.com,a.com , b.com"),
            vec!["b.com", "a.com", "b.com"]
        );
    }

    #[test]
    fn full_width_comma_matches_half_width() {
        assert_eq!(parse_domains("a.com， b.com"), parse_domains("a.com, b.com"));
        assert_eq!(
            parse_domains("a.com，b.com,c.com"),
            vec!["a.com", "b.com", "c.com"]
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(parse_domains("a.com,,b.com,"), vec!["a.com", "b.com"]);
        assert!(parse_domains(" , ，").is_empty());
    }
}
