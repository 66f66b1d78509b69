//! IPv6 textual canonicalization
//!
//! Providers and discovery endpoints do not agree on how they print an IPv6
//! address. Every address is expanded to its eight-group form before it is
//! stored or compared, so that two spellings of the same address compare
//! equal as strings.

/// Number of 16-bit groups in an IPv6 address
const GROUP_COUNT: usize = 8;

/// Expand a `::`-compressed IPv6 address to its eight-group form
///
/// Groups are not zero-padded: `2001:db8::1` becomes
/// `2001:db8:0:0:0:0:0:1`. Input without `::` is returned unchanged, which
/// makes the function idempotent on its own output.
///
/// # Limitations
///
/// The input is not validated. Addresses with more than one `::`, with more
/// than eight groups, or with an embedded IPv4 tail produce unspecified
/// (but non-panicking) output.
///
/// # Example
///
/// ```
/// use watchdog_core::ipv6::canonicalize_ipv6;
///
/// assert_eq!(canonicalize_ipv6("fe80::1:2"), "fe80:0:0:0:0:0:1:2");
/// assert_eq!(canonicalize_ipv6("::"), "0:0:0:0:0:0:0:0");
/// ```
pub fn canonicalize_ipv6(address: &str) -> String {
    let Some((left, right)) = address.split_once("::") else {
        return address.to_string();
    };

    match (left.is_empty(), right.is_empty()) {
        (true, true) => vec!["0"; GROUP_COUNT].join(":"),
        (true, false) => {
            let missing = GROUP_COUNT.saturating_sub(group_count(right));
            format!("{}{}", "0:".repeat(missing), right)
        }
        (false, true) => {
            let missing = GROUP_COUNT.saturating_sub(group_count(left));
            format!("{}{}", left, ":0".repeat(missing))
        }
        (false, false) => {
            let missing = GROUP_COUNT.saturating_sub(group_count(left) + group_count(right));
            format!("{}{}:{}", left, ":0".repeat(missing), right)
        }
    }
}

/// Number of `:`-delimited segments in one side of a `::`
fn group_count(part: &str) -> usize {
    part.split(':').count()
}
