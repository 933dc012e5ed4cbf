//! Expected-vs-actual comparison messages.
//!
//! Long renderings are compacted around the first difference: the common prefix and common suffix keep at
//! most [`CONTEXT_LENGTH`] characters next to the differing section, the rest collapses to `...`.
//!
//! ## Notes
//! - Compaction works on Unicode scalars (`char`), never splitting a multi-byte character.
//! - Identical renderings are returned unchanged.

use std::fmt;

/// Characters of shared context kept on each side of a difference.
pub const CONTEXT_LENGTH: usize = 20;

const ELLIPSIS: &str = "...";

/// Rendered expected/actual values of a failed comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub expected: String,
    pub actual: String,
}

impl Comparison {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Return the compacted `(expected, actual)` pair.
    pub fn compacted(&self) -> (String, String) {
        compact(&self.expected, &self.actual)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (expected, actual) = self.compacted();
        write!(f, "expected [{expected}] but was [{actual}]")
    }
}

/// Compact two renderings around their first difference.
///
/// ## Examples
/// ```rust
/// use verity_core::compare::compact;
///
/// let (e, a) = compact("Hello World", "Hello There");
/// assert_eq!((e.as_str(), a.as_str()), ("Hello World", "Hello There"));
///
/// let long = "x".repeat(30);
/// let (e, _) = compact(&format!("{long}A"), &format!("{long}B"));
/// assert_eq!(e, format!("...{}A", "x".repeat(20)));
/// ```
pub fn compact(expected: &str, actual: &str) -> (String, String) {
    if expected == actual {
        return (expected.to_string(), actual.to_string());
    }

    let e: Vec<char> = expected.chars().collect();
    let a: Vec<char> = actual.chars().collect();
    let shorter = e.len().min(a.len());

    let prefix = e.iter().zip(a.iter()).take_while(|(x, y)| x == y).count();
    let suffix = e
        .iter()
        .rev()
        .zip(a.iter().rev())
        .take(shorter - prefix)
        .take_while(|(x, y)| x == y)
        .count();

    (render(&e, prefix, suffix), render(&a, prefix, suffix))
}

fn render(chars: &[char], prefix: usize, suffix: usize) -> String {
    let end = chars.len() - suffix;
    let mut out = String::with_capacity(chars.len() + 2 * ELLIPSIS.len());

    if prefix > CONTEXT_LENGTH {
        out.push_str(ELLIPSIS);
        out.extend(&chars[prefix - CONTEXT_LENGTH..prefix]);
    } else {
        out.extend(&chars[..prefix]);
    }

    out.extend(&chars[prefix..end]);

    if suffix > CONTEXT_LENGTH {
        out.extend(&chars[end..end + CONTEXT_LENGTH]);
        out.push_str(ELLIPSIS);
    } else {
        out.extend(&chars[end..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_strings_unchanged() {
        let (e, a) = compact("abc", "abd");
        assert_eq!(e, "abc");
        assert_eq!(a, "abd");
    }

    #[test]
    fn test_long_prefix_and_suffix_collapse() {
        let head = "a".repeat(30);
        let tail = "b".repeat(30);
        let (e, a) = compact(&format!("{head}X{tail}"), &format!("{head}Y{tail}"));
        assert_eq!(e, format!("...{}X{}...", "a".repeat(20), "b".repeat(20)));
        assert_eq!(a, format!("...{}Y{}...", "a".repeat(20), "b".repeat(20)));
    }

    #[test]
    fn test_prefix_of_other_string() {
        let (e, a) = compact("abc", "abcdef");
        assert_eq!(e, "abc");
        assert_eq!(a, "abcdef");
    }

    #[test]
    fn test_identical_strings() {
        let long = "z".repeat(50);
        let (e, a) = compact(&long, &long);
        assert_eq!(e, long);
        assert_eq!(a, long);
    }

    #[test]
    fn test_multibyte_characters() {
        let head = "ä".repeat(25);
        let (e, a) = compact(&format!("{head}ö"), &format!("{head}ü"));
        assert_eq!(e, format!("...{}ö", "ä".repeat(20)));
        assert_eq!(a, format!("...{}ü", "ä".repeat(20)));
    }

    #[test]
    fn test_display_message() {
        let c = Comparison::new("1", "2");
        assert_eq!(c.to_string(), "expected [1] but was [2]");
    }
}
