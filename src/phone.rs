// 📞 Phone Normalizer
// US-only normalization: "(254)954-1289" → "1-254-954-1289", extensions split off at the first 'x'

use serde::{Deserialize, Serialize};

/// Country code prefix added to every number that does not already carry it
pub const US_PREFIX: &str = "1-";

/// A normalized phone number with its (possibly empty) extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    /// Dash separated number, always starting with "1-"
    pub number: String,

    /// Extension including its leading 'x', or empty
    pub extension: String,
}

impl Phone {
    pub fn has_extension(&self) -> bool {
        !self.extension.is_empty()
    }

    /// Number and extension as displayed to users ("1-770-736-8031 x56442")
    pub fn display(&self) -> String {
        if self.has_extension() {
            format!("{} {}", self.number, self.extension)
        } else {
            self.number.clone()
        }
    }
}

/// Normalize a raw phone string
///
/// - Split off the extension at the first 'x' (later x's stay in the extension)
/// - Parentheses become spaces, then the number is trimmed
/// - Every whitespace run and every '.' becomes a single '-'
/// - "1-" is prepended when missing
///
/// No validation happens here: an empty input yields "1-".
pub fn normalize_phone(raw: &str) -> Phone {
    let (number, extension) = match raw.split_once('x') {
        Some((number, rest)) => (number, format!("x{}", rest)),
        None => (raw, String::new()),
    };

    let unbracketed = number.replace(['(', ')'], " ");
    let dashed = dash_separators(unbracketed.trim());

    let number = if dashed.starts_with(US_PREFIX) {
        dashed
    } else {
        format!("{}{}", US_PREFIX, dashed)
    };

    Phone { number, extension }
}

fn dash_separators(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }

        in_space = false;
        if c == '.' {
            out.push('-');
        } else {
            out.push(c);
        }
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_split_off() {
        let phone = normalize_phone("1-770-736-8031 x56442");
        assert_eq!(phone.number, "1-770-736-8031");
        assert_eq!(phone.extension, "x56442");
        assert!(phone.has_extension());
    }

    #[test]
    fn test_country_code_added_when_missing() {
        let phone = normalize_phone("010-692-6593 x09125");
        assert_eq!(phone.number, "1-010-692-6593");
        assert_eq!(phone.extension, "x09125");
    }

    #[test]
    fn test_already_prefixed_number_without_extension() {
        let phone = normalize_phone("1-463-123-4447");
        assert_eq!(phone.number, "1-463-123-4447");
        assert_eq!(phone.extension, "");
        assert!(!phone.has_extension());
    }

    #[test]
    fn test_parentheses_and_dots() {
        assert_eq!(normalize_phone("(254)954-1289").number, "1-254-954-1289");
        assert_eq!(normalize_phone("210.067.6132").number, "1-210-067-6132");

        let phone = normalize_phone("(775)976-6794 x41206");
        assert_eq!(phone.number, "1-775-976-6794");
        assert_eq!(phone.extension, "x41206");
    }

    #[test]
    fn test_space_runs_collapse_to_one_dash() {
        assert_eq!(normalize_phone("555   123 4567").number, "1-555-123-4567");
        assert_eq!(normalize_phone("(555) 123 4567").number, "1-555-123-4567");
    }

    #[test]
    fn test_only_first_x_separates() {
        let phone = normalize_phone("555-1234 x12x34");
        assert_eq!(phone.number, "1-555-1234");
        assert_eq!(phone.extension, "x12x34");
    }

    #[test]
    fn test_empty_input_still_prefixed() {
        let phone = normalize_phone("");
        assert_eq!(phone.number, "1-");
        assert_eq!(phone.extension, "");

        assert_eq!(normalize_phone("  ( )  ").number, "1-");
    }

    #[test]
    fn test_display_joins_extension() {
        assert_eq!(
            normalize_phone("586.493.6943 x140").display(),
            "1-586-493-6943 x140"
        );
        assert_eq!(normalize_phone("024-648-3804").display(), "1-024-648-3804");
    }
}
