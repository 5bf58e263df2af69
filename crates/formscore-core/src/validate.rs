//! Data-quality validation with silent degradation.
//!
//! Validators return the sanitized value together with a count of what
//! was dropped, so callers can log the loss without the core raising.

use crate::model::ScoreRange;

/// A sanitized value plus how many raw entries were dropped to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    pub value: T,
    pub dropped: usize,
}

impl<T> Validated<T> {
    pub fn clean(value: T) -> Self {
        Self { value, dropped: 0 }
    }
}

/// Drop score ranges that violate `min <= max`.
pub fn validate_score_ranges(ranges: Vec<ScoreRange>) -> Validated<Vec<ScoreRange>> {
    let before = ranges.len();
    let value: Vec<ScoreRange> = ranges.into_iter().filter(|r| r.min <= r.max).collect();
    Validated {
        dropped: before - value.len(),
        value,
    }
}

/// Warn-level findings for overlapping ranges.
///
/// Overlap is legal (first match wins at resolution time) but almost
/// always a configuration mistake, so it is surfaced at save time as a
/// warning, never an error.
pub fn overlap_warnings(ranges: &[ScoreRange]) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, a) in ranges.iter().enumerate() {
        for b in ranges.iter().skip(i + 1) {
            if a.min <= b.max && b.min <= a.max {
                warnings.push(format!(
                    "ranges [{}, {}] \"{}\" and [{}, {}] \"{}\" overlap; the earlier one wins",
                    a.min, a.max, a.message, b.min, b.max, b.message
                ));
            }
        }
    }
    warnings
}

/// Normalize an email for storage and comparison: trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Normalize a collaborator or allow-list entry set: trim, lowercase,
/// drop blanks and entries without an '@', de-duplicate preserving first
/// occurrence.
pub fn validate_collaborators(raw: Vec<String>) -> Validated<Vec<String>> {
    let before = raw.len();
    let mut seen = std::collections::HashSet::new();
    let mut value = Vec::new();

    for entry in raw {
        let normalized = normalize_email(&entry);
        if normalized.is_empty() || !normalized.contains('@') {
            continue;
        }
        if seen.insert(normalized.clone()) {
            value.push(normalized);
        }
    }

    Validated {
        dropped: before - value.len(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: i64, max: i64, message: &str) -> ScoreRange {
        ScoreRange {
            min,
            max,
            message: message.into(),
        }
    }

    #[test]
    fn inverted_ranges_are_dropped() {
        let validated = validate_score_ranges(vec![
            range(0, 10, "ok"),
            range(10, 5, "inverted"),
            range(5, 5, "point"),
        ]);
        assert_eq!(validated.dropped, 1);
        assert_eq!(validated.value.len(), 2);
        assert!(validated.value.iter().all(|r| r.min <= r.max));
    }

    #[test]
    fn valid_ranges_pass_through_unchanged() {
        let input = vec![range(0, 10, "a"), range(11, 20, "b")];
        let validated = validate_score_ranges(input.clone());
        assert_eq!(validated.dropped, 0);
        assert_eq!(validated.value, input);
    }

    #[test]
    fn overlap_is_warned_not_dropped() {
        let ranges = vec![range(0, 10, "low"), range(5, 20, "high")];
        let warnings = overlap_warnings(&ranges);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("overlap"));
    }

    #[test]
    fn disjoint_ranges_produce_no_warnings() {
        let ranges = vec![range(0, 10, "low"), range(11, 20, "high")];
        assert!(overlap_warnings(&ranges).is_empty());
    }

    #[test]
    fn touching_bounds_count_as_overlap() {
        let ranges = vec![range(0, 10, "a"), range(10, 20, "b")];
        assert_eq!(overlap_warnings(&ranges).len(), 1);
    }

    #[test]
    fn collaborators_are_normalized_and_deduped() {
        let validated = validate_collaborators(vec![
            " Helper@Example.com ".into(),
            "helper@example.com".into(),
            "".into(),
            "   ".into(),
            "not-an-email".into(),
            "second@example.com".into(),
        ]);
        assert_eq!(validated.value, vec![
            "helper@example.com".to_string(),
            "second@example.com".to_string(),
        ]);
        assert_eq!(validated.dropped, 4);
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
