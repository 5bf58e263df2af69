//! Range resolution: map a total score to the configured feedback message.

use crate::model::ScoreRange;

/// Return the message of the first range, in configuration order, whose
/// closed interval contains `score`.
///
/// Returns `None` when `ranges` is empty or nothing matches. Ranges are
/// validated before they get here; this function does no validation of
/// its own.
pub fn resolve_feedback(score: i64, ranges: &[ScoreRange]) -> Option<&str> {
    ranges
        .iter()
        .find(|r| r.min <= score && score <= r.max)
        .map(|r| r.message.as_str())
}
