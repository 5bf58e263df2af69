//! The `formscore score` command: offline scoring of an answers file
//! against a form definition, no store involved.

use std::path::PathBuf;

use anyhow::Result;

use formscore_core::feedback::resolve_feedback;
use formscore_core::parser;
use formscore_core::scoring::compute_total_score;
use formscore_core::validate::validate_score_ranges;

use super::read_answers;

pub fn execute(form_path: PathBuf, answers_path: PathBuf) -> Result<()> {
    let draft = parser::parse_form_file(&form_path)?;
    let answers = read_answers(&answers_path)?;

    let score = compute_total_score(&answers, &draft.fields);
    println!("Total score: {score}");

    let ranges = validate_score_ranges(draft.score_ranges);
    if ranges.dropped > 0 {
        eprintln!("Warning: {} invalid score range(s) ignored.", ranges.dropped);
    }
    match resolve_feedback(score, &ranges.value) {
        Some(message) => println!("Feedback: {message}"),
        None => println!("Feedback: (no range matched)"),
    }

    Ok(())
}
