//! Score aggregation: combine a response set and a form's fields into a
//! single integer total.
//!
//! The aggregator never fails. Missing answers, unknown option values,
//! and options without a numeric value all degrade to a contribution of
//! zero rather than an error.

use crate::catalog::{contribution_rule, ContributionRule};
use crate::model::{AnswerValue, FieldDefinition, FieldOption, ResponseSet};

/// Compute the total score for a response set against a form's fields.
///
/// Only fields with `has_numeric_values` set and a contribution rule for
/// their type are counted; everything else is skipped.
pub fn compute_total_score(responses: &ResponseSet, fields: &[FieldDefinition]) -> i64 {
    let mut total = 0i64;

    for field in fields {
        if !field.has_numeric_values {
            continue;
        }
        let Some(rule) = contribution_rule(field.field_type) else {
            continue;
        };
        let Some(answer) = responses.get(&field.id) else {
            continue;
        };

        total += match rule {
            ContributionRule::MultiSelect => multi_select_contribution(answer, &field.options),
            ContributionRule::BinaryChoice => binary_choice_contribution(answer, &field.options),
            ContributionRule::SingleChoice => single_choice_contribution(answer, &field.options),
            ContributionRule::DirectValue => direct_value_contribution(answer),
        };
    }

    total
}

fn multi_select_contribution(answer: &AnswerValue, options: &[FieldOption]) -> i64 {
    let selected: &[String] = match answer {
        AnswerValue::Selections(values) => values,
        // A lone selection on a multi-choice field still counts.
        AnswerValue::Selection(value) => std::slice::from_ref(value),
        _ => return 0,
    };

    selected
        .iter()
        .filter_map(|value| option_points(options, value))
        .sum()
}

fn binary_choice_contribution(answer: &AnswerValue, options: &[FieldOption]) -> i64 {
    let Some(affirmative) = normalize_affirmative(answer) else {
        return 0;
    };
    let index = if affirmative { 0 } else { 1 };
    options
        .get(index)
        .and_then(|o| o.numeric_value)
        .unwrap_or(0)
}

fn single_choice_contribution(answer: &AnswerValue, options: &[FieldOption]) -> i64 {
    let value = match answer {
        AnswerValue::Selection(value) | AnswerValue::Text(value) => value,
        _ => return 0,
    };
    option_points(options, value).unwrap_or(0)
}

fn direct_value_contribution(answer: &AnswerValue) -> i64 {
    match answer {
        AnswerValue::Scale(n) => *n,
        AnswerValue::Text(s) | AnswerValue::Selection(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn option_points(options: &[FieldOption], value: &str) -> Option<i64> {
    options
        .iter()
        .find(|o| o.value == value)
        .and_then(|o| o.numeric_value)
}

/// Normalize a binary-choice answer to a boolean.
///
/// Accepts a boolean toggle, or the strings "true", "yes", and the
/// localized affirmative "ja" (case-insensitive). Anything else yields
/// `None` and contributes nothing.
pub fn normalize_affirmative(answer: &AnswerValue) -> Option<bool> {
    match answer {
        AnswerValue::Toggle(b) => Some(*b),
        AnswerValue::Text(s) | AnswerValue::Selection(s) => {
            let token = s.trim().to_ascii_lowercase();
            match token.as_str() {
                "true" | "yes" | "ja" => Some(true),
                "false" | "no" | "nee" => Some(false),
                _ => None,
            }
        }
        _ => None,
    }
}
