//! TOML form definition parser.
//!
//! Loads form drafts from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::contribution_rule;
use crate::model::{FieldDefinition, FieldOption, FieldType, FormDraft, ScoreRange};
use crate::validate::overlap_warnings;

/// Intermediate TOML structure for parsing form definition files.
#[derive(Debug, Deserialize)]
struct TomlFormFile {
    form: TomlFormHeader,
    #[serde(default)]
    fields: Vec<TomlField>,
}

#[derive(Debug, Deserialize)]
struct TomlFormHeader {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    collaborators: Vec<String>,
    #[serde(default)]
    allowed_users: Vec<String>,
    #[serde(default)]
    show_total_score: bool,
    #[serde(default)]
    score_ranges: Vec<TomlScoreRange>,
    #[serde(default = "default_true")]
    allow_view_own_responses: bool,
    #[serde(default)]
    allow_edit_own_responses: bool,
}

#[derive(Debug, Deserialize)]
struct TomlScoreRange {
    min: i64,
    max: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TomlField {
    id: String,
    #[serde(rename = "type")]
    field_type: String,
    label: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    has_numeric_values: bool,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    #[serde(default)]
    id: Option<String>,
    label: String,
    value: String,
    #[serde(default)]
    numeric_value: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Parse a single TOML file into a `FormDraft`.
pub fn parse_form_file(path: &Path) -> Result<FormDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form definition: {}", path.display()))?;

    parse_form_str(&content, path)
}

/// Parse a TOML string into a `FormDraft` (useful for testing).
pub fn parse_form_str(content: &str, source_path: &Path) -> Result<FormDraft> {
    let parsed: TomlFormFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let fields = parsed
        .fields
        .into_iter()
        .map(|f| {
            let field_type: FieldType = f
                .field_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("field '{}': {}", f.id, e))?;

            let options = f
                .options
                .into_iter()
                .enumerate()
                .map(|(i, o)| FieldOption {
                    id: o.id.unwrap_or_else(|| format!("{}-opt-{}", f.id, i)),
                    label: o.label,
                    value: o.value,
                    numeric_value: o.numeric_value,
                })
                .collect();

            Ok(FieldDefinition {
                id: f.id,
                field_type,
                label: f.label,
                required: f.required,
                options,
                has_numeric_values: f.has_numeric_values,
                score_ranges: vec![],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let score_ranges = parsed
        .form
        .score_ranges
        .into_iter()
        .map(|r| ScoreRange {
            min: r.min,
            max: r.max,
            message: r.message,
        })
        .collect();

    Ok(FormDraft {
        title: parsed.form.title,
        description: parsed.form.description,
        fields,
        is_private: parsed.form.is_private,
        collaborators: parsed.form.collaborators,
        allowed_users: parsed.form.allowed_users,
        show_total_score: parsed.form.show_total_score,
        score_ranges,
        allow_view_own_responses: parsed.form.allow_view_own_responses,
        allow_edit_own_responses: parsed.form.allow_edit_own_responses,
    })
}

/// Recursively load all `.toml` form definitions from a directory.
pub fn load_form_directory(dir: &Path) -> Result<Vec<FormDraft>> {
    let mut drafts = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            drafts.extend(load_form_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_form_file(&path) {
                Ok(draft) => drafts.push(draft),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(drafts)
}

/// A warning from form definition validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The field ID (if applicable).
    pub field_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a form draft for common issues.
pub fn validate_form(draft: &FormDraft) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if draft.title.trim().is_empty() {
        warnings.push(ValidationWarning {
            field_id: None,
            message: "form title is empty".into(),
        });
    }

    // Check for duplicate field IDs
    let mut seen_ids = std::collections::HashSet::new();
    for field in &draft.fields {
        if !seen_ids.insert(&field.id) {
            warnings.push(ValidationWarning {
                field_id: Some(field.id.clone()),
                message: format!("duplicate field ID: {}", field.id),
            });
        }
    }

    for field in &draft.fields {
        let rule = contribution_rule(field.field_type);

        // Choice-like fields need options to be answerable
        let choice_like = matches!(
            field.field_type,
            FieldType::Radio
                | FieldType::Select
                | FieldType::ImageSelect
                | FieldType::Checkbox
                | FieldType::YesNo
        );
        if choice_like && field.options.is_empty() {
            warnings.push(ValidationWarning {
                field_id: Some(field.id.clone()),
                message: format!("{} field has no options", field.field_type),
            });
        }

        if field.field_type == FieldType::YesNo && field.options.len() != 2 {
            warnings.push(ValidationWarning {
                field_id: Some(field.id.clone()),
                message: format!(
                    "yes-no field has {} options, expected exactly 2 (affirmative, negative)",
                    field.options.len()
                ),
            });
        }

        if field.has_numeric_values && rule.is_none() {
            warnings.push(ValidationWarning {
                field_id: Some(field.id.clone()),
                message: format!(
                    "has_numeric_values is set but {} fields never contribute to the score",
                    field.field_type
                ),
            });
        }
    }

    // Scoring configuration consistency
    if !draft.score_ranges.is_empty() && !draft.show_total_score {
        warnings.push(ValidationWarning {
            field_id: None,
            message: "score ranges are configured but show_total_score is false".into(),
        });
    }

    for range in &draft.score_ranges {
        if range.min > range.max {
            warnings.push(ValidationWarning {
                field_id: None,
                message: format!(
                    "score range [{}, {}] is inverted and will be dropped on save",
                    range.min, range.max
                ),
            });
        }
    }

    for overlap in overlap_warnings(&draft.score_ranges) {
        warnings.push(ValidationWarning {
            field_id: None,
            message: overlap,
        });
    }

    warnings
}
