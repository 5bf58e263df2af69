//! Core data model types for formscore.
//!
//! These are the fundamental types the entire formscore system uses to
//! represent forms, fields, score ranges, and submitted responses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full field-type taxonomy an operator can place on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Number,
    Date,
    Time,
    Radio,
    Select,
    ImageSelect,
    Checkbox,
    YesNo,
    StarRating,
    OpinionScale,
    Matrix,
    Ranking,
    FileUpload,
    ImageUpload,
    Drawing,
    Signature,
    Terms,
    Banner,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::ShortText => "short-text",
            FieldType::LongText => "long-text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::ImageSelect => "image-select",
            FieldType::Checkbox => "checkbox",
            FieldType::YesNo => "yes-no",
            FieldType::StarRating => "star-rating",
            FieldType::OpinionScale => "opinion-scale",
            FieldType::Matrix => "matrix",
            FieldType::Ranking => "ranking",
            FieldType::FileUpload => "file-upload",
            FieldType::ImageUpload => "image-upload",
            FieldType::Drawing => "drawing",
            FieldType::Signature => "signature",
            FieldType::Terms => "terms",
            FieldType::Banner => "banner",
        };
        write!(f, "{name}")
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short-text" | "text" => Ok(FieldType::ShortText),
            "long-text" | "paragraph" => Ok(FieldType::LongText),
            "email" => Ok(FieldType::Email),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            "radio" => Ok(FieldType::Radio),
            "select" | "dropdown" => Ok(FieldType::Select),
            "image-select" => Ok(FieldType::ImageSelect),
            "checkbox" => Ok(FieldType::Checkbox),
            "yes-no" | "yesno" => Ok(FieldType::YesNo),
            "star-rating" => Ok(FieldType::StarRating),
            "opinion-scale" => Ok(FieldType::OpinionScale),
            "matrix" => Ok(FieldType::Matrix),
            "ranking" => Ok(FieldType::Ranking),
            "file-upload" => Ok(FieldType::FileUpload),
            "image-upload" => Ok(FieldType::ImageUpload),
            "drawing" => Ok(FieldType::Drawing),
            "signature" => Ok(FieldType::Signature),
            "terms" => Ok(FieldType::Terms),
            "banner" | "welcome" => Ok(FieldType::Banner),
            other => Err(format!("unknown field type: {other}")),
        }
    }
}

/// A selectable option on a choice-like field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOption {
    /// Unique identifier within the field.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// The value stored when this option is selected.
    pub value: String,
    /// Points this option contributes when the field is scored.
    #[serde(default)]
    pub numeric_value: Option<i64>,
}

/// A closed numeric interval mapped to a feedback message.
///
/// Invariant: `min <= max`. Ranges violating it are dropped at validation
/// time, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
    pub message: String,
}

/// A single field on a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique identifier within the form.
    pub id: String,
    /// What kind of input this field renders as.
    pub field_type: FieldType,
    /// Label shown to respondents.
    pub label: String,
    /// Whether a response must answer this field.
    #[serde(default)]
    pub required: bool,
    /// Options for choice-like types; empty otherwise.
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Operator switch gating whether this field contributes to the total.
    #[serde(default)]
    pub has_numeric_values: bool,
    /// Legacy per-field copy of the form-level ranges. Denormalized:
    /// refreshed from `FormDefinition::score_ranges` on every update and
    /// never read at submission time.
    #[serde(default)]
    pub score_ranges: Vec<ScoreRange>,
}

/// A complete form definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Unique identifier.
    pub id: String,
    /// Form title.
    pub title: String,
    /// Description shown above the fields.
    #[serde(default)]
    pub description: String,
    /// Ordered fields.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Whether access is restricted to the allow-list / token holders.
    #[serde(default)]
    pub is_private: bool,
    /// Email of the principal that created the form.
    pub owner_id: String,
    /// Normalized (lowercased, trimmed) emails that may edit but do not own.
    #[serde(default)]
    pub collaborators: Vec<String>,
    /// Emails permitted to respond to a private form.
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Opaque per-form secret granting response access without an
    /// allow-list match.
    #[serde(default)]
    pub access_token: String,
    /// Whether scoring is active for this form.
    #[serde(default)]
    pub show_total_score: bool,
    /// The authoritative score ranges used at submission time.
    #[serde(default)]
    pub score_ranges: Vec<ScoreRange>,
    /// Whether respondents may view their own submissions.
    #[serde(default = "default_true")]
    pub allow_view_own_responses: bool,
    /// Whether respondents may resubmit (a new record, never a mutation).
    #[serde(default)]
    pub allow_edit_own_responses: bool,
    /// When the form was created.
    pub created_at: DateTime<Utc>,
    /// When the form was last updated.
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Operator input for creating a form. The engine assigns the id, the
/// access token, the owner, and the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub show_total_score: bool,
    #[serde(default)]
    pub score_ranges: Vec<ScoreRange>,
    #[serde(default = "default_true")]
    pub allow_view_own_responses: bool,
    #[serde(default)]
    pub allow_edit_own_responses: bool,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            fields: Vec::new(),
            is_private: false,
            collaborators: Vec::new(),
            allowed_users: Vec::new(),
            show_total_score: false,
            score_ranges: Vec::new(),
            allow_view_own_responses: true,
            allow_edit_own_responses: false,
        }
    }
}

/// Partial changes merged into a cached form by the engine's update
/// operation. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldDefinition>>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub collaborators: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_users: Option<Vec<String>>,
    #[serde(default)]
    pub show_total_score: Option<bool>,
    #[serde(default)]
    pub score_ranges: Option<Vec<ScoreRange>>,
    #[serde(default)]
    pub allow_view_own_responses: Option<bool>,
    #[serde(default)]
    pub allow_edit_own_responses: Option<bool>,
}

/// One answer to one field. The variant is determined by the field type,
/// so scoring branches are exhaustive-checked at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum AnswerValue {
    /// Free text, dates, times, emails.
    Text(String),
    /// A single selected option value.
    Selection(String),
    /// Selected option values of a multi-choice field.
    Selections(Vec<String>),
    /// A yes/no answer already normalized to a boolean.
    Toggle(bool),
    /// Star rating / opinion scale value.
    Scale(i64),
    /// A structured postal address.
    Address(StructuredAddress),
    /// Reference to an uploaded file or image.
    FileRef(String),
    /// Matrix answers, row id to column value.
    Grid(HashMap<String, String>),
    /// Ranking answers, option values in chosen order.
    Order(Vec<String>),
}

/// A structured postal address answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// Mapping from field id to the answer given for that field.
pub type ResponseSet = HashMap<String, AnswerValue>;

/// A submitted response. Immutable once created; a resubmission under
/// `allow_edit_own_responses` creates a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResponse {
    /// Unique identifier.
    pub id: String,
    /// The form this response answers.
    pub form_id: String,
    /// Respondent email, if the caller was authenticated.
    #[serde(default)]
    pub respondent: Option<String>,
    /// The answers keyed by field id.
    pub answers: ResponseSet,
    /// Total score, present when the form had scoring active.
    #[serde(default)]
    pub total_score: Option<i64>,
    /// Feedback message resolved from the score, if any range matched.
    #[serde(default)]
    pub feedback: Option<String>,
    /// When the response was submitted.
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_display_and_parse() {
        assert_eq!(FieldType::Checkbox.to_string(), "checkbox");
        assert_eq!(FieldType::YesNo.to_string(), "yes-no");
        assert_eq!("checkbox".parse::<FieldType>().unwrap(), FieldType::Checkbox);
        assert_eq!("YES-NO".parse::<FieldType>().unwrap(), FieldType::YesNo);
        assert_eq!("paragraph".parse::<FieldType>().unwrap(), FieldType::LongText);
        assert_eq!("dropdown".parse::<FieldType>().unwrap(), FieldType::Select);
        assert!("hologram".parse::<FieldType>().is_err());
    }

    #[test]
    fn form_definition_serde_roundtrip() {
        let form = FormDefinition {
            id: "form-1".into(),
            title: "Customer survey".into(),
            description: String::new(),
            fields: vec![FieldDefinition {
                id: "q1".into(),
                field_type: FieldType::Checkbox,
                label: "Pick some".into(),
                required: true,
                options: vec![FieldOption {
                    id: "o1".into(),
                    label: "A".into(),
                    value: "a".into(),
                    numeric_value: Some(3),
                }],
                has_numeric_values: true,
                score_ranges: vec![],
            }],
            is_private: true,
            owner_id: "owner@example.com".into(),
            collaborators: vec!["helper@example.com".into()],
            allowed_users: vec![],
            access_token: "tok".into(),
            show_total_score: true,
            score_ranges: vec![ScoreRange {
                min: 0,
                max: 10,
                message: "low".into(),
            }],
            allow_view_own_responses: true,
            allow_edit_own_responses: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&form).unwrap();
        let back: FormDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "form-1");
        assert_eq!(back.fields[0].field_type, FieldType::Checkbox);
        assert_eq!(back.score_ranges[0].message, "low");
    }

    #[test]
    fn answer_value_tagged_serde() {
        let answer = AnswerValue::Selections(vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&answer).unwrap();
        assert!(json.contains("selections"));
        let back: AnswerValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answer);
    }

    #[test]
    fn form_defaults_apply() {
        let json = r#"{
            "id": "f",
            "title": "T",
            "owner_id": "o@x.com",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;
        let form: FormDefinition = serde_json::from_str(json).unwrap();
        assert!(!form.is_private);
        assert!(form.allow_view_own_responses);
        assert!(!form.allow_edit_own_responses);
        assert!(form.fields.is_empty());
        assert!(form.access_token.is_empty());
    }
}
