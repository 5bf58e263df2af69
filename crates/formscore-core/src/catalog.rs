//! Field catalog: which field types can carry a numeric contribution and
//! how that contribution is extracted from a raw answer.

use crate::model::FieldType;

/// How a field type turns an answer into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionRule {
    /// Sum the `numeric_value` of every selected option.
    MultiSelect,
    /// Affirmative answers take `options[0]`, negative take `options[1]`.
    BinaryChoice,
    /// The `numeric_value` of the single matching option.
    SingleChoice,
    /// The answer itself, parsed as an integer.
    DirectValue,
}

/// Pure lookup from field type to contribution rule.
///
/// Types with no rule (free text, dates, uploads, informational fields)
/// never contribute to the total, regardless of `has_numeric_values`.
pub fn contribution_rule(field_type: FieldType) -> Option<ContributionRule> {
    match field_type {
        FieldType::Checkbox => Some(ContributionRule::MultiSelect),
        FieldType::YesNo => Some(ContributionRule::BinaryChoice),
        FieldType::Radio | FieldType::Select | FieldType::ImageSelect => {
            Some(ContributionRule::SingleChoice)
        }
        FieldType::StarRating | FieldType::OpinionScale => Some(ContributionRule::DirectValue),
        FieldType::ShortText
        | FieldType::LongText
        | FieldType::Email
        | FieldType::Number
        | FieldType::Date
        | FieldType::Time
        | FieldType::Matrix
        | FieldType::Ranking
        | FieldType::FileUpload
        | FieldType::ImageUpload
        | FieldType::Drawing
        | FieldType::Signature
        | FieldType::Terms
        | FieldType::Banner => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_types_have_rules() {
        assert_eq!(
            contribution_rule(FieldType::Checkbox),
            Some(ContributionRule::MultiSelect)
        );
        assert_eq!(
            contribution_rule(FieldType::YesNo),
            Some(ContributionRule::BinaryChoice)
        );
        assert_eq!(
            contribution_rule(FieldType::Radio),
            Some(ContributionRule::SingleChoice)
        );
        assert_eq!(
            contribution_rule(FieldType::Select),
            Some(ContributionRule::SingleChoice)
        );
        assert_eq!(
            contribution_rule(FieldType::ImageSelect),
            Some(ContributionRule::SingleChoice)
        );
        assert_eq!(
            contribution_rule(FieldType::StarRating),
            Some(ContributionRule::DirectValue)
        );
        assert_eq!(
            contribution_rule(FieldType::OpinionScale),
            Some(ContributionRule::DirectValue)
        );
    }

    #[test]
    fn non_contributing_types_have_none() {
        for ft in [
            FieldType::ShortText,
            FieldType::LongText,
            FieldType::Email,
            FieldType::Number,
            FieldType::Date,
            FieldType::Time,
            FieldType::Matrix,
            FieldType::Ranking,
            FieldType::FileUpload,
            FieldType::ImageUpload,
            FieldType::Drawing,
            FieldType::Signature,
            FieldType::Terms,
            FieldType::Banner,
        ] {
            assert_eq!(contribution_rule(ft), None, "{ft} should not contribute");
        }
    }
}
