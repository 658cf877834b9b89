//! Synchronous per-field validation, run on every edit before anything is
//! persisted.

use crate::api::models::{AnswerValue, Question, QuestionKind};

/// Outcome of validating a single answer against its question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidation {
    pub is_valid: bool,
    pub message: String,
}

impl FieldValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Validate one answer value against its question's constraints.
///
/// An absent or malformed question never blocks the field: unknown fields
/// stay editable rather than wedging the form.
pub fn validate(value: Option<&AnswerValue>, question: Option<&Question>) -> FieldValidation {
    let question = match question {
        Some(q) if !q.id.is_empty() => q,
        _ => return FieldValidation::valid(),
    };

    let empty = value.map(AnswerValue::is_empty).unwrap_or(true);
    if question.required && empty {
        return FieldValidation::invalid("This field is required.");
    }

    if question.kind == QuestionKind::Text && !empty {
        if let (Some(min), Some(text)) = (question.min_length, value.and_then(|v| v.as_text())) {
            if text.chars().count() < min {
                return FieldValidation::invalid(format!("Must be at least {min} characters."));
            }
        }
    }

    FieldValidation::valid()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionKind, required: bool, min_length: Option<usize>) -> Question {
        Question {
            id: "q1".into(),
            text: "Question".into(),
            kind,
            required,
            options: Vec::new(),
            min_length,
            placeholder: None,
            description: None,
            accept: None,
        }
    }

    #[test]
    fn required_empty_is_invalid() {
        let q = question(QuestionKind::Text, true, None);
        let result = validate(Some(&AnswerValue::Text(String::new())), Some(&q));
        assert!(!result.is_valid);

        let result = validate(None, Some(&q));
        assert!(!result.is_valid);
    }

    #[test]
    fn required_check_never_fires_when_optional() {
        let q = question(QuestionKind::Textarea, false, None);
        assert!(validate(Some(&AnswerValue::Text(String::new())), Some(&q)).is_valid);
        assert!(validate(None, Some(&q)).is_valid);
    }

    #[test]
    fn required_file_question_needs_attachments() {
        let q = question(QuestionKind::File, true, None);
        let empty = AnswerValue::Files(Vec::new());
        assert!(!validate(Some(&empty), Some(&q)).is_valid);
    }

    #[test]
    fn min_length_names_the_minimum() {
        let q = question(QuestionKind::Text, false, Some(5));
        let result = validate(Some(&AnswerValue::Text("abc".into())), Some(&q));
        assert!(!result.is_valid);
        assert!(result.message.contains('5'));

        let result = validate(Some(&AnswerValue::Text("abcde".into())), Some(&q));
        assert!(result.is_valid);
    }

    #[test]
    fn absent_question_is_permissive() {
        assert!(validate(Some(&AnswerValue::Text(String::new())), None).is_valid);

        let malformed = question(QuestionKind::Text, true, None);
        let malformed = Question {
            id: String::new(),
            ..malformed
        };
        assert!(validate(None, Some(&malformed)).is_valid);
    }
}
