//! Wire types shared with the report builder backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Input kind of a catalog question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Textarea,
    Select,
    Checkbox,
    File,
}

/// One choice of a select question.
///
/// The catalog serves options either as `{value, label}` objects or as bare
/// strings; bare strings are used for both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl<'de> Deserialize<'de> for SelectOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Full { value: String, label: String },
            Bare(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Full { value, label } => SelectOption { value, label },
            Repr::Bare(s) => SelectOption {
                value: s.clone(),
                label: s,
            },
        })
    }
}

/// A catalog question. Immutable once fetched; owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Expected attachment kind for file questions. When absent the kind is
    /// inferred from the selected file's extension.
    #[serde(default)]
    pub accept: Option<FileKind>,
}

/// Attachment category, which decides MIME and size constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Image => "image/*",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "image",
        }
    }
}

/// A stored attachment as reported by the backend.
///
/// Identity for removal is the (filename, path) pair. Descriptors are only
/// ever constructed from server payloads, never fabricated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub filename: String,
    pub path: String,
    #[serde(alias = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl FileDescriptor {
    /// Both identity fields are present, so the server can address the file.
    pub fn has_identity(&self) -> bool {
        !self.filename.is_empty() && !self.path.is_empty()
    }
}

/// Answer to a single question: a scalar for text-like inputs, an ordered
/// attachment list for file questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Files(Vec<FileDescriptor>),
    Text(String),
}

impl AnswerValue {
    pub fn default_for(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::File => AnswerValue::Files(Vec::new()),
            _ => AnswerValue::Text(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Files(files) => files.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::Files(_) => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileDescriptor]> {
        match self {
            AnswerValue::Files(files) => Some(files),
            AnswerValue::Text(_) => None,
        }
    }
}

/// Per-component answer map inside an active report payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentAnswers {
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerValue>,
}

/// The single in-progress report of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveReport {
    #[serde(alias = "id")]
    pub report_id: String,
    pub project_name: String,
    #[serde(default)]
    pub report_generated: bool,
    #[serde(default)]
    pub is_finalized: bool,
    #[serde(default)]
    pub pdf_file_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentAnswers>,
}

/// A finalized report entry in a project detail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedReport {
    #[serde(alias = "id")]
    pub report_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Project detail: the active report (if any) plus finalized history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(default)]
    pub active_report: Option<ActiveReport>,
    #[serde(default)]
    pub reports: Vec<FinalizedReport>,
}

/// Envelope of `GET /components`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentCatalog {
    #[serde(default)]
    pub components: Vec<String>,
}

/// Envelope of `GET /component/{name}/questions`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionList {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Response of upload and remove operations: the complete remaining file
/// list for the slot. The server list is authoritative and replaces local
/// state wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

fn default_true() -> bool {
    true
}

/// Response of the generate operation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub pdf_path: Option<String>,
}

/// Response of the reset operation. `active_report` may be absent, in which
/// case the caller falls back to a locally-projected reset.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub active_report: Option<ActiveReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_value_distinguishes_text_and_files() {
        let text: AnswerValue = serde_json::from_value(json!("42.5")).unwrap();
        assert_eq!(text.as_text(), Some("42.5"));

        let files: AnswerValue = serde_json::from_value(json!([
            {"filename": "report.pdf", "path": "active_report/demo/pdfs/x.pdf", "type": "pdf"}
        ]))
        .unwrap();
        let files = files.as_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].kind, FileKind::Pdf);
        assert!(files[0].has_identity());
    }

    #[test]
    fn select_options_accept_both_shapes() {
        let q: Question = serde_json::from_value(json!({
            "id": "media_coverage",
            "text": "Media coverage level:",
            "type": "select",
            "options": [{"value": "low", "label": "Low"}, "high"],
        }))
        .unwrap();
        assert_eq!(q.options.len(), 2);
        assert_eq!(q.options[0].value, "low");
        assert_eq!(q.options[1].label, "high");
        assert!(!q.required);
    }

    #[test]
    fn active_report_defaults_missing_fields() {
        let report: ActiveReport = serde_json::from_value(json!({
            "id": "rep-1",
            "project_name": "Demo",
        }))
        .unwrap();
        assert_eq!(report.report_id, "rep-1");
        assert!(!report.report_generated);
        assert!(!report.is_finalized);
        assert!(report.components.is_empty());
    }
}
