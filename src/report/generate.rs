//! Generation orchestrator.
//!
//! Sequences "persist every component" -> "generate" -> "refetch the active
//! report". Individual component save failures do not stop the batch; the
//! generate call only carries the components that saved, and the whole
//! operation aborts when none did. The generated state is never synthesized
//! locally; it comes from the refetched report.

use super::lifecycle;
use super::store::ComponentStore;
use crate::api::ReportBackend;
use crate::api::models::{ActiveReport, AnswerValue, QuestionKind};
use std::collections::BTreeMap;
use std::fmt;

/// Result of a completed generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Components whose answers were persisted.
    pub saved: Vec<String>,
    /// Components whose save failed, with the failure message.
    pub save_failures: Vec<(String, String)>,
    /// The refetched active report, with the derived PDF file name merged in.
    pub report: ActiveReport,
}

#[derive(Debug, Clone)]
pub enum GenerateError {
    /// Components whose required file question has no attachments. Checked
    /// up front across all components; nothing is sent while this is
    /// non-empty.
    MissingAttachments(Vec<String>),
    /// Every component save failed, so there was nothing to generate from.
    NothingSaved(Vec<(String, String)>),
    /// The generate call itself failed.
    Generate(String),
    /// Generation succeeded but the report could not be refetched.
    Refresh(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::MissingAttachments(components) => write!(
                f,
                "required files are missing for: {}",
                components.join(", ")
            ),
            GenerateError::NothingSaved(failures) => {
                let names: Vec<&str> = failures.iter().map(|(c, _)| c.as_str()).collect();
                write!(f, "no component data could be saved ({})", names.join(", "))
            }
            GenerateError::Generate(msg) => write!(f, "report generation failed: {msg}"),
            GenerateError::Refresh(msg) => {
                write!(f, "report was generated but could not be refreshed: {msg}")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

/// Components whose required file questions lack attachments, in catalog
/// order. All offenders are collected so the user sees the full list at
/// once.
pub fn missing_required_attachments(store: &ComponentStore) -> Vec<String> {
    let mut missing = Vec::new();
    for component in store.components() {
        let Some(entry) = store.entry(component) else {
            continue;
        };
        let unsatisfied = entry
            .questions
            .iter()
            .filter(|q| q.kind == QuestionKind::File && q.required)
            .any(|q| {
                entry
                    .answers
                    .get(&q.id)
                    .map(AnswerValue::is_empty)
                    .unwrap_or(true)
            });
        if unsatisfied {
            missing.push(component.clone());
        }
    }
    missing
}

/// Run the full generation sequence against the backend.
pub async fn run(
    backend: &dyn ReportBackend,
    project: &str,
    store: &ComponentStore,
) -> Result<GenerationOutcome, GenerateError> {
    let missing = missing_required_attachments(store);
    if !missing.is_empty() {
        return Err(GenerateError::MissingAttachments(missing));
    }

    let mut saved = Vec::new();
    let mut save_failures = Vec::new();
    for component in store.components() {
        let Some(entry) = store.entry(component) else {
            continue;
        };
        match backend
            .save_component_data(project, component, &entry.answers)
            .await
        {
            Ok(()) => saved.push(component.clone()),
            Err(err) => {
                log::error!("saving {component} failed: {err}");
                save_failures.push((component.clone(), err.user_message().to_string()));
            }
        }
    }

    if saved.is_empty() {
        return Err(GenerateError::NothingSaved(save_failures));
    }

    let mut components_data: BTreeMap<String, BTreeMap<String, AnswerValue>> = BTreeMap::new();
    for component in &saved {
        if let Some(entry) = store.entry(component) {
            components_data.insert(component.clone(), entry.answers.clone());
        }
    }

    let generated = backend
        .generate_report(project, &components_data)
        .await
        .map_err(|err| GenerateError::Generate(err.user_message().to_string()))?;

    let mut report = backend
        .active_report(project)
        .await
        .map_err(|err| GenerateError::Refresh(err.user_message().to_string()))?
        .ok_or_else(|| GenerateError::Refresh("active report disappeared".to_string()))?;

    if let Some(name) = generated
        .pdf_path
        .as_deref()
        .and_then(lifecycle::pdf_file_name_from_path)
    {
        report.pdf_file_name = Some(name);
    }

    Ok(GenerationOutcome {
        saved,
        save_failures,
        report,
    })
}
