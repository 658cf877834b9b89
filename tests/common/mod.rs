//! Scripted backend stand-in for integration tests: records every call and
//! replays canned responses.

use async_trait::async_trait;
use investor_report_cli::api::models::{
    ActiveReport, AnswerValue, FileDescriptor, GenerateResponse, ProjectDetail, Question,
};
use investor_report_cli::api::{ApiError, FileUpload, ReportBackend};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SaveComponent(String),
    Generate(Vec<String>),
    ActiveReport,
    Upload { component: String, question: String },
    Remove { component: String, question: String },
}

#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    /// Components whose save fails with this message.
    pub failing_saves: Vec<(String, String)>,
    /// What `generate_report` answers.
    pub pdf_path: Option<String>,
    pub generate_error: Option<String>,
    /// What `active_report` answers after generation.
    pub refreshed_report: Option<ActiveReport>,
    /// What upload/remove answer as the slot's complete file list.
    pub file_list: Vec<FileDescriptor>,
}

impl MockBackend {
    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn unscripted(what: &str) -> ApiError {
    ApiError::other(format!("unscripted call: {what}"))
}

#[async_trait]
impl ReportBackend for MockBackend {
    async fn list_projects(&self) -> Result<Vec<String>, ApiError> {
        Err(unscripted("list_projects"))
    }

    async fn project_detail(&self, _project: &str) -> Result<ProjectDetail, ApiError> {
        Err(unscripted("project_detail"))
    }

    async fn active_report(&self, _project: &str) -> Result<Option<ActiveReport>, ApiError> {
        self.record(Call::ActiveReport);
        Ok(self.refreshed_report.clone())
    }

    async fn create_report(&self, _project: &str) -> Result<ActiveReport, ApiError> {
        Err(unscripted("create_report"))
    }

    async fn list_components(&self) -> Result<Vec<String>, ApiError> {
        Err(unscripted("list_components"))
    }

    async fn component_questions(&self, _component: &str) -> Result<Vec<Question>, ApiError> {
        Err(unscripted("component_questions"))
    }

    async fn save_component_data(
        &self,
        _project: &str,
        component: &str,
        _answers: &BTreeMap<String, AnswerValue>,
    ) -> Result<(), ApiError> {
        self.record(Call::SaveComponent(component.to_string()));
        if let Some((_, message)) = self.failing_saves.iter().find(|(c, _)| c == component) {
            return Err(ApiError::other(message.clone()));
        }
        Ok(())
    }

    async fn upload_component_file(
        &self,
        _project: &str,
        component: &str,
        question_id: &str,
        _upload: FileUpload,
    ) -> Result<Vec<FileDescriptor>, ApiError> {
        self.record(Call::Upload {
            component: component.to_string(),
            question: question_id.to_string(),
        });
        Ok(self.file_list.clone())
    }

    async fn remove_component_file(
        &self,
        _project: &str,
        component: &str,
        question_id: &str,
        _filename: &str,
        _path: &str,
    ) -> Result<Vec<FileDescriptor>, ApiError> {
        self.record(Call::Remove {
            component: component.to_string(),
            question: question_id.to_string(),
        });
        Ok(self.file_list.clone())
    }

    async fn generate_report(
        &self,
        _project: &str,
        components: &BTreeMap<String, BTreeMap<String, AnswerValue>>,
    ) -> Result<GenerateResponse, ApiError> {
        self.record(Call::Generate(components.keys().cloned().collect()));
        if let Some(message) = &self.generate_error {
            return Err(ApiError::other(message.clone()));
        }
        Ok(GenerateResponse {
            pdf_path: self.pdf_path.clone(),
        })
    }

    async fn download_report(&self, _project: &str, _report_id: &str) -> Result<Vec<u8>, ApiError> {
        Err(unscripted("download_report"))
    }

    async fn finalize_report(&self, _project: &str) -> Result<(), ApiError> {
        Err(unscripted("finalize_report"))
    }

    async fn reset_active_report(&self, _project: &str) -> Result<Option<ActiveReport>, ApiError> {
        Err(unscripted("reset_active_report"))
    }

    async fn delete_active_report(&self, _project: &str) -> Result<(), ApiError> {
        Err(unscripted("delete_active_report"))
    }

    async fn delete_finalized_report(
        &self,
        _project: &str,
        _file_name: &str,
    ) -> Result<(), ApiError> {
        Err(unscripted("delete_finalized_report"))
    }

    async fn send_report_email(
        &self,
        _project: &str,
        _report_id: &str,
        _recipients: &[String],
    ) -> Result<(), ApiError> {
        Err(unscripted("send_report_email"))
    }
}
