//! Backend operations.
//!
//! Every remote call the client makes goes through [`ReportBackend`], so the
//! generation orchestrator and the tests can run against a scripted stand-in
//! instead of a live server.

use super::client::ReportClient;
use super::error::ApiError;
use super::models::{
    ActiveReport, AnswerValue, ComponentCatalog, FileDescriptor, FileKind, FileListResponse,
    GenerateResponse, ProjectDetail, Question, QuestionList, ResetResponse,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;

/// A file staged for upload, read from disk after local policy checks.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ReportBackend: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<String>, ApiError>;

    async fn project_detail(&self, project: &str) -> Result<ProjectDetail, ApiError>;

    /// The project's active report, or `None` when there is none. A
    /// finalized report is never "active".
    async fn active_report(&self, project: &str) -> Result<Option<ActiveReport>, ApiError>;

    /// Start a report. Fails with a conflict when one already exists.
    async fn create_report(&self, project: &str) -> Result<ActiveReport, ApiError>;

    async fn list_components(&self) -> Result<Vec<String>, ApiError>;

    async fn component_questions(&self, component: &str) -> Result<Vec<Question>, ApiError>;

    /// Persist a partial or full answer map for one component.
    async fn save_component_data(
        &self,
        project: &str,
        component: &str,
        answers: &BTreeMap<String, AnswerValue>,
    ) -> Result<(), ApiError>;

    /// Upload one attachment; returns the slot's complete file list.
    async fn upload_component_file(
        &self,
        project: &str,
        component: &str,
        question_id: &str,
        upload: FileUpload,
    ) -> Result<Vec<FileDescriptor>, ApiError>;

    /// Remove one attachment by (filename, path); returns the remaining list.
    async fn remove_component_file(
        &self,
        project: &str,
        component: &str,
        question_id: &str,
        filename: &str,
        path: &str,
    ) -> Result<Vec<FileDescriptor>, ApiError>;

    async fn generate_report(
        &self,
        project: &str,
        components: &BTreeMap<String, BTreeMap<String, AnswerValue>>,
    ) -> Result<GenerateResponse, ApiError>;

    async fn download_report(&self, project: &str, report_id: &str) -> Result<Vec<u8>, ApiError>;

    async fn finalize_report(&self, project: &str) -> Result<(), ApiError>;

    /// Clear the generated state of the active report. The returned report
    /// may be absent; callers then fall back to a local projection.
    async fn reset_active_report(&self, project: &str) -> Result<Option<ActiveReport>, ApiError>;

    async fn delete_active_report(&self, project: &str) -> Result<(), ApiError>;

    async fn delete_finalized_report(&self, project: &str, file_name: &str) -> Result<(), ApiError>;

    async fn send_report_email(
        &self,
        project: &str,
        report_id: &str,
        recipients: &[String],
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl ReportBackend for ReportClient {
    async fn list_projects(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(self.url(&["projects"])).await
    }

    async fn project_detail(&self, project: &str) -> Result<ProjectDetail, ApiError> {
        self.get_json(self.url(&["project", project])).await
    }

    async fn active_report(&self, project: &str) -> Result<Option<ActiveReport>, ApiError> {
        let result: Result<Option<ActiveReport>, ApiError> = self
            .get_json(self.url(&["project", project, "report", "active"]))
            .await;
        match result {
            // A finalized report is no longer editable; treat it as absent.
            Ok(Some(report)) if report.is_finalized => Ok(None),
            Ok(report) => Ok(report),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_report(&self, project: &str) -> Result<ActiveReport, ApiError> {
        self.post_json(
            self.url(&["project", "create-report"]),
            &json!({ "project_name": project }),
        )
        .await
    }

    async fn list_components(&self) -> Result<Vec<String>, ApiError> {
        let catalog: ComponentCatalog = self.get_json(self.url(&["components"])).await?;
        Ok(catalog.components)
    }

    async fn component_questions(&self, component: &str) -> Result<Vec<Question>, ApiError> {
        let list: QuestionList = self
            .get_json(self.url(&["component", component, "questions"]))
            .await?;
        Ok(list.questions)
    }

    async fn save_component_data(
        &self,
        project: &str,
        component: &str,
        answers: &BTreeMap<String, AnswerValue>,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                self.url(&["component", "save-data"]),
                &json!({
                    "project_name": project,
                    "component_name": component,
                    "answers": answers,
                }),
            )
            .await?;
        Ok(())
    }

    async fn upload_component_file(
        &self,
        project: &str,
        component: &str,
        question_id: &str,
        upload: FileUpload,
    ) -> Result<Vec<FileDescriptor>, ApiError> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(upload.kind.mime())
            .map_err(ApiError::transport)?;
        let form = reqwest::multipart::Form::new()
            .text("component_name", component.to_string())
            .text("question_id", question_id.to_string())
            .text("kind", upload.kind.label().to_lowercase())
            .part("file", part);

        let response: FileListResponse = self
            .post_multipart(self.url(&["project", project, "upload-component-file"]), form)
            .await?;
        if !response.success {
            return Err(ApiError::other("upload was rejected by the server"));
        }
        Ok(response.files)
    }

    async fn remove_component_file(
        &self,
        project: &str,
        component: &str,
        question_id: &str,
        filename: &str,
        path: &str,
    ) -> Result<Vec<FileDescriptor>, ApiError> {
        let response: FileListResponse = self
            .post_json(
                self.url(&["project", project, "remove-component-file"]),
                &json!({
                    "component_name": component,
                    "question_id": question_id,
                    "filename": filename,
                    "path": path,
                }),
            )
            .await?;
        if !response.success {
            return Err(ApiError::other("removal was rejected by the server"));
        }
        Ok(response.files)
    }

    async fn generate_report(
        &self,
        project: &str,
        components: &BTreeMap<String, BTreeMap<String, AnswerValue>>,
    ) -> Result<GenerateResponse, ApiError> {
        self.post_json(
            self.url(&["project", "generate-report"]),
            &json!({
                "project_name": project,
                "components_data": components,
            }),
        )
        .await
    }

    async fn download_report(&self, project: &str, report_id: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(self.url(&["project", project, "report", report_id, "download"]))
            .await
    }

    async fn finalize_report(&self, project: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                self.url(&["project", "finalize-report"]),
                &json!({ "project_name": project }),
            )
            .await?;
        Ok(())
    }

    async fn reset_active_report(&self, project: &str) -> Result<Option<ActiveReport>, ApiError> {
        let response: ResetResponse = self
            .post_json(
                self.url(&["project", project, "reset-active-report"]),
                &json!({}),
            )
            .await?;
        Ok(response.active_report)
    }

    async fn delete_active_report(&self, project: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .delete_json(self.url(&["project", project, "delete-report"]))
            .await?;
        Ok(())
    }

    async fn delete_finalized_report(&self, project: &str, file_name: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                self.url(&["project", "delete-finalized-report"]),
                &json!({
                    "project_name": project,
                    "file_name": file_name,
                }),
            )
            .await?;
        Ok(())
    }

    async fn send_report_email(
        &self,
        project: &str,
        report_id: &str,
        recipients: &[String],
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(
                self.url(&["project", project, "report", report_id, "send-email"]),
                &json!({
                    "project_name": project,
                    "report_id": report_id,
                    "email_addresses": recipients,
                }),
            )
            .await?;
        Ok(())
    }
}
