pub mod project_select_app;
pub mod report_editor_app;

pub use project_select_app::ProjectSelectApp;
pub use report_editor_app::ReportEditorApp;
