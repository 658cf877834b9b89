//! Active report lifecycle: phase derivation and transition guards.
//!
//! Draft -> Generated -> Finalized, with Generated -> Draft via reset and
//! Draft|Generated -> gone via delete. Finalized is terminal: no guard opens
//! from it, and callers treat every action as a no-op there.

use chrono::Local;

use crate::api::models::ActiveReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPhase {
    Draft,
    Generated,
    Finalized,
}

impl ReportPhase {
    pub fn of(report: &ActiveReport) -> Self {
        if report.is_finalized {
            ReportPhase::Finalized
        } else if report.report_generated {
            ReportPhase::Generated
        } else {
            ReportPhase::Draft
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPhase::Draft => "draft",
            ReportPhase::Generated => "generated",
            ReportPhase::Finalized => "finalized",
        }
    }
}

pub fn can_edit(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if !r.is_finalized)
}

pub fn can_generate(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if !r.is_finalized)
}

pub fn can_reset(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if r.report_generated && !r.is_finalized)
}

pub fn can_finalize(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if r.report_generated && !r.is_finalized)
}

pub fn can_delete(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if !r.is_finalized)
}

/// A generated-but-unfinalized report warrants a warning before the user
/// leaves; anything else may be abandoned freely.
pub fn needs_exit_warning(report: Option<&ActiveReport>) -> bool {
    matches!(report, Some(r) if r.report_generated && !r.is_finalized)
}

/// How a reset was applied locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The server returned the reset report; local state mirrors it.
    Confirmed,
    /// The server acknowledged without a report payload; local state was
    /// projected to the reset shape. The caller must warn the user.
    Degraded,
}

/// Apply a reset response. When the server omits the report, project the
/// reset locally: generated flag cleared, PDF name dropped, answers kept.
pub fn apply_reset(
    current: &mut ActiveReport,
    server: Option<ActiveReport>,
) -> ResetOutcome {
    match server {
        Some(report) => {
            *current = report;
            ResetOutcome::Confirmed
        }
        None => {
            current.report_generated = false;
            current.pdf_file_name = None;
            ResetOutcome::Degraded
        }
    }
}

/// File name portion of a server-side PDF path.
pub fn pdf_file_name_from_path(path: &str) -> Option<String> {
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Download name to use when the report carries no PDF file name.
pub fn fallback_download_name(project: &str) -> String {
    format!("{}__{}.pdf", project, Local::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(generated: bool, finalized: bool) -> ActiveReport {
        ActiveReport {
            report_id: "rep-1".into(),
            project_name: "Demo".into(),
            report_generated: generated,
            is_finalized: finalized,
            pdf_file_name: generated.then(|| "demo__2026-08-01.pdf".into()),
            created_at: None,
            components: Default::default(),
        }
    }

    #[test]
    fn phase_follows_flags() {
        assert_eq!(ReportPhase::of(&report(false, false)), ReportPhase::Draft);
        assert_eq!(ReportPhase::of(&report(true, false)), ReportPhase::Generated);
        assert_eq!(ReportPhase::of(&report(true, true)), ReportPhase::Finalized);
    }

    #[test]
    fn finalized_is_terminal() {
        let r = report(true, true);
        assert!(!can_edit(Some(&r)));
        assert!(!can_generate(Some(&r)));
        assert!(!can_reset(Some(&r)));
        assert!(!can_finalize(Some(&r)));
        assert!(!can_delete(Some(&r)));
        assert!(!needs_exit_warning(Some(&r)));
    }

    #[test]
    fn reset_and_finalize_require_generated() {
        let draft = report(false, false);
        assert!(!can_reset(Some(&draft)));
        assert!(!can_finalize(Some(&draft)));
        assert!(can_generate(Some(&draft)));
        assert!(can_delete(Some(&draft)));

        let generated = report(true, false);
        assert!(can_reset(Some(&generated)));
        assert!(can_finalize(Some(&generated)));
        assert!(needs_exit_warning(Some(&generated)));
    }

    #[test]
    fn reset_with_server_report_is_confirmed() {
        let mut current = report(true, false);
        let outcome = apply_reset(&mut current, Some(report(false, false)));
        assert_eq!(outcome, ResetOutcome::Confirmed);
        assert!(!current.report_generated);
        assert_eq!(current.pdf_file_name, None);
    }

    #[test]
    fn reset_without_server_report_projects_locally() {
        let mut current = report(true, false);
        current
            .components
            .insert("Finans".into(), Default::default());

        let outcome = apply_reset(&mut current, None);
        assert_eq!(outcome, ResetOutcome::Degraded);
        assert!(!current.report_generated);
        assert_eq!(current.pdf_file_name, None);
        // Draft answers survive the projection.
        assert!(current.components.contains_key("Finans"));
    }

    #[test]
    fn derives_pdf_name_from_path() {
        assert_eq!(
            pdf_file_name_from_path("reports/demo/demo__2026-08-01.pdf"),
            Some("demo__2026-08-01.pdf".into())
        );
        assert_eq!(pdf_file_name_from_path("bare.pdf"), Some("bare.pdf".into()));
        assert_eq!(pdf_file_name_from_path(""), None);
        assert_eq!(pdf_file_name_from_path("trailing/"), None);
    }
}
