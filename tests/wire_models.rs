//! Wire-shape checks against payloads the backend actually produces.

use investor_report_cli::api::models::{
    ActiveReport, AnswerValue, FileKind, QuestionKind, QuestionList, ResetResponse,
};
use serde_json::json;

#[test]
fn active_report_payload_round_trip() {
    let payload = json!({
        "report_id": "rep-42",
        "project_name": "Green Valley",
        "report_generated": true,
        "is_finalized": false,
        "pdf_file_name": "green_valley__2026-08-01.pdf",
        "components": {
            "Finans": {
                "answers": {
                    "currency_info": "34.2",
                    "finance_report": [
                        {
                            "filename": "q2.pdf",
                            "path": "active_report/green_valley/pdfs/finans-1722500000.pdf",
                            "type": "pdf",
                            "uploaded_at": "2026-08-01T09:30:00Z"
                        }
                    ]
                }
            }
        }
    });

    let report: ActiveReport = serde_json::from_value(payload).unwrap();
    assert!(report.report_generated);
    assert!(!report.is_finalized);

    let finans = &report.components["Finans"];
    assert_eq!(
        finans.answers["currency_info"].as_text(),
        Some("34.2")
    );
    let files = finans.answers["finance_report"].as_files().unwrap();
    assert_eq!(files[0].kind, FileKind::Pdf);
    assert!(files[0].uploaded_at.is_some());

    // Serialization keeps the untagged answer shapes.
    let round = serde_json::to_value(&report).unwrap();
    assert_eq!(
        round["components"]["Finans"]["answers"]["currency_info"],
        json!("34.2")
    );
    assert!(round["components"]["Finans"]["answers"]["finance_report"].is_array());
}

#[test]
fn question_catalog_parses_mixed_kinds() {
    let payload = json!({
        "questions": [
            {"id": "business_revenue", "text": "Monthly revenue:", "type": "text", "required": false},
            {"id": "business_details", "text": "Notes:", "type": "textarea", "required": false},
            {
                "id": "media_coverage",
                "text": "Coverage:",
                "type": "select",
                "options": [{"value": "low", "label": "Low"}, {"value": "high", "label": "High"}]
            },
            {"id": "business_report", "text": "Report PDF:", "type": "file", "required": true, "accept": "pdf"}
        ]
    });

    let list: QuestionList = serde_json::from_value(payload).unwrap();
    assert_eq!(list.questions.len(), 4);
    assert_eq!(list.questions[0].kind, QuestionKind::Text);
    assert_eq!(list.questions[2].options.len(), 2);

    let file_q = &list.questions[3];
    assert_eq!(file_q.kind, QuestionKind::File);
    assert!(file_q.required);
    assert_eq!(file_q.accept, Some(FileKind::Pdf));
}

#[test]
fn reset_response_may_omit_the_report() {
    let with: ResetResponse = serde_json::from_value(json!({
        "message": "reset done",
        "active_report": {"report_id": "rep-1", "project_name": "Demo"}
    }))
    .unwrap();
    assert!(with.active_report.is_some());

    let without: ResetResponse = serde_json::from_value(json!({"message": "reset done"})).unwrap();
    assert!(without.active_report.is_none());
}

#[test]
fn legacy_scalar_file_answers_still_parse() {
    // Older payloads stored a bare filename before the list bookkeeping.
    let value: AnswerValue = serde_json::from_value(json!("report.pdf")).unwrap();
    assert_eq!(value.as_text(), Some("report.pdf"));
    assert!(value.as_files().is_none());
}
