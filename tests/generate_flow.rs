mod common;

use common::{Call, MockBackend};
use investor_report_cli::api::models::{
    ActiveReport, AnswerValue, FileDescriptor, FileKind, Question, QuestionKind,
};
use investor_report_cli::report::generate::{self, GenerateError};
use investor_report_cli::report::store::{ComponentStore, StoreAction, assemble_initial_data};
use investor_report_cli::report::SlotKey;

fn file_question(id: &str) -> Question {
    Question {
        id: id.into(),
        text: format!("{id} upload:"),
        kind: QuestionKind::File,
        required: true,
        options: Vec::new(),
        min_length: None,
        placeholder: None,
        description: None,
        accept: Some(FileKind::Pdf),
    }
}

fn text_question(id: &str) -> Question {
    Question {
        id: id.into(),
        text: format!("{id}:"),
        kind: QuestionKind::Text,
        required: false,
        options: Vec::new(),
        min_length: None,
        placeholder: None,
        description: None,
        accept: None,
    }
}

fn descriptor(filename: &str) -> FileDescriptor {
    FileDescriptor {
        filename: filename.into(),
        path: format!("active_report/demo/pdfs/{filename}"),
        kind: FileKind::Pdf,
        uploaded_at: None,
    }
}

fn demo_report(generated: bool) -> ActiveReport {
    ActiveReport {
        report_id: "rep-1".into(),
        project_name: "Demo".into(),
        report_generated: generated,
        is_finalized: false,
        pdf_file_name: None,
        created_at: None,
        components: Default::default(),
    }
}

/// Store with the "Finans" component carrying a required PDF slot, plus an
/// optional second component.
fn store_with(components: Vec<(&str, Vec<Question>)>) -> ComponentStore {
    let mut store = ComponentStore::new();
    store.dispatch(StoreAction::SetInitialData {
        components: assemble_initial_data(
            components
                .into_iter()
                .map(|(name, questions)| (name.to_string(), questions))
                .collect(),
            None,
        ),
    });
    store
}

fn attach(store: &mut ComponentStore, component: &str, question: &str, filename: &str) {
    store.dispatch(StoreAction::UpdateAnswer {
        slot: SlotKey::new(component, question),
        value: AnswerValue::Files(vec![descriptor(filename)]),
    });
}

#[tokio::test]
async fn unsatisfied_required_files_block_generation_before_any_call() {
    let store = store_with(vec![
        ("Finans", vec![file_question("finance_report")]),
        ("İnşaat", vec![file_question("construction_images")]),
        ("Özet", vec![text_question("summary")]),
    ]);

    let backend = MockBackend::default();
    let result = generate::run(&backend, "Demo", &store).await;

    match result {
        Err(GenerateError::MissingAttachments(components)) => {
            // Every offender is named, not just the first.
            assert_eq!(components, vec!["Finans".to_string(), "İnşaat".to_string()]);
        }
        other => panic!("expected MissingAttachments, got {other:?}"),
    }
    // Refused locally: nothing went over the wire.
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn generates_after_save_and_refetches_the_report() {
    let mut store = store_with(vec![(
        "Finans",
        vec![text_question("currency_info"), file_question("finance_report")],
    )]);
    attach(&mut store, "Finans", "finance_report", "report.pdf");

    let backend = MockBackend {
        pdf_path: Some("reports/demo/demo__2026-08-07.pdf".into()),
        refreshed_report: Some(demo_report(true)),
        ..Default::default()
    };

    let outcome = generate::run(&backend, "Demo", &store).await.unwrap();

    assert_eq!(outcome.saved, vec!["Finans".to_string()]);
    assert!(outcome.save_failures.is_empty());
    assert!(outcome.report.report_generated);
    // PDF name is derived from the generation response path.
    assert_eq!(
        outcome.report.pdf_file_name.as_deref(),
        Some("demo__2026-08-07.pdf")
    );

    assert_eq!(
        backend.calls(),
        vec![
            Call::SaveComponent("Finans".into()),
            Call::Generate(vec!["Finans".into()]),
            Call::ActiveReport,
        ]
    );
}

#[tokio::test]
async fn save_failures_are_collected_and_survivors_still_generate() {
    let mut store = store_with(vec![
        ("Finans", vec![file_question("finance_report")]),
        ("İşletme", vec![file_question("business_report")]),
    ]);
    attach(&mut store, "Finans", "finance_report", "finans.pdf");
    attach(&mut store, "İşletme", "business_report", "isletme.pdf");

    let backend = MockBackend {
        failing_saves: vec![("Finans".into(), "disk full".into())],
        refreshed_report: Some(demo_report(true)),
        ..Default::default()
    };

    let outcome = generate::run(&backend, "Demo", &store).await.unwrap();

    assert_eq!(outcome.saved, vec!["İşletme".to_string()]);
    assert_eq!(outcome.save_failures.len(), 1);
    assert_eq!(outcome.save_failures[0].0, "Finans");

    // The batch went on past the failure and generation only carried the
    // component that saved.
    let calls = backend.calls();
    assert!(calls.contains(&Call::SaveComponent("İşletme".into())));
    assert!(calls.contains(&Call::Generate(vec!["İşletme".into()])));
}

#[tokio::test]
async fn aborts_when_no_component_could_be_saved() {
    let mut store = store_with(vec![("Finans", vec![file_question("finance_report")])]);
    attach(&mut store, "Finans", "finance_report", "report.pdf");

    let backend = MockBackend {
        failing_saves: vec![("Finans".into(), "backend unavailable".into())],
        ..Default::default()
    };

    let result = generate::run(&backend, "Demo", &store).await;
    match result {
        Err(GenerateError::NothingSaved(failures)) => {
            assert_eq!(failures.len(), 1);
        }
        other => panic!("expected NothingSaved, got {other:?}"),
    }
    // No generate call without saved data.
    assert!(
        !backend
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Generate(_)))
    );
}

#[tokio::test]
async fn generation_failure_is_surfaced_and_report_not_refetched() {
    let mut store = store_with(vec![("Finans", vec![file_question("finance_report")])]);
    attach(&mut store, "Finans", "finance_report", "report.pdf");

    let backend = MockBackend {
        generate_error: Some("renderer crashed".into()),
        ..Default::default()
    };

    let result = generate::run(&backend, "Demo", &store).await;
    match result {
        Err(GenerateError::Generate(message)) => assert!(message.contains("renderer crashed")),
        other => panic!("expected Generate error, got {other:?}"),
    }
    assert!(!backend.calls().contains(&Call::ActiveReport));
}
