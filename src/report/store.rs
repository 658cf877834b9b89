//! In-memory component data store.
//!
//! Single source of truth the editor reads and writes. All mutation flows
//! through [`ComponentStore::dispatch`] with an explicit [`StoreAction`], so
//! every state change is attributable to one action at one call site.

use super::SlotKey;
use crate::api::models::{ActiveReport, AnswerValue, Question};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Questions and answers of one report component.
#[derive(Debug, Clone, Default)]
pub struct ComponentEntry {
    pub questions: Vec<Question>,
    pub answers: BTreeMap<String, AnswerValue>,
}

/// The actions the store accepts.
#[derive(Debug, Clone)]
pub enum StoreAction {
    SetLoading(bool),
    SetInitialData { components: Vec<(String, ComponentEntry)> },
    SetError(Option<String>),
    /// Replace exactly one answer leaf.
    UpdateAnswer { slot: SlotKey, value: AnswerValue },
    SetFileLoading { slot: SlotKey, loading: bool },
    /// Overwrite the cached active report with the server's copy.
    SetActiveReport(Option<ActiveReport>),
}

#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    loading: bool,
    error: Option<String>,
    order: Vec<String>,
    entries: HashMap<String, ComponentEntry>,
    file_loading: HashSet<SlotKey>,
    active_report: Option<ActiveReport>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: StoreAction) {
        match action {
            StoreAction::SetLoading(loading) => self.loading = loading,
            StoreAction::SetInitialData { components } => {
                self.order = components.iter().map(|(name, _)| name.clone()).collect();
                self.entries = components.into_iter().collect();
                self.loading = false;
                self.error = None;
            }
            StoreAction::SetError(error) => {
                self.error = error;
                self.loading = false;
            }
            StoreAction::UpdateAnswer { slot, value } => {
                match self.entries.get_mut(&slot.component) {
                    Some(entry) => {
                        entry.answers.insert(slot.question, value);
                    }
                    None => log::warn!("answer update for unknown component {}", slot.component),
                }
            }
            StoreAction::SetFileLoading { slot, loading } => {
                if loading {
                    self.file_loading.insert(slot);
                } else {
                    self.file_loading.remove(&slot);
                }
            }
            StoreAction::SetActiveReport(report) => self.active_report = report,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Component names in catalog order.
    pub fn components(&self) -> &[String] {
        &self.order
    }

    pub fn entry(&self, component: &str) -> Option<&ComponentEntry> {
        self.entries.get(component)
    }

    pub fn question(&self, slot: &SlotKey) -> Option<&Question> {
        self.entries
            .get(&slot.component)?
            .questions
            .iter()
            .find(|q| q.id == slot.question)
    }

    pub fn answer(&self, slot: &SlotKey) -> Option<&AnswerValue> {
        self.entries.get(&slot.component)?.answers.get(&slot.question)
    }

    pub fn is_file_loading(&self, slot: &SlotKey) -> bool {
        self.file_loading.contains(slot)
    }

    pub fn active_report(&self) -> Option<&ActiveReport> {
        self.active_report.as_ref()
    }
}

/// Assemble initial entries from the catalog and any answers already saved
/// on the active report. Questions without a saved answer keep their default
/// empty value so the form always shows the full catalog.
pub fn assemble_initial_data(
    components: Vec<(String, Vec<Question>)>,
    report: Option<&ActiveReport>,
) -> Vec<(String, ComponentEntry)> {
    components
        .into_iter()
        .map(|(name, questions)| {
            let saved = report
                .and_then(|r| r.components.get(&name))
                .map(|c| c.answers.clone())
                .unwrap_or_default();

            let mut answers = BTreeMap::new();
            for question in &questions {
                let value = saved
                    .get(&question.id)
                    .cloned()
                    .unwrap_or_else(|| AnswerValue::default_for(question.kind));
                answers.insert(question.id.clone(), value);
            }

            (name, ComponentEntry { questions, answers })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ComponentAnswers, FileDescriptor, FileKind, QuestionKind};

    fn question(id: &str, kind: QuestionKind, required: bool) -> Question {
        Question {
            id: id.into(),
            text: format!("{id}?"),
            kind,
            required,
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

    fn loaded_store() -> ComponentStore {
        let mut store = ComponentStore::new();
        store.dispatch(StoreAction::SetInitialData {
            components: assemble_initial_data(
                vec![
                    (
                        "Finans".into(),
                        vec![
                            question("currency_info", QuestionKind::Text, false),
                            question("finance_report", QuestionKind::File, true),
                        ],
                    ),
                    (
                        "İnşaat".into(),
                        vec![question("construction_images", QuestionKind::File, true)],
                    ),
                ],
                None,
            ),
        });
        store
    }

    #[test]
    fn update_answer_replaces_exactly_one_leaf() {
        let mut store = loaded_store();
        store.dispatch(StoreAction::UpdateAnswer {
            slot: SlotKey::new("Finans", "currency_info"),
            value: AnswerValue::Text("12.5".into()),
        });

        assert_eq!(
            store
                .answer(&SlotKey::new("Finans", "currency_info"))
                .and_then(AnswerValue::as_text),
            Some("12.5")
        );
        // Sibling answers untouched.
        assert_eq!(
            store
                .answer(&SlotKey::new("Finans", "finance_report"))
                .map(AnswerValue::is_empty),
            Some(true)
        );
    }

    #[test]
    fn server_file_list_replaces_local_state() {
        let mut store = loaded_store();
        let slot = SlotKey::new("Finans", "finance_report");
        store.dispatch(StoreAction::UpdateAnswer {
            slot: slot.clone(),
            value: AnswerValue::Files(vec![descriptor("stale.pdf")]),
        });

        // Server says the slot holds exactly these files.
        let server_list = vec![descriptor("a.pdf"), descriptor("b.pdf"), descriptor("f.pdf")];
        store.dispatch(StoreAction::UpdateAnswer {
            slot: slot.clone(),
            value: AnswerValue::Files(server_list.clone()),
        });

        assert_eq!(store.answer(&slot).and_then(AnswerValue::as_files), Some(&server_list[..]));
    }

    #[test]
    fn initial_merge_keeps_unanswered_questions() {
        let mut report = ActiveReport {
            report_id: "rep-1".into(),
            project_name: "Demo".into(),
            report_generated: false,
            is_finalized: false,
            pdf_file_name: None,
            created_at: None,
            components: BTreeMap::new(),
        };
        let mut answers = BTreeMap::new();
        answers.insert("currency_info".into(), AnswerValue::Text("7.8".into()));
        answers.insert(
            "finance_report".into(),
            AnswerValue::Files(vec![descriptor("saved.pdf")]),
        );
        report
            .components
            .insert("Finans".into(), ComponentAnswers { answers });

        let data = assemble_initial_data(
            vec![(
                "Finans".into(),
                vec![
                    question("currency_info", QuestionKind::Text, false),
                    question("finance_details", QuestionKind::Textarea, false),
                    question("finance_report", QuestionKind::File, true),
                ],
            )],
            Some(&report),
        );

        let (_, entry) = &data[0];
        assert_eq!(
            entry.answers.get("currency_info").and_then(AnswerValue::as_text),
            Some("7.8")
        );
        // Question with no saved answer stays present with its default.
        assert_eq!(
            entry.answers.get("finance_details").map(AnswerValue::is_empty),
            Some(true)
        );
        assert_eq!(
            entry
                .answers
                .get("finance_report")
                .and_then(AnswerValue::as_files)
                .map(|f| f.len()),
            Some(1)
        );
    }

    #[test]
    fn file_loading_flags_are_per_slot() {
        let mut store = loaded_store();
        let finans = SlotKey::new("Finans", "finance_report");
        let insaat = SlotKey::new("İnşaat", "construction_images");

        store.dispatch(StoreAction::SetFileLoading {
            slot: finans.clone(),
            loading: true,
        });
        assert!(store.is_file_loading(&finans));
        assert!(!store.is_file_loading(&insaat));

        store.dispatch(StoreAction::SetFileLoading {
            slot: finans.clone(),
            loading: false,
        });
        assert!(!store.is_file_loading(&finans));
    }

    #[test]
    fn active_report_is_overwritten_not_merged() {
        let mut store = loaded_store();
        store.dispatch(StoreAction::SetActiveReport(Some(ActiveReport {
            report_id: "rep-1".into(),
            project_name: "Demo".into(),
            report_generated: true,
            is_finalized: false,
            pdf_file_name: Some("demo__2026-08-01.pdf".into()),
            created_at: None,
            components: BTreeMap::new(),
        })));

        store.dispatch(StoreAction::SetActiveReport(Some(ActiveReport {
            report_id: "rep-1".into(),
            project_name: "Demo".into(),
            report_generated: false,
            is_finalized: false,
            pdf_file_name: None,
            created_at: None,
            components: BTreeMap::new(),
        })));

        let report = store.active_report().unwrap();
        assert!(!report.report_generated);
        assert_eq!(report.pdf_file_name, None);
    }
}
