//! The report builder screen.
//!
//! One scrollable form over every component's questions. Scalar edits update
//! the store immediately and autosave on a debounce; attachments upload
//! immediately under a per-slot loading flag and always end up mirroring the
//! server's file list. Generation, reset, finalize and delete run through
//! the lifecycle guards with confirmation dialogs.

use crate::api::models::{ActiveReport, AnswerValue, FileDescriptor, QuestionKind};
use crate::api::{FileUpload, ReportBackend};
use crate::report::debounce::{AUTOSAVE_DELAY, AutosaveQueue, SaveToken};
use crate::report::generate::{self, GenerateError, GenerationOutcome};
use crate::report::store::{ComponentEntry, ComponentStore, StoreAction, assemble_initial_data};
use crate::report::validation::validate;
use crate::report::{SlotKey, attachments, lifecycle, section};
use crate::tui::{
    App, AppTarget, Command, ConfirmModal, EditorParams, KeyResponse, Subscription,
    TextInputState, Theme,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub struct ReportEditorApp;

/// Ephemeral per-field state; derived, never persisted.
#[derive(Debug, Clone, Default)]
pub struct FieldStatus {
    pub is_valid: bool,
    pub message: String,
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Generating,
    Resetting,
    Finalizing,
    Deleting,
    Downloading,
    Emailing,
}

impl Busy {
    fn label(&self) -> &'static str {
        match self {
            Busy::Generating => "generating report…",
            Busy::Resetting => "resetting…",
            Busy::Finalizing => "finalizing…",
            Busy::Deleting => "deleting…",
            Busy::Downloading => "downloading…",
            Busy::Emailing => "sending email…",
        }
    }
}

enum EditTarget {
    /// Editing a scalar answer in place.
    Text { slot: SlotKey },
    /// Typing a path to upload into a file slot.
    Path { slot: SlotKey },
}

struct Editing {
    target: EditTarget,
    input: TextInputState,
}

pub struct State {
    project: String,
    store: ComponentStore,
    autosave: AutosaveQueue,
    field_status: HashMap<SlotKey, FieldStatus>,
    selected: usize,
    scroll: u16,
    viewport_height: u16,
    active_section: usize,
    file_cursor: usize,
    editing: Option<Editing>,
    modal: Option<ConfirmModal<Msg>>,
    busy: Option<Busy>,
}

#[derive(Clone)]
pub enum Msg {
    InitialData(Result<(Vec<(String, ComponentEntry)>, Vec<String>), String>),
    Nav(KeyCode),
    JumpSection(i32),
    StartEdit,
    AnswerEdited { slot: SlotKey, value: String },
    CommitEdit,
    CancelEdit,
    AutosaveDue { slot: SlotKey, token: SaveToken },
    AutosaveFinished { slot: SlotKey, result: Result<(), String> },
    FileCursor(i32),
    UploadRequested,
    PathSubmitted,
    UploadFinished {
        slot: SlotKey,
        result: Result<Vec<FileDescriptor>, String>,
    },
    RemoveFileRequested,
    RemoveFinished {
        slot: SlotKey,
        result: Result<Vec<FileDescriptor>, String>,
    },
    GenerateRequested,
    GenerateFinished(Result<GenerationOutcome, GenerateError>),
    ResetRequested,
    ResetConfirmed,
    ResetFinished(Result<Option<ActiveReport>, String>),
    FinalizeRequested,
    FinalizeConfirmed,
    FinalizeFinished(Result<(), String>),
    DeleteRequested,
    DeleteConfirmed,
    DeleteFinished(Result<(), String>),
    DownloadRequested,
    DownloadFinished(Result<String, String>),
    EmailRequested,
    EmailConfirmed,
    EmailFinished(Result<(), String>),
    BackRequested,
    ModalDismissed,
}

/// Flat list of selectable question rows: (component index, question index).
fn question_rows(store: &ComponentStore) -> Vec<(usize, usize)> {
    let mut rows = Vec::new();
    for (c, component) in store.components().iter().enumerate() {
        if let Some(entry) = store.entry(component) {
            for q in 0..entry.questions.len() {
                rows.push((c, q));
            }
        }
    }
    rows
}

fn selected_slot(state: &State) -> Option<SlotKey> {
    let rows = question_rows(&state.store);
    let (c, q) = *rows.get(state.selected)?;
    let component = state.store.components().get(c)?.clone();
    let question = state.store.entry(&component)?.questions.get(q)?.id.clone();
    Some(SlotKey::new(component, question))
}

/// Rendered height of one question block.
fn question_height(state: &State, slot: &SlotKey) -> u16 {
    let mut height = 1; // label
    height += match state.store.answer(slot) {
        Some(AnswerValue::Files(files)) => files.len().max(1) as u16,
        _ => 1,
    };
    if let Some(status) = state.field_status.get(slot) {
        if !status.is_valid && !status.message.is_empty() {
            height += 1;
        }
    }
    height + 1 // trailing blank
}

/// Per-component section heights, used for scroll geometry.
fn section_heights(state: &State) -> Vec<u16> {
    state
        .store
        .components()
        .iter()
        .map(|component| {
            let mut height = 2; // header + underline
            if let Some(entry) = state.store.entry(component) {
                for question in &entry.questions {
                    height +=
                        question_height(state, &SlotKey::new(component.clone(), question.id.clone()));
                }
            }
            height
        })
        .collect()
}

/// Content row where the selected question starts.
fn selected_row_offset(state: &State) -> u16 {
    let rows = question_rows(&state.store);
    let mut y = 0u16;
    let mut current_component = usize::MAX;
    for (index, (c, q)) in rows.iter().enumerate() {
        if *c != current_component {
            current_component = *c;
            y += 2;
        }
        let component = &state.store.components()[*c];
        let question_id = state
            .store
            .entry(component)
            .and_then(|e| e.questions.get(*q))
            .map(|question| question.id.clone())
            .unwrap_or_default();
        let slot = SlotKey::new(component.clone(), question_id);
        if index == state.selected {
            return y;
        }
        y += question_height(state, &slot);
    }
    y
}

fn ensure_selection_visible(state: &mut State) {
    let row = selected_row_offset(state);
    let viewport = state.viewport_height.max(4);
    if row < state.scroll {
        state.scroll = row;
    } else if row + 3 > state.scroll + viewport {
        state.scroll = (row + 3).saturating_sub(viewport);
    }
}

async fn load_initial(
    report: ActiveReport,
) -> Result<(Vec<(String, ComponentEntry)>, Vec<String>), String> {
    let client = crate::report_client();
    let components = client
        .list_components()
        .await
        .map_err(|e| e.user_message().to_string())?;
    if components.is_empty() {
        return Err("the component catalog is empty".to_string());
    }

    // Question fetches are independent; run them concurrently, keeping
    // catalog order.
    let fetches = components.into_iter().map(|component| async move {
        let result = client.component_questions(&component).await;
        (component, result)
    });

    let mut catalog = Vec::new();
    let mut warnings = Vec::new();
    for (component, result) in futures::future::join_all(fetches).await {
        match result {
            Ok(questions) => {
                if questions.is_empty() {
                    warnings.push(format!("No questions found for {component}."));
                }
                catalog.push((component, questions));
            }
            Err(err) => {
                // Keep the component visible even when its questions failed.
                warnings.push(format!(
                    "Questions for {component} could not be loaded: {}",
                    err.user_message()
                ));
                catalog.push((component, Vec::new()));
            }
        }
    }

    Ok((assemble_initial_data(catalog, Some(&report)), warnings))
}

fn revalidate(state: &mut State, slot: &SlotKey, saved: bool) {
    let result = validate(state.store.answer(slot), state.store.question(slot));
    state.field_status.insert(
        slot.clone(),
        FieldStatus {
            is_valid: result.is_valid,
            message: result.message,
            saved,
        },
    );
}

impl App for ReportEditorApp {
    type State = State;
    type Msg = Msg;
    type Params = EditorParams;

    fn init(params: EditorParams) -> (State, Command<Msg>) {
        let EditorParams { project, report } = params;
        let mut store = ComponentStore::new();
        store.dispatch(StoreAction::SetLoading(true));
        store.dispatch(StoreAction::SetActiveReport(Some(report.clone())));

        let state = State {
            project,
            store,
            autosave: AutosaveQueue::new(),
            field_status: HashMap::new(),
            selected: 0,
            scroll: 0,
            viewport_height: 20,
            active_section: 0,
            file_cursor: 0,
            editing: None,
            modal: None,
            busy: None,
        };

        let command = Command::perform(load_initial(report), Msg::InitialData);
        (state, command)
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::InitialData(result) => match result {
                Ok((components, warnings)) => {
                    state
                        .store
                        .dispatch(StoreAction::SetInitialData { components });
                    let mut commands: Vec<Command<Msg>> = warnings
                        .into_iter()
                        .map(Command::warning)
                        .collect();
                    commands.push(Command::info("Report data loaded."));
                    Command::batch(commands)
                }
                Err(e) => {
                    state.store.dispatch(StoreAction::SetError(Some(e.clone())));
                    Command::error(format!("Could not load report data: {e}"))
                }
            },
            Msg::Nav(key) => {
                let rows = question_rows(&state.store);
                if rows.is_empty() {
                    return Command::None;
                }
                let last = rows.len() - 1;
                state.selected = match key {
                    KeyCode::Up | KeyCode::Char('k') => state.selected.saturating_sub(1),
                    KeyCode::Down | KeyCode::Char('j') => (state.selected + 1).min(last),
                    KeyCode::PageUp => state.selected.saturating_sub(5),
                    KeyCode::PageDown => (state.selected + 5).min(last),
                    KeyCode::Home => 0,
                    KeyCode::End => last,
                    _ => state.selected,
                };
                state.file_cursor = 0;
                ensure_selection_visible(state);
                Command::None
            }
            Msg::JumpSection(direction) => {
                let heights = section_heights(state);
                if heights.is_empty() {
                    return Command::None;
                }
                let target = if direction < 0 {
                    state.active_section.saturating_sub(1)
                } else {
                    (state.active_section + 1).min(heights.len() - 1)
                };
                state.scroll = section::scroll_to(&heights, target);
                state.active_section = target;
                // Move the selection to the section's first question.
                let rows = question_rows(&state.store);
                if let Some(index) = rows.iter().position(|(c, _)| *c == target) {
                    state.selected = index;
                }
                state.file_cursor = 0;
                Command::None
            }
            Msg::StartEdit => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_edit(state.store.active_report()) {
                    return Command::info("This report is finalized; it can no longer be edited.");
                }
                let Some(slot) = selected_slot(state) else {
                    return Command::None;
                };
                let Some(question) = state.store.question(&slot).cloned() else {
                    return Command::None;
                };
                match question.kind {
                    QuestionKind::File => {
                        if state.store.is_file_loading(&slot) {
                            return Command::info("An upload for this slot is still running.");
                        }
                        state.editing = Some(Editing {
                            target: EditTarget::Path { slot },
                            input: TextInputState::new(),
                        });
                        Command::None
                    }
                    QuestionKind::Select => {
                        // Cycle through the options.
                        let current = state
                            .store
                            .answer(&slot)
                            .and_then(AnswerValue::as_text)
                            .unwrap_or("")
                            .to_string();
                        let options = &question.options;
                        if options.is_empty() {
                            return Command::None;
                        }
                        let position = options.iter().position(|o| o.value == current);
                        let next = match position {
                            Some(i) => (i + 1) % options.len(),
                            None => 0,
                        };
                        let value = options[next].value.clone();
                        Self::update(state, Msg::AnswerEdited { slot, value })
                    }
                    QuestionKind::Checkbox => {
                        let current = state
                            .store
                            .answer(&slot)
                            .and_then(AnswerValue::as_text)
                            .unwrap_or("");
                        let value = if current == "true" { "false" } else { "true" };
                        Self::update(
                            state,
                            Msg::AnswerEdited {
                                slot,
                                value: value.to_string(),
                            },
                        )
                    }
                    QuestionKind::Text | QuestionKind::Textarea => {
                        let current = state
                            .store
                            .answer(&slot)
                            .and_then(AnswerValue::as_text)
                            .unwrap_or("")
                            .to_string();
                        state.editing = Some(Editing {
                            target: EditTarget::Text { slot },
                            input: TextInputState::with_value(current),
                        });
                        Command::None
                    }
                }
            }
            Msg::AnswerEdited { slot, value } => {
                state.store.dispatch(StoreAction::UpdateAnswer {
                    slot: slot.clone(),
                    value: AnswerValue::Text(value.clone()),
                });
                revalidate(state, &slot, false);
                let token = state.autosave.schedule(slot.clone(), value);
                Command::perform(tokio::time::sleep(AUTOSAVE_DELAY), move |_| {
                    Msg::AutosaveDue {
                        slot: slot.clone(),
                        token,
                    }
                })
            }
            Msg::AutosaveDue { slot, token } => {
                let Some(value) = state.autosave.take_if_current(&slot, token) else {
                    // Superseded by a newer edit; that timer will handle it.
                    return Command::None;
                };
                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let mut answers = BTreeMap::new();
                        answers.insert(slot.question.clone(), AnswerValue::Text(value));
                        let result = client
                            .save_component_data(&project, &slot.component, &answers)
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::AutosaveFinished { slot, result }
                    },
                    |msg| msg,
                )
            }
            Msg::AutosaveFinished { slot, result } => match result {
                Ok(()) => {
                    if let Some(status) = state.field_status.get_mut(&slot) {
                        status.saved = true;
                    } else {
                        state.field_status.insert(
                            slot,
                            FieldStatus {
                                is_valid: true,
                                message: String::new(),
                                saved: true,
                            },
                        );
                    }
                    Command::None
                }
                Err(e) => {
                    state.field_status.insert(
                        slot.clone(),
                        FieldStatus {
                            is_valid: false,
                            message: "save error".to_string(),
                            saved: false,
                        },
                    );
                    Command::error(format!("Saving {} failed: {e}", slot.question))
                }
            },
            Msg::CommitEdit => {
                state.editing = None;
                Command::None
            }
            Msg::CancelEdit => {
                state.editing = None;
                Command::None
            }
            Msg::FileCursor(direction) => {
                let len = selected_slot(state)
                    .and_then(|slot| {
                        state
                            .store
                            .answer(&slot)
                            .and_then(AnswerValue::as_files)
                            .map(<[FileDescriptor]>::len)
                    })
                    .unwrap_or(0);
                if len == 0 {
                    state.file_cursor = 0;
                    return Command::None;
                }
                state.file_cursor = if direction < 0 {
                    state.file_cursor.saturating_sub(1)
                } else {
                    (state.file_cursor + 1).min(len - 1)
                };
                Command::None
            }
            Msg::UploadRequested => Self::update(state, Msg::StartEdit),
            Msg::PathSubmitted => {
                let Some(editing) = state.editing.take() else {
                    return Command::None;
                };
                let EditTarget::Path { slot } = editing.target else {
                    return Command::None;
                };
                let raw = editing.input.value().trim().to_string();
                if raw.is_empty() {
                    return Command::None;
                }

                let Some(filename) = Path::new(&raw)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                else {
                    return Command::error(format!("\"{raw}\" is not a file path."));
                };

                let kind = state
                    .store
                    .question(&slot)
                    .and_then(|q| q.accept)
                    .or_else(|| attachments::detect_kind(&filename));
                let Some(kind) = kind else {
                    return Command::error(format!("{filename}: unsupported file type."));
                };

                let size = match std::fs::metadata(&raw) {
                    Ok(meta) => meta.len(),
                    Err(e) => return Command::error(format!("Cannot read {raw}: {e}")),
                };

                // Local policy check; nothing is sent when this fails.
                if let Err(e) = attachments::check_upload(&filename, size, kind) {
                    return Command::error(e.to_string());
                }

                state.store.dispatch(StoreAction::SetFileLoading {
                    slot: slot.clone(),
                    loading: true,
                });

                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = async {
                            let bytes = tokio::fs::read(&raw)
                                .await
                                .map_err(|e| format!("cannot read {raw}: {e}"))?;
                            client
                                .upload_component_file(
                                    &project,
                                    &slot.component,
                                    &slot.question,
                                    FileUpload {
                                        filename,
                                        kind,
                                        bytes,
                                    },
                                )
                                .await
                                .map_err(|e| e.user_message().to_string())
                        }
                        .await;
                        Msg::UploadFinished { slot, result }
                    },
                    |msg| msg,
                )
            }
            Msg::UploadFinished { slot, result } => {
                if !state.store.is_file_loading(&slot) {
                    // The slot moved on without us; do not apply a stale list.
                    log::warn!("dropping stale upload response for {slot}");
                    return Command::None;
                }
                state.store.dispatch(StoreAction::SetFileLoading {
                    slot: slot.clone(),
                    loading: false,
                });
                match result {
                    Ok(files) => {
                        // The server list replaces local state wholesale.
                        state.store.dispatch(StoreAction::UpdateAnswer {
                            slot: slot.clone(),
                            value: AnswerValue::Files(files),
                        });
                        revalidate(state, &slot, true);
                        Command::success("File uploaded.")
                    }
                    Err(e) => Command::error(format!("Upload failed: {e}")),
                }
            }
            Msg::RemoveFileRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_edit(state.store.active_report()) {
                    return Command::info("This report is finalized; it can no longer be edited.");
                }
                let Some(slot) = selected_slot(state) else {
                    return Command::None;
                };
                let Some(files) = state.store.answer(&slot).and_then(AnswerValue::as_files)
                else {
                    return Command::None;
                };
                if files.is_empty() {
                    return Command::info("No file to remove here.");
                }
                if state.store.is_file_loading(&slot) {
                    return Command::info("An upload for this slot is still running.");
                }
                let descriptor = files[state.file_cursor.min(files.len() - 1)].clone();
                if let Err(e) = attachments::removal_identity(&descriptor) {
                    // Corrupted entry; the server cannot address it.
                    return Command::error(e.to_string());
                }

                state.store.dispatch(StoreAction::SetFileLoading {
                    slot: slot.clone(),
                    loading: true,
                });
                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = client
                            .remove_component_file(
                                &project,
                                &slot.component,
                                &slot.question,
                                &descriptor.filename,
                                &descriptor.path,
                            )
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::RemoveFinished { slot, result }
                    },
                    |msg| msg,
                )
            }
            Msg::RemoveFinished { slot, result } => {
                state.store.dispatch(StoreAction::SetFileLoading {
                    slot: slot.clone(),
                    loading: false,
                });
                match result {
                    Ok(files) => {
                        state.file_cursor = 0;
                        state.store.dispatch(StoreAction::UpdateAnswer {
                            slot: slot.clone(),
                            value: AnswerValue::Files(files),
                        });
                        revalidate(state, &slot, true);
                        Command::success("File removed.")
                    }
                    // No optimistic removal: on failure the list stays as-is.
                    Err(e) => Command::error(format!("Removal failed: {e}")),
                }
            }
            Msg::GenerateRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_generate(state.store.active_report()) {
                    return Command::info("This report is finalized; generation is disabled.");
                }
                let missing = generate::missing_required_attachments(&state.store);
                if !missing.is_empty() {
                    return Command::error(format!(
                        "Required files are missing for: {}.",
                        missing.join(", ")
                    ));
                }

                state.busy = Some(Busy::Generating);
                let project = state.project.clone();
                let store = state.store.clone();
                let client = crate::report_client();
                Command::batch(vec![
                    Command::info("Report generation started; this runs in the background."),
                    Command::perform(
                        async move { generate::run(client, &project, &store).await },
                        Msg::GenerateFinished,
                    ),
                ])
            }
            Msg::GenerateFinished(result) => {
                state.busy = None;
                match result {
                    Ok(outcome) => {
                        let mut commands: Vec<Command<Msg>> = outcome
                            .save_failures
                            .iter()
                            .map(|(component, error)| {
                                Command::error(format!("{component} could not be saved: {error}"))
                            })
                            .collect();
                        state
                            .store
                            .dispatch(StoreAction::SetActiveReport(Some(outcome.report)));
                        commands.push(Command::success("Report generated."));
                        Command::batch(commands)
                    }
                    Err(e) => Command::error(e.to_string()),
                }
            }
            Msg::ResetRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_reset(state.store.active_report()) {
                    return Command::info("Only a generated, unfinalized report can be reset.");
                }
                state.modal = Some(
                    ConfirmModal::new("Reset report")
                        .message(
                            "This clears the generated PDF but keeps every answer. Continue?",
                        )
                        .confirm_text("Reset")
                        .danger()
                        .on_confirm(Msg::ResetConfirmed)
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::ResetConfirmed => {
                state.modal = None;
                state.busy = Some(Busy::Resetting);
                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        client
                            .reset_active_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string())
                    },
                    Msg::ResetFinished,
                )
            }
            Msg::ResetFinished(result) => {
                state.busy = None;
                match result {
                    Ok(server_report) => {
                        let Some(mut current) = state.store.active_report().cloned() else {
                            return Command::error("No active report to reset.");
                        };
                        let outcome = lifecycle::apply_reset(&mut current, server_report);
                        state
                            .store
                            .dispatch(StoreAction::SetActiveReport(Some(current)));
                        match outcome {
                            lifecycle::ResetOutcome::Confirmed => {
                                Command::success("Report reset; answers were kept.")
                            }
                            lifecycle::ResetOutcome::Degraded => Command::warning(
                                "Reset applied locally, but the server did not send the updated report.",
                            ),
                        }
                    }
                    Err(e) => Command::error(format!("Reset failed: {e}")),
                }
            }
            Msg::FinalizeRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_finalize(state.store.active_report()) {
                    return Command::info("Generate the report before finalizing it.");
                }
                state.modal = Some(
                    ConfirmModal::new("Finalize report")
                        .message("Finalizing locks the report forever; no further edits. Continue?")
                        .confirm_text("Finalize")
                        .danger()
                        .on_confirm(Msg::FinalizeConfirmed)
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::FinalizeConfirmed => {
                state.modal = None;
                state.busy = Some(Busy::Finalizing);
                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        client
                            .finalize_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string())
                    },
                    Msg::FinalizeFinished,
                )
            }
            Msg::FinalizeFinished(result) => {
                state.busy = None;
                match result {
                    Ok(()) => Command::batch(vec![
                        Command::success("Report finalized."),
                        // Terminal state: leave the editor entirely.
                        Command::navigate(AppTarget::ProjectSelect),
                    ]),
                    Err(e) => Command::error(format!("Finalize failed: {e}")),
                }
            }
            Msg::DeleteRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                if !lifecycle::can_delete(state.store.active_report()) {
                    return Command::info("A finalized report cannot be deleted from here.");
                }
                state.modal = Some(
                    ConfirmModal::new("Delete report")
                        .message("Delete this report and its draft answers? This cannot be undone.")
                        .confirm_text("Delete")
                        .danger()
                        .on_confirm(Msg::DeleteConfirmed)
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::DeleteConfirmed => {
                state.modal = None;
                state.busy = Some(Busy::Deleting);
                let project = state.project.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        client
                            .delete_active_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string())
                    },
                    Msg::DeleteFinished,
                )
            }
            Msg::DeleteFinished(result) => {
                state.busy = None;
                match result {
                    Ok(()) => Command::batch(vec![
                        Command::success("Report deleted."),
                        Command::navigate(AppTarget::ProjectSelect),
                    ]),
                    Err(e) => Command::error(format!("Delete failed: {e}")),
                }
            }
            Msg::DownloadRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                let Some(report) = state.store.active_report() else {
                    return Command::None;
                };
                if !report.report_generated {
                    return Command::info("Generate the report before downloading it.");
                }
                state.busy = Some(Busy::Downloading);
                let project = state.project.clone();
                let report_id = report.report_id.clone();
                let file_name = report
                    .pdf_file_name
                    .clone()
                    .unwrap_or_else(|| lifecycle::fallback_download_name(&project));
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = async {
                            let bytes = client
                                .download_report(&project, &report_id)
                                .await
                                .map_err(|e| e.user_message().to_string())?;
                            let dir = dirs::download_dir()
                                .unwrap_or_else(|| std::path::PathBuf::from("."));
                            let path = dir.join(&file_name);
                            tokio::fs::write(&path, bytes)
                                .await
                                .map_err(|e| format!("could not write {}: {e}", path.display()))?;
                            Ok::<String, String>(path.display().to_string())
                        }
                        .await;
                        Msg::DownloadFinished(result)
                    },
                    |msg| msg,
                )
            }
            Msg::DownloadFinished(result) => {
                state.busy = None;
                match result {
                    Ok(path) => Command::success(format!("Report saved to {path}.")),
                    Err(e) => Command::error(format!("Download failed: {e}")),
                }
            }
            Msg::EmailRequested => {
                if state.busy.is_some() {
                    return Command::None;
                }
                let Some(report) = state.store.active_report() else {
                    return Command::None;
                };
                if !report.report_generated {
                    return Command::info("Generate the report before emailing it.");
                }
                let recipients = crate::global_config().notify.recipients.clone();
                if recipients.is_empty() {
                    return Command::warning(
                        "No recipients configured; set notify.recipients in the config file.",
                    );
                }
                state.modal = Some(
                    ConfirmModal::new("Send report")
                        .message(format!(
                            "Email the report to {} recipient(s)?",
                            recipients.len()
                        ))
                        .confirm_text("Send")
                        .on_confirm(Msg::EmailConfirmed)
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::EmailConfirmed => {
                state.modal = None;
                let Some(report) = state.store.active_report() else {
                    return Command::None;
                };
                state.busy = Some(Busy::Emailing);
                let project = state.project.clone();
                let report_id = report.report_id.clone();
                let recipients = crate::global_config().notify.recipients.clone();
                let client = crate::report_client();
                Command::perform(
                    async move {
                        client
                            .send_report_email(&project, &report_id, &recipients)
                            .await
                            .map_err(|e| e.user_message().to_string())
                    },
                    Msg::EmailFinished,
                )
            }
            Msg::EmailFinished(result) => {
                state.busy = None;
                match result {
                    Ok(()) => Command::success("Report sent by email."),
                    Err(e) => Command::error(format!("Email failed: {e}")),
                }
            }
            Msg::BackRequested => Command::navigate(AppTarget::ProjectSelect),
            Msg::ModalDismissed => {
                state.modal = None;
                Command::None
            }
        }
    }

    fn on_key(state: &mut State, key: KeyEvent) -> KeyResponse<Msg> {
        if let Some(modal) = &state.modal {
            // An open modal owns the keyboard.
            return match modal.handle_key(key) {
                Some(msg) => KeyResponse::Msg(msg),
                None => KeyResponse::Consumed,
            };
        }

        if let Some(editing) = &mut state.editing {
            return match key.code {
                KeyCode::Esc => KeyResponse::Msg(Msg::CancelEdit),
                KeyCode::Enter => KeyResponse::Msg(match editing.target {
                    EditTarget::Text { .. } => Msg::CommitEdit,
                    EditTarget::Path { .. } => Msg::PathSubmitted,
                }),
                _ => {
                    let changed = editing.input.handle_key(key);
                    match (&editing.target, changed) {
                        (EditTarget::Text { slot }, true) => KeyResponse::Msg(Msg::AnswerEdited {
                            slot: slot.clone(),
                            value: editing.input.value().to_string(),
                        }),
                        _ => KeyResponse::Consumed,
                    }
                }
            };
        }

        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home
            | KeyCode::End | KeyCode::Char('j') | KeyCode::Char('k') => {
                KeyResponse::Msg(Msg::Nav(key.code))
            }
            KeyCode::Left => KeyResponse::Msg(Msg::FileCursor(-1)),
            KeyCode::Right => KeyResponse::Msg(Msg::FileCursor(1)),
            _ => KeyResponse::Ignored,
        }
    }

    fn subscriptions(state: &State) -> Vec<Subscription<Msg>> {
        let mut subs = vec![
            Subscription::keyboard(KeyCode::Esc, "Back to projects", Msg::BackRequested),
            Subscription::keyboard(KeyCode::Enter, "Edit answer / attach file", Msg::StartEdit),
            Subscription::keyboard(KeyCode::Char('u'), "Upload file", Msg::UploadRequested),
            Subscription::keyboard(KeyCode::Char('x'), "Remove file", Msg::RemoveFileRequested),
            Subscription::keyboard(KeyCode::Char('g'), "Generate report", Msg::GenerateRequested),
            Subscription::keyboard(KeyCode::Char('n'), "Next component", Msg::JumpSection(1)),
            Subscription::keyboard(KeyCode::Char('p'), "Previous component", Msg::JumpSection(-1)),
        ];
        let report = state.store.active_report();
        if report.map(|r| r.report_generated).unwrap_or(false) {
            subs.push(Subscription::keyboard(
                KeyCode::Char('o'),
                "Download PDF",
                Msg::DownloadRequested,
            ));
            subs.push(Subscription::keyboard(
                KeyCode::Char('e'),
                "Send by email",
                Msg::EmailRequested,
            ));
        }
        if lifecycle::can_reset(report) {
            subs.push(Subscription::keyboard(
                KeyCode::Char('r'),
                "Reset report",
                Msg::ResetRequested,
            ));
        }
        if lifecycle::can_finalize(report) {
            subs.push(Subscription::keyboard(
                KeyCode::Char('f'),
                "Finalize report",
                Msg::FinalizeRequested,
            ));
        }
        subs.push(Subscription::ctrl_key(
            KeyCode::Char('d'),
            "Delete report",
            Msg::DeleteRequested,
        ));
        subs
    }

    fn view(state: &mut State, frame: &mut Frame, area: Rect, theme: &Theme) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(30)])
            .split(area);

        // Track the visible geometry before deriving the active section.
        let form_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(format!(" {} ", state.project));
        let form_area = form_block.inner(panes[1]);
        state.viewport_height = form_area.height;

        let heights = section_heights(state);
        let total: u16 = heights.iter().copied().sum();
        state.scroll = state.scroll.min(total.saturating_sub(1));
        state.active_section =
            section::active_section(&heights, state.scroll, form_area.height).unwrap_or(0);

        render_nav(state, frame, panes[0], theme);
        frame.render_widget(form_block, panes[1]);
        render_form(state, frame, form_area, theme);

        if let Some(editing) = &state.editing {
            render_input_bar(editing, frame, area, theme);
        }
        if let Some(modal) = &state.modal {
            modal.render(frame, area, theme);
        }
    }

    fn title() -> &'static str {
        "Investor Reports / Builder"
    }

    fn status(state: &State, theme: &Theme) -> Option<Line<'static>> {
        if let Some(busy) = state.busy {
            return Some(Line::from(Span::styled(
                format!(" {}", busy.label()),
                Style::default().fg(theme.warning),
            )));
        }
        let phase = state
            .store
            .active_report()
            .map(|r| lifecycle::ReportPhase::of(r).label())
            .unwrap_or("no report");
        let pending = state.autosave.pending_count();
        let saving = if pending > 0 {
            format!(" · saving {pending} field(s)…")
        } else {
            String::new()
        };
        Some(Line::from(Span::styled(
            format!(" {phase}{saving} · Enter edit · g generate · Esc back"),
            Style::default().fg(theme.text_muted),
        )))
    }

    fn can_exit(state: &State) -> Result<(), String> {
        if lifecycle::needs_exit_warning(state.store.active_report()) {
            Err("The generated report has not been finalized; you can keep editing it later."
                .to_string())
        } else {
            Ok(())
        }
    }
}

fn render_nav(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Components ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (i, component) in state.store.components().iter().enumerate() {
        let satisfied = state
            .store
            .entry(component)
            .map(|entry| {
                entry
                    .questions
                    .iter()
                    .filter(|q| q.required)
                    .all(|q| {
                        entry
                            .answers
                            .get(&q.id)
                            .map(|a| !a.is_empty())
                            .unwrap_or(false)
                    })
            })
            .unwrap_or(true);
        let marker = if satisfied { "●" } else { "○" };
        let style = if i == state.active_section {
            Style::default()
                .fg(theme.accent)
                .bg(theme.bg_surface)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_primary)
        };
        lines.push(Line::from(Span::styled(
            format!(" {marker} {component}"),
            style,
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_form(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
    if state.store.is_loading() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Loading report data…",
                Style::default().fg(theme.text_muted),
            ))),
            area,
        );
        return;
    }
    if let Some(error) = state.store.error() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("Error: {error}"),
                Style::default().fg(theme.error),
            ))),
            area,
        );
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut row_index = 0usize;

    for component in state.store.components() {
        let Some(entry) = state.store.entry(component) else {
            continue;
        };
        lines.push(Line::from(Span::styled(
            component.clone(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "─".repeat(area.width.max(8) as usize - 4),
            Style::default().fg(theme.border),
        )));

        for question in &entry.questions {
            let slot = SlotKey::new(component.clone(), question.id.clone());
            let selected = row_index == state.selected;
            row_index += 1;

            let mut label_spans = vec![Span::styled(
                if selected {
                    format!("▸ {}", question.text)
                } else {
                    format!("  {}", question.text)
                },
                if selected {
                    Style::default()
                        .fg(theme.text_primary)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text_primary)
                },
            )];
            if question.required {
                label_spans.push(Span::styled(" *", Style::default().fg(theme.error)));
            }
            if let Some(status) = state.field_status.get(&slot) {
                if status.saved {
                    label_spans.push(Span::styled(
                        "  saved",
                        Style::default().fg(theme.success),
                    ));
                }
            }
            if state.store.is_file_loading(&slot) {
                label_spans.push(Span::styled(
                    "  uploading…",
                    Style::default().fg(theme.warning),
                ));
            }
            lines.push(Line::from(label_spans));

            match state.store.answer(&slot) {
                Some(AnswerValue::Files(files)) if !files.is_empty() => {
                    for (i, file) in files.iter().enumerate() {
                        let cursor = selected && state.file_cursor == i;
                        let style = if cursor {
                            Style::default().fg(theme.accent).bg(theme.bg_surface)
                        } else {
                            Style::default().fg(theme.text_primary)
                        };
                        lines.push(Line::from(Span::styled(
                            format!("      {} {}", file.kind.label(), file.filename),
                            style,
                        )));
                    }
                }
                Some(AnswerValue::Files(_)) | None => {
                    lines.push(Line::from(Span::styled(
                        "      (no file, press Enter to upload)",
                        Style::default().fg(theme.text_muted),
                    )));
                }
                Some(AnswerValue::Text(text)) if text.is_empty() => {
                    let hint = question.placeholder.clone().unwrap_or_default();
                    lines.push(Line::from(Span::styled(
                        format!("      {hint}"),
                        Style::default().fg(theme.text_muted),
                    )));
                }
                Some(AnswerValue::Text(text)) => {
                    let display = match question.kind {
                        QuestionKind::Select => question
                            .options
                            .iter()
                            .find(|o| &o.value == text)
                            .map(|o| o.label.clone())
                            .unwrap_or_else(|| text.clone()),
                        _ => text.clone(),
                    };
                    lines.push(Line::from(Span::styled(
                        format!("      {display}"),
                        Style::default().fg(theme.text_primary),
                    )));
                }
            }

            if let Some(status) = state.field_status.get(&slot) {
                if !status.is_valid && !status.message.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", status.message),
                        Style::default().fg(theme.error),
                    )));
                }
            }
            lines.push(Line::from(""));
        }
    }

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(state.scroll as usize)
        .take(area.height as usize)
        .collect();
    frame.render_widget(Paragraph::new(visible), area);
}

fn render_input_bar(editing: &Editing, frame: &mut Frame, area: Rect, theme: &Theme) {
    let height = 3u16;
    let bar = Rect {
        x: area.x + 2,
        y: area.y + area.height.saturating_sub(height + 1),
        width: area.width.saturating_sub(4),
        height,
    };
    let (title, hint) = match &editing.target {
        EditTarget::Text { slot } => (format!(" {} ", slot), ""),
        EditTarget::Path { slot } => (format!(" {}: file path ", slot), " (path to a PDF/image)"),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);
    let inner = block.inner(bar);

    // Show a cursor marker at the edit position.
    let value = editing.input.value();
    let cursor = editing.input.cursor();
    let before: String = value.chars().take(cursor).collect();
    let after: String = value.chars().skip(cursor).collect();
    let line = Line::from(vec![
        Span::styled(before, Style::default().fg(theme.text_primary)),
        Span::styled("█", Style::default().fg(theme.accent)),
        Span::styled(after, Style::default().fg(theme.text_primary)),
        Span::styled(hint, Style::default().fg(theme.text_muted)),
    ]);

    frame.render_widget(Clear, bar);
    frame.render_widget(block, bar);
    frame.render_widget(Paragraph::new(line), inner);
}
