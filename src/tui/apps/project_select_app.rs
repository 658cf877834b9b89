//! Project selection: list projects, inspect their reports, and open or
//! create the active report.
//!
//! Creating is guarded twice: the client checks for an existing active
//! report first, and a conflict response from the server lands in the same
//! "continue the existing report?" dialog instead of an error.

use crate::api::models::{ActiveReport, ProjectDetail};
use crate::api::{ApiError, ReportBackend};
use crate::report::lifecycle::ReportPhase;
use crate::tui::{
    App, AppTarget, Command, ConfirmModal, EditorParams, KeyResponse, ListState, Resource,
    Subscription, Theme,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

pub struct ProjectSelectApp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Projects,
    Reports,
}

pub struct State {
    projects: Resource<Vec<String>>,
    list: ListState,
    detail: Resource<ProjectDetail>,
    /// Project the detail pane was requested for; responses for any other
    /// project are stale and dropped.
    detail_for: Option<String>,
    reports_list: ListState,
    pane: Pane,
    modal: Option<ConfirmModal<Msg>>,
    busy: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            projects: Resource::NotAsked,
            list: ListState::with_selection(),
            detail: Resource::NotAsked,
            detail_for: None,
            reports_list: ListState::with_selection(),
            pane: Pane::Projects,
            modal: None,
            busy: false,
        }
    }
}

#[derive(Clone)]
pub enum Msg {
    ProjectsLoaded(Result<Vec<String>, String>),
    ProjectsNav(KeyCode),
    ReportsNav(KeyCode),
    PaneToggled,
    Refresh,
    DetailLoaded {
        project: String,
        result: Result<ProjectDetail, String>,
    },
    /// Enter on a project: open its active report or start a new one.
    ProjectChosen,
    ActiveChecked {
        project: String,
        result: Result<Option<ActiveReport>, String>,
    },
    CreateFinished {
        project: String,
        result: Result<ActiveReport, ApiError>,
    },
    /// Fetch the existing report after a conflict, then open it.
    FetchAndOpen {
        project: String,
    },
    OpenFetched {
        project: String,
        result: Result<Option<ActiveReport>, String>,
    },
    OpenEditor {
        project: String,
        report: ActiveReport,
    },
    DeleteActiveRequested,
    DeleteActiveConfirmed {
        project: String,
    },
    DeleteActiveFinished {
        project: String,
        result: Result<(), String>,
    },
    DeleteFinalizedRequested,
    DeleteFinalizedConfirmed {
        project: String,
        file_name: String,
    },
    DeleteFinalizedFinished {
        project: String,
        result: Result<(), String>,
    },
    ModalDismissed,
}

fn selected_project(state: &State) -> Option<String> {
    let projects = state.projects.to_option()?;
    projects.get(state.list.selected()?).cloned()
}

fn load_projects() -> Command<Msg> {
    let client = crate::report_client();
    Command::perform(
        async move {
            client
                .list_projects()
                .await
                .map_err(|e| e.user_message().to_string())
        },
        Msg::ProjectsLoaded,
    )
}

fn load_detail(state: &mut State) -> Command<Msg> {
    let Some(project) = selected_project(state) else {
        state.detail = Resource::NotAsked;
        state.detail_for = None;
        return Command::None;
    };
    if state.detail_for.as_deref() == Some(project.as_str()) {
        return Command::None;
    }
    state.detail = Resource::Loading;
    state.detail_for = Some(project.clone());
    state.reports_list = ListState::with_selection();

    let client = crate::report_client();
    Command::perform(
        async move {
            let result = client
                .project_detail(&project)
                .await
                .map_err(|e| e.user_message().to_string());
            Msg::DetailLoaded { project, result }
        },
        |msg| msg,
    )
}

fn refresh_detail(state: &mut State) -> Command<Msg> {
    state.detail_for = None;
    load_detail(state)
}

fn continue_modal(project: String, report: ActiveReport) -> ConfirmModal<Msg> {
    ConfirmModal::new("Active report exists")
        .message(format!(
            "\"{project}\" already has a report in progress. Continue editing it?"
        ))
        .confirm_text("Continue")
        .cancel_text("Not now")
        .on_confirm(Msg::OpenEditor { project, report })
        .on_cancel(Msg::ModalDismissed)
}

impl App for ProjectSelectApp {
    type State = State;
    type Msg = Msg;
    type Params = ();

    fn init(_params: ()) -> (State, Command<Msg>) {
        let mut state = State::default();
        state.projects = Resource::Loading;
        (state, load_projects())
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::ProjectsLoaded(result) => {
                match result {
                    Ok(projects) => {
                        let has_items = !projects.is_empty();
                        state.projects = Resource::Success(projects);
                        state.list = ListState::with_selection();
                        if has_items {
                            return load_detail(state);
                        }
                    }
                    Err(e) => {
                        log::error!("failed to load projects: {e}");
                        state.projects = Resource::Failure(e.clone());
                        return Command::error(format!("Could not load projects: {e}"));
                    }
                }
                Command::None
            }
            Msg::ProjectsNav(key) => {
                if let Resource::Success(projects) = &state.projects {
                    state.list.handle_key(key, projects.len(), 20);
                }
                load_detail(state)
            }
            Msg::ReportsNav(key) => {
                let len = state
                    .detail
                    .to_option()
                    .map(|d| d.reports.len())
                    .unwrap_or(0);
                state.reports_list.handle_key(key, len, 12);
                Command::None
            }
            Msg::PaneToggled => {
                state.pane = match state.pane {
                    Pane::Projects => Pane::Reports,
                    Pane::Reports => Pane::Projects,
                };
                Command::None
            }
            Msg::Refresh => {
                state.projects = Resource::Loading;
                state.detail = Resource::NotAsked;
                state.detail_for = None;
                load_projects()
            }
            Msg::DetailLoaded { project, result } => {
                if state.detail_for.as_deref() != Some(project.as_str()) {
                    log::debug!("dropping stale detail response for {project}");
                    return Command::None;
                }
                state.detail = Resource::from_result(result);
                Command::None
            }
            Msg::ProjectChosen => {
                if state.busy {
                    return Command::None;
                }
                let Some(project) = selected_project(state) else {
                    return Command::None;
                };
                state.busy = true;
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = client
                            .active_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::ActiveChecked { project, result }
                    },
                    |msg| msg,
                )
            }
            Msg::ActiveChecked { project, result } => match result {
                Ok(Some(report)) => {
                    state.busy = false;
                    state.modal = Some(continue_modal(project, report));
                    Command::None
                }
                Ok(None) => {
                    let client = crate::report_client();
                    Command::perform(
                        async move {
                            let result = client.create_report(&project).await;
                            Msg::CreateFinished { project, result }
                        },
                        |msg| msg,
                    )
                }
                Err(e) => {
                    state.busy = false;
                    Command::error(format!("Could not check the active report: {e}"))
                }
            },
            Msg::CreateFinished { project, result } => {
                state.busy = false;
                match result {
                    Ok(report) => Command::navigate(AppTarget::ReportEditor(EditorParams {
                        project,
                        report,
                    })),
                    Err(err) if err.is_conflict() => {
                        // Someone beat us to it; offer to continue that one.
                        state.modal = Some(
                            ConfirmModal::new("Active report exists")
                                .message(err.user_message().to_string())
                                .confirm_text("Continue existing")
                                .cancel_text("Not now")
                                .on_confirm(Msg::FetchAndOpen {
                                    project: project.clone(),
                                })
                                .on_cancel(Msg::ModalDismissed),
                        );
                        Command::None
                    }
                    Err(err) => Command::error(format!("Could not start a report: {err}")),
                }
            }
            Msg::FetchAndOpen { project } => {
                state.modal = None;
                state.busy = true;
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = client
                            .active_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::OpenFetched { project, result }
                    },
                    |msg| msg,
                )
            }
            Msg::OpenFetched { project, result } => {
                state.busy = false;
                match result {
                    Ok(Some(report)) => Command::navigate(AppTarget::ReportEditor(
                        EditorParams { project, report },
                    )),
                    Ok(None) => Command::warning("The active report is gone; refresh and retry."),
                    Err(e) => Command::error(format!("Could not open the report: {e}")),
                }
            }
            Msg::OpenEditor { project, report } => {
                state.modal = None;
                Command::navigate(AppTarget::ReportEditor(EditorParams { project, report }))
            }
            Msg::DeleteActiveRequested => {
                let Some(project) = selected_project(state) else {
                    return Command::None;
                };
                let has_active = state
                    .detail
                    .to_option()
                    .map(|d| d.active_report.is_some())
                    .unwrap_or(false);
                if !has_active {
                    return Command::info("This project has no active report.");
                }
                state.modal = Some(
                    ConfirmModal::new("Delete active report")
                        .message(format!(
                            "Delete the in-progress report of \"{project}\"? This cannot be undone."
                        ))
                        .confirm_text("Delete")
                        .danger()
                        .on_confirm(Msg::DeleteActiveConfirmed { project })
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::DeleteActiveConfirmed { project } => {
                state.modal = None;
                state.busy = true;
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = client
                            .delete_active_report(&project)
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::DeleteActiveFinished { project, result }
                    },
                    |msg| msg,
                )
            }
            Msg::DeleteActiveFinished { project, result } => {
                state.busy = false;
                match result {
                    Ok(()) => Command::batch(vec![
                        Command::success(format!("Deleted the active report of \"{project}\".")),
                        refresh_detail(state),
                    ]),
                    Err(e) => Command::error(format!("Could not delete the report: {e}")),
                }
            }
            Msg::DeleteFinalizedRequested => {
                let Some(project) = selected_project(state) else {
                    return Command::None;
                };
                let report = state
                    .detail
                    .to_option()
                    .and_then(|d| d.reports.get(state.reports_list.selected()?));
                let Some(report) = report else {
                    return Command::info("No finalized report selected.");
                };
                let file_name = report
                    .name
                    .clone()
                    .unwrap_or_else(|| report.report_id.clone());
                state.modal = Some(
                    ConfirmModal::new("Delete finalized report")
                        .message(format!(
                            "Delete \"{file_name}\" permanently? This cannot be undone."
                        ))
                        .confirm_text("Delete")
                        .danger()
                        .on_confirm(Msg::DeleteFinalizedConfirmed { project, file_name })
                        .on_cancel(Msg::ModalDismissed),
                );
                Command::None
            }
            Msg::DeleteFinalizedConfirmed { project, file_name } => {
                state.modal = None;
                state.busy = true;
                let client = crate::report_client();
                Command::perform(
                    async move {
                        let result = client
                            .delete_finalized_report(&project, &file_name)
                            .await
                            .map_err(|e| e.user_message().to_string());
                        Msg::DeleteFinalizedFinished { project, result }
                    },
                    |msg| msg,
                )
            }
            Msg::DeleteFinalizedFinished { project, result } => {
                state.busy = false;
                match result {
                    Ok(()) => Command::batch(vec![
                        Command::success(format!("Deleted a finalized report of \"{project}\".")),
                        refresh_detail(state),
                    ]),
                    Err(e) => Command::error(format!("Could not delete the report: {e}")),
                }
            }
            Msg::ModalDismissed => {
                state.modal = None;
                Command::None
            }
        }
    }

    fn on_key(state: &mut State, key: KeyEvent) -> KeyResponse<Msg> {
        if let Some(modal) = &state.modal {
            // While a modal is open it owns the keyboard.
            return match modal.handle_key(key) {
                Some(msg) => KeyResponse::Msg(msg),
                None => KeyResponse::Consumed,
            };
        }
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home
            | KeyCode::End | KeyCode::Char('j') | KeyCode::Char('k') => {
                KeyResponse::Msg(match state.pane {
                    Pane::Projects => Msg::ProjectsNav(key.code),
                    Pane::Reports => Msg::ReportsNav(key.code),
                })
            }
            KeyCode::Tab => KeyResponse::Msg(Msg::PaneToggled),
            _ => KeyResponse::Ignored,
        }
    }

    fn subscriptions(state: &State) -> Vec<Subscription<Msg>> {
        let mut subs = vec![
            Subscription::keyboard(KeyCode::Enter, "Open or create report", Msg::ProjectChosen),
            Subscription::keyboard(KeyCode::Char('r'), "Refresh", Msg::Refresh),
            Subscription::keyboard(
                KeyCode::Char('d'),
                "Delete active report",
                Msg::DeleteActiveRequested,
            ),
        ];
        if state.pane == Pane::Reports {
            subs.push(Subscription::keyboard(
                KeyCode::Char('x'),
                "Delete finalized report",
                Msg::DeleteFinalizedRequested,
            ));
        }
        subs
    }

    fn view(state: &mut State, frame: &mut Frame, area: Rect, theme: &Theme) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        render_projects(state, frame, panes[0], theme);
        render_detail(state, frame, panes[1], theme);

        if let Some(modal) = &state.modal {
            modal.render(frame, area, theme);
        }
    }

    fn title() -> &'static str {
        "Investor Reports / Projects"
    }

    fn status(state: &State, theme: &Theme) -> Option<Line<'static>> {
        if state.busy {
            return Some(Line::from(Span::styled(
                " working…",
                Style::default().fg(theme.warning),
            )));
        }
        Some(Line::from(Span::styled(
            " Enter open · d delete active · Tab reports · r refresh",
            Style::default().fg(theme.text_muted),
        )))
    }
}

fn pane_block<'a>(title: &'a str, focused: bool, theme: &Theme) -> Block<'a> {
    let border = if focused {
        theme.border_focused
    } else {
        theme.border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn render_projects(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = pane_block(" Projects ", state.pane == Pane::Projects, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = match &state.projects {
        Resource::NotAsked | Resource::Loading => {
            vec![Line::from(Span::styled(
                "Loading projects…",
                Style::default().fg(theme.text_muted),
            ))]
        }
        Resource::Failure(e) => vec![Line::from(Span::styled(
            format!("Error: {e}"),
            Style::default().fg(theme.error),
        ))],
        Resource::Success(projects) if projects.is_empty() => vec![Line::from(Span::styled(
            "No projects found.",
            Style::default().fg(theme.text_muted),
        ))],
        Resource::Success(projects) => {
            let visible = inner.height as usize;
            let offset = state.list.offset().min(projects.len());
            projects
                .iter()
                .enumerate()
                .skip(offset)
                .take(visible)
                .map(|(i, name)| {
                    if state.list.selected() == Some(i) {
                        Line::from(Span::styled(
                            format!("▸ {name}"),
                            Style::default()
                                .fg(theme.accent)
                                .bg(theme.bg_surface)
                                .add_modifier(Modifier::BOLD),
                        ))
                    } else {
                        Line::from(Span::styled(
                            format!("  {name}"),
                            Style::default().fg(theme.text_primary),
                        ))
                    }
                })
                .collect()
        }
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_detail(state: &State, frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = pane_block(" Reports ", state.pane == Pane::Reports, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    match &state.detail {
        Resource::NotAsked => {}
        Resource::Loading => lines.push(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(theme.text_muted),
        ))),
        Resource::Failure(e) => lines.push(Line::from(Span::styled(
            format!("Error: {e}"),
            Style::default().fg(theme.error),
        ))),
        Resource::Success(detail) => {
            match &detail.active_report {
                Some(report) => {
                    let phase = ReportPhase::of(report);
                    lines.push(Line::from(vec![
                        Span::styled("Active report: ", Style::default().fg(theme.text_muted)),
                        Span::styled(
                            phase.label().to_string(),
                            Style::default()
                                .fg(theme.accent)
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]));
                    if let Some(pdf) = &report.pdf_file_name {
                        lines.push(Line::from(Span::styled(
                            format!("  PDF: {pdf}"),
                            Style::default().fg(theme.text_primary),
                        )));
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    "No active report. Press Enter to start one.",
                    Style::default().fg(theme.text_muted),
                ))),
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Finalized reports ({})", detail.reports.len()),
                Style::default().fg(theme.text_muted),
            )));
            for (i, report) in detail.reports.iter().enumerate() {
                let name = report.name.clone().unwrap_or_else(|| report.report_id.clone());
                let date = report
                    .created_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let selected = state.pane == Pane::Reports
                    && state.reports_list.selected() == Some(i);
                let style = if selected {
                    Style::default().fg(theme.accent).bg(theme.bg_surface)
                } else {
                    Style::default().fg(theme.text_primary)
                };
                lines.push(Line::from(Span::styled(
                    format!("  {name}  {date}"),
                    style,
                )));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), inner);
}
