//! App runtime: one frame loop that routes key events, executes commands,
//! drains async results, and draws.

use super::app::{App, KeyResponse};
use super::command::{AppTarget, Command, Notice, NoticeLevel};
use super::subscription::{KeyBinding, Subscription};
use super::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use std::io::Stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Why the runtime returned control to the caller.
pub enum RuntimeExit {
    Quit,
    Switch(AppTarget),
}

/// Drives a single app until it quits or navigates away.
pub struct Runtime<A: App> {
    state: A::State,
    msg_tx: mpsc::UnboundedSender<A::Msg>,
    msg_rx: mpsc::UnboundedReceiver<A::Msg>,
    toasts: Vec<(Notice, Instant)>,
    theme: Theme,
    exit: Option<RuntimeExit>,
    quit_warned: bool,
}

impl<A: App> Runtime<A> {
    pub fn new(params: A::Params) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (state, init_command) = A::init(params);

        let mut runtime = Self {
            state,
            msg_tx,
            msg_rx,
            toasts: Vec::new(),
            theme: Theme::default(),
            exit: None,
            quit_warned: false,
        };
        runtime.execute_command(init_command);
        runtime
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<RuntimeExit> {
        loop {
            let frame_start = Instant::now();

            // Process all pending events first for minimal input latency.
            while event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('q')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        self.request_quit();
                        continue;
                    }

                    // Focused inputs and modals get the key first.
                    match A::on_key(&mut self.state, key) {
                        KeyResponse::Msg(msg) => {
                            self.dispatch(msg);
                            continue;
                        }
                        KeyResponse::Consumed => continue,
                        KeyResponse::Ignored => {}
                    }

                    let matched = A::subscriptions(&self.state).into_iter().find_map(|sub| {
                        let Subscription::Keyboard { key: binding, msg, .. } = sub;
                        binding.matches(&key).then_some(msg)
                    });
                    if let Some(msg) = matched {
                        self.dispatch(msg);
                    }
                }
            }

            // Async command results arrive as messages.
            while let Ok(msg) = self.msg_rx.try_recv() {
                self.dispatch(msg);
            }

            let now = Instant::now();
            self.toasts
                .retain(|(notice, shown_at)| now.duration_since(*shown_at) < notice.ttl());

            if let Some(exit) = self.exit.take() {
                return Ok(exit);
            }

            terminal.draw(|frame| {
                let areas = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Min(1),
                        Constraint::Length(1),
                    ])
                    .split(frame.area());

                render_header::<A>(frame, areas[0], &self.theme);
                A::view(&mut self.state, frame, areas[1], &self.theme);
                render_status::<A>(&self.state, frame, areas[2], &self.theme);
                render_toasts(&self.toasts, frame, areas[1], &self.theme);
            })?;

            // Sleep for the remainder of the 16ms frame.
            if let Some(remaining) = Duration::from_millis(16).checked_sub(frame_start.elapsed()) {
                tokio::time::sleep(remaining).await;
            }
        }
    }

    fn dispatch(&mut self, msg: A::Msg) {
        let command = A::update(&mut self.state, msg);
        self.execute_command(command);
    }

    fn execute_command(&mut self, command: Command<A::Msg>) {
        match command {
            Command::None => {}
            Command::Batch(commands) => {
                for command in commands {
                    self.execute_command(command);
                }
            }
            Command::Perform(future) => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(future.await);
                });
            }
            Command::Navigate(target) => self.exit = Some(RuntimeExit::Switch(target)),
            Command::Notify(notice) => self.push_notice(notice),
            Command::Quit => self.exit = Some(RuntimeExit::Quit),
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        log::info!("notice [{:?}]: {}", notice.level, notice.text);
        self.toasts.push((notice, Instant::now()));
        // Keep the stack shallow; old entries expire anyway.
        if self.toasts.len() > 5 {
            self.toasts.remove(0);
        }
    }

    fn request_quit(&mut self) {
        match A::can_exit(&self.state) {
            Ok(()) => self.exit = Some(RuntimeExit::Quit),
            Err(warning) => {
                if self.quit_warned {
                    self.exit = Some(RuntimeExit::Quit);
                } else {
                    self.quit_warned = true;
                    self.push_notice(Notice {
                        level: NoticeLevel::Warning,
                        text: format!("{warning} Press Ctrl+q again to quit."),
                    });
                }
            }
        }
    }
}

fn render_header<A: App>(frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", A::title()),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Ctrl+q quits", Style::default().fg(theme.text_muted)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status<A: App>(state: &A::State, frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    let line = A::status(state, theme).unwrap_or_else(|| {
        // Fall back to a key-binding summary built from the subscriptions.
        let hints: Vec<String> = A::subscriptions(state)
            .into_iter()
            .map(|sub| {
                let Subscription::Keyboard { key, description, .. } = sub;
                format!("{} {}", key_label(&key), description)
            })
            .collect();
        Line::from(Span::styled(
            format!(" {}", hints.join(" · ")),
            Style::default().fg(theme.text_muted),
        ))
    });
    frame.render_widget(Paragraph::new(line), area);
}

fn key_label(binding: &KeyBinding) -> String {
    let base = match binding.code {
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Char(c) => c.to_string(),
        other => format!("{other:?}"),
    };
    if binding.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{base}")
    } else {
        base
    }
}

fn render_toasts(toasts: &[(Notice, Instant)], frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    if toasts.is_empty() {
        return;
    }

    let width = area.width.min(56);
    let x = area.x + area.width.saturating_sub(width);
    for (row, (notice, _)) in toasts.iter().rev().enumerate() {
        let y = area.y + area.height.saturating_sub(1 + row as u16);
        if y < area.y || row as u16 >= area.height {
            break;
        }
        let color = match notice.level {
            NoticeLevel::Info => theme.accent,
            NoticeLevel::Success => theme.success,
            NoticeLevel::Warning => theme.warning,
            NoticeLevel::Error => theme.error,
        };
        let toast_area = Rect {
            x,
            y,
            width,
            height: 1,
        };
        let mut text = notice.text.clone();
        let max = width.saturating_sub(2) as usize;
        if text.chars().count() > max {
            text = text.chars().take(max.saturating_sub(1)).collect::<String>() + "…";
        }
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {text} "),
                Style::default().fg(color).bg(theme.bg_surface),
            ))),
            toast_area,
        );
    }
}

/// Put the terminal into raw alternate-screen mode.
pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore the terminal. Called on every exit path, including errors.
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
