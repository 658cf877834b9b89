//! Confirmation modal for destructive and irreversible actions.

use super::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Builder for confirmation modals.
///
/// ```ignore
/// let modal = ConfirmModal::new("Finalize report?")
///     .message("This cannot be undone.")
///     .confirm_text("Finalize")
///     .danger()
///     .on_confirm(Msg::FinalizeConfirmed)
///     .on_cancel(Msg::ModalDismissed);
/// ```
pub struct ConfirmModal<Msg> {
    title: String,
    message: String,
    confirm_text: String,
    cancel_text: String,
    on_confirm: Option<Msg>,
    on_cancel: Option<Msg>,
    danger: bool,
}

impl<Msg: Clone> ConfirmModal<Msg> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: String::new(),
            confirm_text: "Confirm".to_string(),
            cancel_text: "Cancel".to_string(),
            on_confirm: None,
            on_cancel: None,
            danger: false,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    pub fn cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    pub fn on_confirm(mut self, msg: Msg) -> Self {
        self.on_confirm = Some(msg);
        self
    }

    pub fn on_cancel(mut self, msg: Msg) -> Self {
        self.on_cancel = Some(msg);
        self
    }

    /// Render the confirm action in the error color.
    pub fn danger(mut self) -> Self {
        self.danger = true;
        self
    }

    /// Map a key press to the confirm or cancel message.
    pub fn handle_key(&self, key: KeyEvent) -> Option<Msg> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => self.on_confirm.clone(),
            KeyCode::Esc | KeyCode::Char('n') => self.on_cancel.clone(),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let width = area.width.min(60).max(30);
        let height = 7u16;
        let modal_area = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height: height.min(area.height),
        };

        let confirm_style = if self.danger {
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
        };

        let lines = vec![
            Line::from(Span::styled(
                self.message.clone(),
                Style::default().fg(theme.text_primary),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(format!("[y] {}", self.confirm_text), confirm_style),
                Span::raw("    "),
                Span::styled(
                    format!("[n] {}", self.cancel_text),
                    Style::default().fg(theme.text_muted),
                ),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_focused))
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ));

        frame.render_widget(Clear, modal_area);
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
            modal_area,
        );
    }
}
