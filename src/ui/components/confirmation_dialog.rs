//! Blocking yes/no dialog for confirmations raised by the hub

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::dialog::DialogFrame;
use super::key_hints::{render_key_hints, KeyHintBarStyle};
use super::theme::{accent_error, bg_highlight, text_muted, text_primary};
use crate::core::Confirmation;

/// Which button has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmChoice {
    Yes,
    #[default]
    No,
}

impl ConfirmChoice {
    pub fn toggled(self) -> Self {
        match self {
            ConfirmChoice::Yes => ConfirmChoice::No,
            ConfirmChoice::No => ConfirmChoice::Yes,
        }
    }
}

pub struct ConfirmationDialog<'a> {
    confirmation: &'a Confirmation,
    choice: ConfirmChoice,
    hints: &'a [(String, &'a str)],
}

impl<'a> ConfirmationDialog<'a> {
    pub fn new(confirmation: &'a Confirmation, choice: ConfirmChoice) -> Self {
        Self {
            confirmation,
            choice,
            hints: &[],
        }
    }

    pub fn hints(mut self, hints: &'a [(String, &'a str)]) -> Self {
        self.hints = hints;
        self
    }

    fn text(&self) -> (&'static str, String) {
        match self.confirmation {
            Confirmation::ArchiveWorkspace { name, .. } => (
                "Archive workspace",
                format!("This is the last open chat. Archive workspace \"{name}\"?"),
            ),
        }
    }

    fn buttons(&self) -> Line<'static> {
        let button = |label: &'static str, active: bool| {
            let style = if active {
                Style::default()
                    .fg(text_primary())
                    .bg(bg_highlight())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(text_muted())
            };
            Span::styled(format!("  {label}  "), style)
        };
        Line::from(vec![
            button("Archive", self.choice == ConfirmChoice::Yes),
            Span::raw("   "),
            button("Cancel", self.choice == ConfirmChoice::No),
        ])
        .alignment(Alignment::Center)
    }
}

impl Widget for ConfirmationDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, message) = self.text();
        let inner = DialogFrame::new(title, 56, 9)
            .border_color(accent_error())
            .render(area, buf);

        let [body, _, buttons, hints] = Layout::vertical([
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(message)
            .style(Style::default().fg(text_primary()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);
        Paragraph::new(self.buttons()).render(buttons, buf);
        render_key_hints(hints, buf, self.hints, KeyHintBarStyle::instruction_bar());
    }
}
