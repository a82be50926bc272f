use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Paragraph, Widget},
};

use super::key_hints::{hints_for, render_key_hints, KeyHintBarStyle};
use super::theme::{accent_warning, footer_bg, key_hint_bg};
use crate::config::{KeyContext, KeybindingConfig};
use crate::input::{Action, InputMode};

/// Footer showing the keys that work in the current input mode
pub struct GlobalFooter {
    hints: Vec<(String, &'static str)>,
    undo_count: usize,
}

impl GlobalFooter {
    pub fn from_state(bindings: &KeybindingConfig, mode: InputMode, undo_count: usize) -> Self {
        let context = KeyContext::from_input_mode(mode);
        Self {
            hints: hints_for(bindings, context, Self::actions(mode)),
            undo_count,
        }
    }

    fn actions(mode: InputMode) -> &'static [(Action, &'static str)] {
        match mode {
            InputMode::Normal => &[
                (Action::Open, "open"),
                (Action::NewSession, "new"),
                (Action::Archive, "archive"),
                (Action::Undo, "undo"),
                (Action::TogglePin, "pin"),
                (Action::AddToSplit, "split"),
                (Action::Rename, "rename"),
                (Action::ToggleMode, "mode"),
                (Action::QuickSwitchPrimary, "switch"),
                (Action::Quit, "quit"),
            ],
            InputMode::Searching => &[(Action::Submit, "keep filter"), (Action::Cancel, "clear")],
            InputMode::Renaming => &[(Action::Submit, "save"), (Action::Cancel, "cancel")],
            InputMode::Confirming => &[
                (Action::ConfirmYes, "archive"),
                (Action::ConfirmNo, "cancel"),
                (Action::ConfirmToggle, "toggle"),
            ],
            InputMode::QuickSwitching => &[(Action::Open, "switch"), (Action::Cancel, "cancel")],
        }
    }

    pub fn hints(&self) -> &[(String, &'static str)] {
        &self.hints
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let label = match self.undo_count {
            0 => String::new(),
            1 => " 1 undoable ".to_string(),
            n => format!(" {n} undoable "),
        };
        let [hints_area, undo_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(label.len() as u16)])
                .areas(area);
        render_key_hints(
            hints_area,
            buf,
            &self.hints,
            KeyHintBarStyle::footer_bar(key_hint_bg(), footer_bg()),
        );
        Paragraph::new(Line::from(label))
            .style(Style::default().fg(accent_warning()).bg(footer_bg()))
            .render(undo_area, buf);
    }
}
