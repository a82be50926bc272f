//! Key hint bars built from the live keybindings.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::theme::{accent_primary, text_faint, text_muted, text_secondary};
use crate::config::{KeyContext, KeybindingConfig};
use crate::input::Action;

/// Look of a hint bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHintBarStyle {
    /// Centered `key label │ key label` under a dialog
    Instruction,
    /// Left-aligned keys drawn as chips on a filled footer
    Footer { key_bg: Color, background: Color },
}

impl KeyHintBarStyle {
    pub fn instruction_bar() -> Self {
        Self::Instruction
    }

    pub fn footer_bar(key_bg: Color, background: Color) -> Self {
        Self::Footer { key_bg, background }
    }

    fn key_span(&self, key: &str) -> Span<'static> {
        match self {
            Self::Instruction => Span::styled(key.to_string(), Style::default().fg(accent_primary())),
            Self::Footer { key_bg, .. } => Span::styled(
                format!(" {key} "),
                Style::default().fg(text_secondary()).bg(*key_bg),
            ),
        }
    }

    fn label_style(&self) -> Style {
        match self {
            Self::Instruction => Style::default().fg(text_secondary()),
            Self::Footer { .. } => Style::default().fg(text_muted()),
        }
    }

    fn gap(&self) -> Span<'static> {
        match self {
            Self::Instruction => Span::styled(" │ ", Style::default().fg(text_faint())),
            Self::Footer { .. } => Span::raw("  "),
        }
    }
}

/// `(key, label)` pairs for the actions that have a key in `context`
///
/// Actions without a binding are left out so hints never lie about keys.
pub fn hints_for(
    bindings: &KeybindingConfig,
    context: KeyContext,
    actions: &[(Action, &'static str)],
) -> Vec<(String, &'static str)> {
    actions
        .iter()
        .filter_map(|(action, label)| {
            bindings
                .key_for(*action, context)
                .map(|combo| (combo.to_string(), *label))
        })
        .collect()
}

pub fn hint_line(hints: &[(String, &str)], style: KeyHintBarStyle) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (key, label) in hints {
        if !spans.is_empty() {
            spans.push(style.gap());
        }
        spans.push(style.key_span(key));
        spans.push(Span::styled(format!(" {label}"), style.label_style()));
    }
    Line::from(spans)
}

pub fn render_key_hints(area: Rect, buf: &mut Buffer, hints: &[(String, &str)], style: KeyHintBarStyle) {
    let line = hint_line(hints, style);
    match style {
        KeyHintBarStyle::Instruction => Paragraph::new(line).alignment(Alignment::Center),
        KeyHintBarStyle::Footer { background, .. } => {
            Paragraph::new(line).style(Style::default().bg(background))
        }
    }
    .render(area, buf);
}
