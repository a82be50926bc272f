//! Session tab list: pinned partition on top, split members marked

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use super::theme::{
    accent_primary, accent_success, accent_warning, bg_highlight, border_default, border_focused,
    text_faint, text_muted, text_primary,
};
use crate::core::SessionRow;
use crate::data::SessionMode;

/// Marker column shared with the workspace list
pub(crate) fn selection_marker(selected: bool) -> Span<'static> {
    if selected {
        Span::styled("[x] ", Style::default().fg(accent_primary()))
    } else {
        Span::raw("    ")
    }
}

pub(crate) fn unseen_marker(unseen: bool) -> Span<'static> {
    if unseen {
        Span::styled("• ", Style::default().fg(accent_warning()))
    } else {
        Span::raw("  ")
    }
}

fn session_line(row: &SessionRow) -> Line<'static> {
    let name_style = if row.active {
        Style::default()
            .fg(text_primary())
            .add_modifier(Modifier::BOLD)
    } else if row.focused {
        Style::default().fg(text_primary())
    } else {
        Style::default().fg(text_muted())
    };

    let mut spans = vec![
        selection_marker(row.selected),
        unseen_marker(row.unseen),
        Span::styled(if row.pinned { "⚲ " } else { "  " }, Style::default().fg(text_faint())),
        Span::styled(row.name.clone(), name_style),
    ];
    if row.mode == SessionMode::Plan {
        spans.push(Span::styled(" plan", Style::default().fg(accent_success())));
    }
    if row.in_split {
        spans.push(Span::styled(" ⧉", Style::default().fg(accent_primary())));
    }
    Line::from(spans)
}

/// Widget rendering the visible session rows
pub struct SessionList<'a> {
    rows: &'a [SessionRow],
    /// Leading rows of `rows` that are pinned
    pinned_rows: usize,
    cursor: Option<usize>,
    focused: bool,
    title: &'a str,
}

impl<'a> SessionList<'a> {
    pub fn new(rows: &'a [SessionRow], pinned_rows: usize) -> Self {
        Self {
            rows,
            pinned_rows: pinned_rows.min(rows.len()),
            cursor: None,
            focused: false,
            title: "Chats",
        }
    }

    pub fn cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    fn has_divider(&self) -> bool {
        self.pinned_rows > 0 && self.pinned_rows < self.rows.len()
    }

    /// List position of row `index`, counting the divider
    fn item_index(&self, index: usize) -> usize {
        if self.has_divider() && index >= self.pinned_rows {
            index + 1
        } else {
            index
        }
    }
}

impl Widget for SessionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            border_focused()
        } else {
            border_default()
        };
        let block = Block::default()
            .title(format!(" {} ({}) ", self.title, self.rows.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let mut items: Vec<ListItem> = Vec::with_capacity(self.rows.len() + 1);
        for (i, row) in self.rows.iter().enumerate() {
            if self.has_divider() && i == self.pinned_rows {
                let width = area.width.saturating_sub(2) as usize;
                items.push(ListItem::new(Line::styled(
                    "─".repeat(width),
                    Style::default().fg(text_faint()),
                )));
            }
            items.push(ListItem::new(session_line(row)));
        }

        let mut state = ListState::default();
        state.select(self.cursor.map(|c| self.item_index(c)));

        let highlight = if self.focused {
            Style::default().bg(bg_highlight())
        } else {
            Style::default()
        };
        let list = List::new(items).block(block).highlight_style(highlight);
        StatefulWidget::render(list, area, buf, &mut state);
    }
}
