//! Workspace list pane

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use super::session_list::{selection_marker, unseen_marker};
use super::theme::{
    accent_primary, bg_highlight, border_default, border_focused, text_muted, text_primary,
};
use crate::core::WorkspaceRow;

fn workspace_line(row: &WorkspaceRow) -> Line<'static> {
    let name_style = if row.current {
        Style::default()
            .fg(text_primary())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(text_primary())
    };
    let mut spans = vec![
        selection_marker(row.selected),
        unseen_marker(row.unseen),
        Span::styled(row.name.clone(), name_style),
        Span::styled(format!(" {}", row.branch), Style::default().fg(text_muted())),
    ];
    if row.is_remote {
        spans.push(Span::styled(" remote", Style::default().fg(accent_primary())));
    }
    Line::from(spans)
}

pub struct WorkspaceList<'a> {
    rows: &'a [WorkspaceRow],
    cursor: Option<usize>,
    focused: bool,
}

impl<'a> WorkspaceList<'a> {
    pub fn new(rows: &'a [WorkspaceRow]) -> Self {
        Self {
            rows,
            cursor: None,
            focused: false,
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
}

impl Widget for WorkspaceList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            border_focused()
        } else {
            border_default()
        };
        let block = Block::default()
            .title(" Workspaces ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| ListItem::new(workspace_line(row)))
            .collect();

        let mut state = ListState::default();
        state.select(self.cursor);
        let highlight = if self.focused {
            Style::default().bg(bg_highlight())
        } else {
            Style::default()
        };
        StatefulWidget::render(
            List::new(items).block(block).highlight_style(highlight),
            area,
            buf,
            &mut state,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::WorkspaceId;

    #[test]
    fn test_workspace_line() {
        let row = WorkspaceRow {
            id: WorkspaceId::new(),
            name: "api".into(),
            branch: "feature/login".into(),
            is_remote: true,
            current: true,
            selected: false,
            unseen: true,
        };
        let text: String = workspace_line(&row)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(text, "    • api feature/login remote");
    }
}
