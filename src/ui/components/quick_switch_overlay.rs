//! Overlay listing the frozen quick-switch candidates while the chord is held

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::dialog::DialogFrame;
use super::theme::{accent_primary, bg_highlight, text_muted, text_primary};
use crate::core::QuickSwitchView;
use crate::quick_switch::{QuickSwitchState, SwitchTarget};

const OVERLAY_WIDTH: u16 = 44;

pub struct QuickSwitchOverlay<'a> {
    view: &'a QuickSwitchView,
}

impl<'a> QuickSwitchOverlay<'a> {
    pub fn new(view: &'a QuickSwitchView) -> Self {
        Self { view }
    }

    /// Only an open gesture is drawn; a held chord below the delay is invisible
    pub fn is_visible(&self) -> bool {
        self.view.state == QuickSwitchState::Open
    }

    fn title(&self) -> &'static str {
        match self.view.target {
            SwitchTarget::Workspaces => "Switch workspace",
            SwitchTarget::Sessions => "Switch chat",
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        self.view
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if Some(i) == self.view.selected {
                    Line::from(vec![
                        Span::styled("› ", Style::default().fg(accent_primary())),
                        Span::styled(
                            item.clone(),
                            Style::default()
                                .fg(text_primary())
                                .add_modifier(Modifier::BOLD),
                        ),
                    ])
                    .style(Style::default().bg(bg_highlight()))
                } else {
                    Line::from(vec![
                        Span::raw("  "),
                        Span::styled(item.clone(), Style::default().fg(text_muted())),
                    ])
                }
            })
            .collect()
    }
}

impl Widget for QuickSwitchOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.is_visible() {
            return;
        }
        let height = self.view.items.len() as u16 + 2;
        let inner = DialogFrame::new(self.title(), OVERLAY_WIDTH, height)
            .border_color(accent_primary())
            .render(area, buf);
        Paragraph::new(self.lines()).render(inner, buf);
    }
}
