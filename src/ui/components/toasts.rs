//! Stacked notifications in the bottom-right corner

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use super::theme::{accent_error, accent_primary, bg_elevated, text_primary};
use crate::core::{Toast, ToastKind};

const MAX_WIDTH: u16 = 48;

pub struct ToastStack<'a> {
    toasts: &'a [Toast],
}

impl<'a> ToastStack<'a> {
    pub fn new(toasts: &'a [Toast]) -> Self {
        Self { toasts }
    }
}

impl Widget for ToastStack<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut bottom = area.y + area.height;
        // Newest toast sits lowest
        for toast in self.toasts.iter().rev() {
            if bottom < area.y + 3 {
                break;
            }
            let width = (toast.message.width() as u16 + 4)
                .min(MAX_WIDTH)
                .min(area.width);
            let rect = Rect {
                x: area.x + area.width - width,
                y: bottom - 3,
                width,
                height: 3,
            };
            let color = match toast.kind {
                ToastKind::Info => accent_primary(),
                ToastKind::Error => accent_error(),
            };
            Clear.render(rect, buf);
            Paragraph::new(toast.message.as_str())
                .style(Style::default().fg(text_primary()).bg(bg_elevated()))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                )
                .render(rect, buf);
            bottom -= 3;
        }
    }
}
