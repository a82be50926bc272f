//! Single-line text entry used by the list filter and chat rename

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Text typed so far; editing happens at the end of the line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInputState {
    input: String,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            input: value.to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    pub fn value(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.input.pop();
    }

    /// Render `prompt` followed by the text (or `placeholder` when empty)
    pub fn render_with_placeholder(
        &self,
        area: Rect,
        buf: &mut Buffer,
        prompt: &str,
        style: Style,
        placeholder: &str,
        placeholder_style: Style,
    ) {
        let body = if self.input.is_empty() {
            Span::styled(placeholder.to_string(), placeholder_style)
        } else {
            Span::styled(self.input.clone(), style)
        };
        Paragraph::new(Line::from(vec![Span::styled(prompt.to_string(), style), body]))
            .render(area, buf);

        if area.width == 0 || area.height == 0 {
            return;
        }
        let offset = (prompt.width() + self.input.width()) as u16;
        let cursor_x = area.x + offset.min(area.width.saturating_sub(1));
        buf[(cursor_x, area.y)].set_style(Style::default().add_modifier(Modifier::REVERSED));
    }
}

impl std::fmt::Display for TextInputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_handles_multibyte_characters() {
        let mut input = TextInputState::with_value("caf");
        input.insert_char('é');
        assert_eq!(input.value(), "café");
        input.delete_char();
        input.delete_char();
        assert_eq!(input.value(), "ca");
        input.clear();
        assert!(input.is_empty());
    }

    #[test]
    fn test_placeholder_shown_when_empty() {
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        TextInputState::new().render_with_placeholder(
            area,
            &mut buf,
            "/",
            Style::default(),
            "filter",
            Style::default(),
        );
        let text: String = (0..20)
            .filter_map(|x| buf.cell((x, 0)).map(|c| c.symbol().to_string()))
            .collect();
        assert_eq!(text.trim_end(), "/filter");
    }
}
