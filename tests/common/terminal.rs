//! TUI testing utilities using Ratatui's TestBackend
//!
//! Renders widgets or the whole [`App`] to a test buffer and converts the
//! output to strings for assertions.

use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, widgets::Widget, Terminal};
use subchat::App;

pub fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(width, height)).expect("test backend never fails")
}

/// Render a single widget into a fresh buffer
pub fn render_widget(widget: impl Widget, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);
    buffer
}

/// Draw the whole app and return the screen as trimmed text
pub fn render_app(app: &App, width: u16, height: u16) -> String {
    let mut terminal = test_terminal(width, height);
    terminal.draw(|f| app.draw(f)).expect("draw app");
    screen_text(terminal.backend().buffer())
}

/// Rows of `area`, one string per row, exactly as drawn
pub fn region_rows(buffer: &Buffer, area: Rect) -> Vec<String> {
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .filter_map(|x| buffer.cell((x, y)).map(|c| c.symbol()))
                .collect()
        })
        .collect()
}

/// The whole buffer with trailing spaces removed from every row
pub fn screen_text(buffer: &Buffer) -> String {
    region_rows(buffer, buffer.area)
        .iter()
        .map(|row| row.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Index of the first screen line containing `text`
pub fn line_of(screen: &str, text: &str) -> Option<usize> {
    screen.lines().position(|line| line.contains(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::widgets::Paragraph;
    use subchat::core::{Toast, ToastQueue};
    use subchat::ui::components::ToastStack;

    #[test]
    fn test_region_rows_and_screen_text() {
        let buffer = render_widget(Paragraph::new("Line 1\nLine 2\nLine 3"), 20, 5);

        assert_eq!(region_rows(&buffer, Rect::new(0, 0, 6, 2)), ["Line 1", "Line 2"]);
        assert_eq!(screen_text(&buffer), "Line 1\nLine 2\nLine 3\n\n");
    }

    #[test]
    fn test_line_of() {
        let screen = "first\nsecond\nthird";
        assert_eq!(line_of(screen, "sec"), Some(1));
        assert_eq!(line_of(screen, "missing"), None);
    }

    #[test]
    fn test_toast_stack_renders_newest_lowest() {
        let now = std::time::Instant::now();
        let mut queue = ToastQueue::new(std::time::Duration::from_secs(3));
        queue.info("first", now);
        queue.error("second", now);
        let toasts: Vec<Toast> = queue.iter().cloned().collect();

        let screen = screen_text(&render_widget(ToastStack::new(&toasts), 60, 12));
        let first = line_of(&screen, "first").expect("first toast drawn");
        let second = line_of(&screen, "second").expect("second toast drawn");
        assert!(second > first);
    }
}
