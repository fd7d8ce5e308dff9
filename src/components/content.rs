use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;

/// Renders pre-styled content lines: a file body window, a table page or
/// a decoded image. Lines beyond the area are clipped.
pub struct ContentWidget<'a> {
    lines: &'a [Line<'static>],
    theme: &'a ThemeColors,
    placeholder: Option<&'a str>,
    block: Option<Block<'a>>,
}

impl<'a> ContentWidget<'a> {
    pub fn new(lines: &'a [Line<'static>], theme: &'a ThemeColors) -> Self {
        Self {
            lines,
            theme,
            placeholder: None,
            block: None,
        }
    }

    /// Message shown when there are no lines.
    pub fn placeholder(mut self, message: &'a str) -> Self {
        self.placeholder = Some(message);
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for ContentWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Render block (border) first, get inner area
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.lines.is_empty() {
            let msg = self.placeholder.unwrap_or("(empty)");
            let line = Line::from(Span::styled(msg, Style::default().fg(self.theme.dim_fg)));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        for (i, line) in self.lines.iter().take(inner.height as usize).enumerate() {
            let y = inner.y + i as u16;
            buf.set_line(inner.x, y, line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::widgets::Borders;

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn test_empty_content_shows_placeholder() {
        let tc = theme::dark_theme();
        let widget = ContentWidget::new(&[], &tc)
            .placeholder("Loading…")
            .block(Block::default().borders(Borders::ALL).title(" notes.txt "));
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        assert!(row(&buf, 1, 30).contains("Loading…"));
        assert!(row(&buf, 0, 30).contains("notes.txt"));
    }

    #[test]
    fn test_lines_are_clipped_to_area() {
        let tc = theme::dark_theme();
        let lines: Vec<Line<'static>> = (0..10).map(|i| Line::from(format!("line {i}"))).collect();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        ContentWidget::new(&lines, &tc).render(area, &mut buf);
        assert!(row(&buf, 0, 20).starts_with("line 0"));
        assert!(row(&buf, 2, 20).starts_with("line 2"));
    }
}
