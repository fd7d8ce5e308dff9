use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// One-line search prompt shown in place of the status bar while typing.
pub struct SearchBarWidget<'a> {
    query: &'a str,
    matches: usize,
    total: usize,
    theme: &'a ThemeColors,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(query: &'a str, matches: usize, total: usize, theme: &'a ThemeColors) -> Self {
        Self {
            query,
            matches,
            total,
            theme,
        }
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let prompt_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let cursor_style = Style::default()
            .bg(self.theme.status_fg)
            .fg(self.theme.status_bg);
        let count = format!("  {}/{} ", self.matches, self.total);

        let line = Line::from(vec![
            Span::styled("/", prompt_style),
            Span::styled(self.query, Style::default().fg(self.theme.status_fg)),
            Span::styled(" ", cursor_style),
            Span::styled(count, Style::default().fg(self.theme.dim_fg)),
        ])
        .style(Style::default().bg(self.theme.status_bg));
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
