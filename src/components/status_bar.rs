use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::nav::pagination::fit;
use crate::theme::ThemeColors;

/// Status bar widget: position info and key hints, or a status message.
pub struct StatusBarWidget<'a> {
    info: &'a str,
    hints: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    loading: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(info: &'a str, hints: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            info,
            hints,
            theme,
            status_message: None,
            is_error: false,
            loading: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let line = Line::from(Span::styled(fit(msg, width), style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [loading] [info] ... [key_hints]
        let loading = if self.loading { " ⟳ loading… " } else { "" };
        let hints = format!(" {} ", self.hints);
        let fixed = loading.width() + hints.width();
        let info_budget = width.saturating_sub(fixed);
        let info = fit(&format!(" {}", self.info), info_budget);

        let mut spans = Vec::new();
        if self.loading {
            spans.push(Span::styled(
                loading,
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled(info, Style::default().fg(self.theme.info_fg)));
        spans.push(Span::styled(
            hints,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        let line = Line::from(spans).style(
            Style::default()
                .bg(self.theme.status_bg)
                .fg(self.theme.status_fg),
        );
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
