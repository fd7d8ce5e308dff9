use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use unicode_width::UnicodeWidthChar;

use crate::nav::pagination::sanitize;

const FALLBACK_THEME: &str = "base16-ocean.dark";
/// Drawn in place of a line whose bytes are not resident yet.
pub const PENDING_LINE: &str = "…";

/// Load a theme from the built-in theme set by name, with fallback.
pub fn load_theme(themes: &ThemeSet, name: &str) -> Theme {
    themes
        .themes
        .get(name)
        .or_else(|| themes.themes.get(FALLBACK_THEME))
        .cloned()
        .unwrap_or_default()
}

/// Convert syntect color to ratatui Color.
fn syntect_color_to_ratatui(c: syntect::highlighting::Color) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Syntax highlighter for the visible window of a text file.
///
/// Each draw highlights only the lines on screen, starting from a fresh
/// parse state at the first visible line.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
    theme: Theme,
    tab_width: usize,
}

impl Highlighter {
    pub fn new(theme_name: &str, tab_width: usize) -> Self {
        let themes = ThemeSet::load_defaults();
        let theme = load_theme(&themes, theme_name);
        Self {
            syntaxes: SyntaxSet::load_defaults_nonewlines(),
            themes,
            theme,
            tab_width: tab_width.max(1),
        }
    }

    pub fn set_theme(&mut self, name: &str) {
        self.theme = load_theme(&self.themes, name);
    }

    /// Style `lines`, numbering them from `first_line` (0-based). `total`
    /// sizes the line-number gutter. `None` entries are drawn as pending.
    pub fn highlight(
        &self,
        lines: &[Option<String>],
        first_line: usize,
        total: usize,
        syntax: Option<&str>,
        gutter: Color,
    ) -> Vec<Line<'static>> {
        let syntax = syntax
            .and_then(|name| self.syntaxes.find_syntax_by_name(name))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let line_num_width = total.max(1).to_string().len();

        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let mut spans: Vec<Span<'static>> = Vec::new();
                let num = format!("{:>width$} │ ", first_line + i + 1, width = line_num_width);
                spans.push(Span::styled(num, Style::default().fg(gutter)));

                let Some(raw) = line else {
                    spans.push(Span::styled(PENDING_LINE, Style::default().fg(gutter)));
                    return Line::from(spans);
                };
                let text = sanitize(&expand_tabs(raw, self.tab_width));
                match highlighter.highlight_line(&text, &self.syntaxes) {
                    Ok(ranges) => {
                        for (style, piece) in ranges {
                            let fg = syntect_color_to_ratatui(style.foreground);
                            spans.push(Span::styled(piece.to_string(), Style::default().fg(fg)));
                        }
                    }
                    Err(_) => spans.push(Span::raw(text)),
                }
                Line::from(spans)
            })
            .collect()
    }
}

/// Replace tabs with spaces up to the next tab stop, in display columns.
pub fn expand_tabs(text: &str, tab_width: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        if c == '\t' {
            let pad = tab_width - column % tab_width;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += c.width().unwrap_or(0);
        }
    }
    out
}
