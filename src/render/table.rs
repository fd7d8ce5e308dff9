use std::ops::Range;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

use crate::nav::model::TableSchema;
use crate::nav::pagination::{
    column_widths, layout_header, layout_line, layout_row, PageWindow, PLACEHOLDER,
};

/// Header plus one line per row in `window`. Rows outside the resident page
/// are drawn as placeholders.
pub struct TableLines {
    pub header: Line<'static>,
    pub rows: Vec<Line<'static>>,
}

/// Columns come from the resident page, or from the schema before the
/// first page lands.
pub fn lines(
    page: &PageWindow,
    schema: &TableSchema,
    window: Range<usize>,
    max_column_width: usize,
    fg: Color,
    dim: Color,
) -> TableLines {
    let columns = if page.columns().is_empty() {
        schema.columns.as_slice()
    } else {
        page.columns()
    };
    let visible = window.clone().filter_map(|i| page.row(i));
    let widths = column_widths(columns, visible, max_column_width);

    let header = Line::styled(
        layout_header(columns, &widths),
        Style::default().fg(fg).add_modifier(Modifier::BOLD),
    );
    let placeholder: Vec<String> = widths
        .iter()
        .map(|&w| PLACEHOLDER.to_string().repeat(w.min(3)))
        .collect();
    let rows = window
        .map(|i| match page.row(i) {
            Some(row) => Line::styled(layout_row(row, &widths), Style::default().fg(fg)),
            None => Line::styled(layout_line(&placeholder, &widths), Style::default().fg(dim)),
        })
        .collect();
    TableLines { header, rows }
}
