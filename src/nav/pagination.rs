//! Row-offset windows over database tables and display-width aware cell
//! layout.

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::nav::model::{ColumnInfo, Field, Row};

/// Substituted for control characters and undecodable bytes in cells.
pub const PLACEHOLDER: char = '·';
const ELLIPSIS: char = '…';
/// Between two columns.
pub const COLUMN_SEPARATOR: &str = " │ ";

/// One fetched window of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub table_name: String,
    pub row_offset: usize,
    pub page_size: usize,
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnInfo>,
}

impl TablePage {
    /// Rows covered by this page.
    pub fn span(&self) -> Range<usize> {
        self.row_offset..self.row_offset + self.rows.len()
    }
}

/// A page fetch the caller must issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

/// Tracks which page of a table is resident and which one is on its way.
///
/// The resident page keeps rendering until its replacement arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow {
    pub total_rows: usize,
    pub page_size: usize,
    pub page: Option<TablePage>,
    pub pending: Option<PageRequest>,
}

impl PageWindow {
    pub fn new(total_rows: usize, page_size: usize) -> Self {
        Self {
            total_rows,
            page_size: page_size.max(1),
            page: None,
            pending: None,
        }
    }

    /// Request for the page covering `window`, unless it is resident or
    /// already pending.
    pub fn ensure_visible(&mut self, window: Range<usize>) -> Option<PageRequest> {
        let end = window.end.min(self.total_rows);
        if window.start >= end || self.covers(window.start..end) {
            return None;
        }
        // A window taller than a page is fetched whole.
        let limit = self.page_size.max(end - window.start);
        // Half-page steps keep a window smaller than half a page inside
        // a single fetch.
        let step = (self.page_size / 2).max(1);
        let mut offset = window.start / step * step;
        if offset + limit < end {
            offset = window.start;
        }
        // A fetch at this offset is on its way; the next sync widens it if
        // the window grew meanwhile.
        if self.pending.is_some_and(|p| p.offset == offset) {
            return None;
        }
        // A short page at the same offset is the end of the table.
        if let Some(page) = &self.page {
            if page.row_offset == offset && page.page_size >= limit {
                return None;
            }
        }
        let request = PageRequest { offset, limit };
        self.pending = Some(request);
        Some(request)
    }

    /// Install a fetched page. Only the pending offset is accepted.
    pub fn accept(&mut self, mut page: TablePage) -> bool {
        let Some(request) = self.pending.filter(|p| p.offset == page.row_offset) else {
            return false;
        };
        self.pending = None;
        page.page_size = request.limit;
        self.page = Some(page);
        true
    }

    /// Forget a failed fetch so it can be retried.
    pub fn abandon(&mut self, offset: usize) {
        if self.pending.is_some_and(|p| p.offset == offset) {
            self.pending = None;
        }
    }

    pub fn covers(&self, range: Range<usize>) -> bool {
        match &self.page {
            Some(page) => {
                let span = page.span();
                span.start <= range.start && range.end <= span.end
            }
            None => false,
        }
    }

    /// Row at absolute `index`, if resident.
    pub fn row(&self, index: usize) -> Option<&Row> {
        let page = self.page.as_ref()?;
        index
            .checked_sub(page.row_offset)
            .and_then(|i| page.rows.get(i))
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        self.page.as_ref().map(|p| p.columns.as_slice()).unwrap_or(&[])
    }
}

/// Text of a field with every non-printable character replaced.
pub fn cell_text(field: &Field) -> String {
    sanitize(&field.to_string())
}

pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() || c == char::REPLACEMENT_CHARACTER || c.width().is_none() {
                PLACEHOLDER
            } else {
                c
            }
        })
        .collect()
}

/// Truncate or right-pad `text` to exactly `width` display columns.
pub fn fit(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width <= width {
        let mut out = String::with_capacity(text.len() + width - text_width);
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(width - text_width));
        return out;
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push(ELLIPSIS);
    used += 1;
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Column widths from headers and the given rows, capped at `max_width`.
pub fn column_widths<'a, I>(columns: &[ColumnInfo], rows: I, max_width: usize) -> Vec<usize>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut widths: Vec<usize> = columns.iter().map(|c| sanitize(&c.name).width()).collect();
    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell_text(field).width());
            }
        }
    }
    widths
        .into_iter()
        .map(|w| w.clamp(1, max_width.max(1)))
        .collect()
}

/// One aligned line of cells.
pub fn layout_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, &w)| fit(cells.get(i).map(AsRef::as_ref).unwrap_or(""), w))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

/// Header line for `columns`.
pub fn layout_header(columns: &[ColumnInfo], widths: &[usize]) -> String {
    let names: Vec<String> = columns.iter().map(|c| sanitize(&c.name)).collect();
    layout_line(&names, widths)
}

/// Aligned line for `row`.
pub fn layout_row(row: &Row, widths: &[usize]) -> String {
    let cells: Vec<String> = row.iter().map(cell_text).collect();
    layout_line(&cells, widths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(offset: usize, rows: usize) -> TablePage {
        TablePage {
            table_name: "events".into(),
            row_offset: offset,
            page_size: 50,
            rows: (offset..offset + rows)
                .map(|i| vec![Field::Integer(i as i64)])
                .collect(),
            columns: vec![ColumnInfo {
                name: "id".into(),
                decl_type: "INTEGER".into(),
            }],
        }
    }

    #[test]
    fn first_window_requests_first_page() {
        let mut window = PageWindow::new(10_000, 50);
        assert_eq!(
            window.ensure_visible(0..20),
            Some(PageRequest {
                offset: 0,
                limit: 50
            })
        );
        // Pending: not requested again.
        assert_eq!(window.ensure_visible(0..20), None);
    }

    #[test]
    fn resident_page_is_not_refetched() {
        let mut window = PageWindow::new(10_000, 50);
        window.ensure_visible(0..20);
        assert!(window.accept(page(0, 50)));
        assert_eq!(window.ensure_visible(10..30), None);
    }

    #[test]
    fn scrolling_past_page_requests_next_window() {
        let mut window = PageWindow::new(10_000, 50);
        window.ensure_visible(0..20);
        window.accept(page(0, 50));
        let req = window.ensure_visible(40..60);
        assert_eq!(req.map(|r| r.offset), Some(25));
        // Old page stays visible while the new one loads.
        assert!(window.row(10).is_some());
    }

    #[test]
    fn tail_page_is_short() {
        let mut window = PageWindow::new(10_000, 50);
        let req = window.ensure_visible(9_980..10_000);
        assert_eq!(req.map(|r| r.offset), Some(9_975));
        assert!(window.accept(page(9_975, 25)));
        assert!(window.row(9_999).is_some());
        assert!(window.row(10_000).is_none());
        assert!(window.page.as_ref().is_some_and(|p| p.rows.len() <= p.page_size));
    }

    #[test]
    fn stale_page_is_rejected() {
        let mut window = PageWindow::new(10_000, 50);
        window.ensure_visible(0..20);
        window.ensure_visible(500..520);
        assert!(!window.accept(page(0, 50)));
        assert!(window.accept(page(500, 50)));
    }

    #[test]
    fn window_taller_than_page_is_fetched_whole() {
        let mut window = PageWindow::new(10_000, 20);
        assert_eq!(
            window.ensure_visible(0..36),
            Some(PageRequest {
                offset: 0,
                limit: 36
            })
        );
        assert!(window.accept(page(0, 36)));
        assert!(window.row(35).is_some());
        assert_eq!(window.ensure_visible(0..36), None);
    }

    #[test]
    fn grown_window_refetches_resident_offset() {
        let mut window = PageWindow::new(10_000, 20);
        window.ensure_visible(0..10);
        assert!(window.accept(page(0, 20)));
        let req = window.ensure_visible(0..36);
        assert_eq!(
            req,
            Some(PageRequest {
                offset: 0,
                limit: 36
            })
        );
    }

    #[test]
    fn short_page_at_table_end_is_final() {
        // The table shrank below its listed row count.
        let mut window = PageWindow::new(100, 50);
        window.ensure_visible(0..30);
        assert!(window.accept(page(0, 10)));
        assert_eq!(window.ensure_visible(0..30), None);
    }

    #[test]
    fn empty_table_requests_nothing() {
        let mut window = PageWindow::new(0, 50);
        assert_eq!(window.ensure_visible(0..20), None);
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn fit_measures_wide_characters() {
        // Each CJK character is two columns wide.
        assert_eq!(fit("日本語", 6), "日本語");
        assert_eq!(fit("日本語", 5), "日本…");
        assert_eq!(fit("日本語", 5).width(), 5);
    }

    #[test]
    fn control_characters_become_placeholder() {
        assert_eq!(sanitize("a\tb\u{0}c"), "a·b·c");
        assert_eq!(sanitize("bad \u{FFFD} byte"), "bad · byte");
    }

    #[test]
    fn widths_follow_content_and_cap() {
        let columns = vec![
            ColumnInfo {
                name: "id".into(),
                decl_type: "INTEGER".into(),
            },
            ColumnInfo {
                name: "body".into(),
                decl_type: "TEXT".into(),
            },
        ];
        let rows = vec![
            vec![Field::Integer(12345), Field::Text("x".repeat(100))],
            vec![Field::Null, Field::Blob(vec![1, 2, 3])],
        ];
        assert_eq!(column_widths(&columns, &rows, 40), vec![5, 40]);
    }

    #[test]
    fn row_layout_keeps_alignment_with_non_ascii() {
        let widths = [4, 3];
        let ascii = layout_row(&vec![Field::Text("abcd".into()), Field::Integer(1)], &widths);
        let wide = layout_row(&vec![Field::Text("日本".into()), Field::Integer(1)], &widths);
        assert_eq!(ascii.width(), wide.width());
    }
}
