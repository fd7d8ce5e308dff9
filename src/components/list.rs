use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::nav::filter::FilterState;
use crate::nav::model::{AppSummary, DeviceSummary, Entry, TableSchema};
use crate::nav::pagination::{fit, sanitize};
use crate::nav::state::ViewState;
use crate::theme::ThemeColors;

/// How a row is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Plain,
    Directory,
    Dim,
    Active,
}

/// One displayed list item: a label on the left and detail on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub label: String,
    pub detail: String,
    pub kind: RowKind,
}

/// Format bytes into human-readable size string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn device_row(device: &DeviceSummary) -> ListRow {
    let marker = if device.is_booted() { "● " } else { "○ " };
    ListRow {
        label: format!("{marker}{}", device.name),
        detail: format!("{}  {}", device.runtime, device.state.label()),
        kind: if device.is_booted() {
            RowKind::Active
        } else {
            RowKind::Plain
        },
    }
}

fn app_row(app: &AppSummary, with_device: bool) -> ListRow {
    let mut detail = format!("{}  {}", app.bundle_id, app.version);
    if with_device {
        detail.push_str(&format!("  [{}]", app.device_name));
    }
    ListRow {
        label: app.name.clone(),
        detail,
        kind: if app.data_path.is_some() {
            RowKind::Plain
        } else {
            RowKind::Dim
        },
    }
}

fn entry_row(entry: &Entry) -> ListRow {
    if entry.is_dir {
        ListRow {
            label: format!("{}/", entry.name),
            detail: String::new(),
            kind: RowKind::Directory,
        }
    } else {
        ListRow {
            label: entry.name.clone(),
            detail: format_size(entry.size),
            kind: if entry.is_hidden() {
                RowKind::Dim
            } else {
                RowKind::Plain
            },
        }
    }
}

fn table_row(table: &TableSchema) -> ListRow {
    ListRow {
        label: table.name.clone(),
        detail: format!(
            "{} rows  {} columns",
            table.row_count,
            table.columns.len()
        ),
        kind: if table.row_count == 0 {
            RowKind::Dim
        } else {
            RowKind::Plain
        },
    }
}

/// Rows for the displayed positions in `window` of a list view.
pub fn rows_for(view: &ViewState, filter: &FilterState, window: Range<usize>) -> Vec<ListRow> {
    window
        .filter_map(|position| {
            let index = filter.source_index(position)?;
            match view {
                ViewState::DeviceList { devices } => devices.get(index).map(device_row),
                ViewState::AppList { apps, .. } => apps.get(index).map(|a| app_row(a, false)),
                ViewState::AllAppsList { apps } => apps.get(index).map(|a| app_row(a, true)),
                ViewState::FileBrowser { entries, .. } => entries.get(index).map(entry_row),
                ViewState::DatabaseTableList { tables, .. } => tables.get(index).map(table_row),
                ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. } => None,
            }
        })
        .collect()
}

/// List widget. `rows` start at displayed position `offset`.
pub struct ListWidget<'a> {
    rows: &'a [ListRow],
    offset: usize,
    selected: Option<usize>,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> ListWidget<'a> {
    pub fn new(
        rows: &'a [ListRow],
        offset: usize,
        selected: Option<usize>,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            rows,
            offset,
            selected,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn style(&self, kind: RowKind, selected: bool) -> Style {
        if selected {
            return Style::default()
                .bg(self.theme.list_selected_bg)
                .fg(self.theme.list_selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        match kind {
            RowKind::Plain => Style::default().fg(self.theme.list_fg),
            RowKind::Directory => Style::default()
                .fg(self.theme.list_dir_fg)
                .add_modifier(Modifier::BOLD),
            RowKind::Dim => Style::default().fg(self.theme.list_dim_fg),
            RowKind::Active => Style::default().fg(self.theme.success_fg),
        }
    }
}

impl<'a> Widget for ListWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let width = inner_area.width as usize;
        if width == 0 || inner_area.height == 0 {
            return;
        }

        for (i, row) in self.rows.iter().take(inner_area.height as usize).enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = self.selected == Some(self.offset + i);
            let style = self.style(row.kind, is_selected);

            let detail = sanitize(&row.detail);
            let detail_width = detail.width().min(width / 2);
            let label_width = width.saturating_sub(detail_width + 1);
            let label = fit(&format!(" {}", sanitize(&row.label)), label_width);
            // Detail is dimmed unless the row is selected.
            let detail_style = if is_selected {
                style
            } else {
                Style::default().fg(self.theme.dim_fg)
            };
            let mut spans = vec![Span::styled(label, style)];
            if detail_width > 0 {
                spans.push(Span::styled(
                    format!(" {}", fit(&detail, detail_width)),
                    detail_style,
                ));
            }
            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
