use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::components::content::ContentWidget;
use crate::components::list::{format_size, rows_for, ListWidget};
use crate::components::search_bar::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::nav::pagination::fit;
use crate::nav::state::{FileBody, FileView, Navigator, StatusMessage, ViewState};
use crate::render::{hex, image, table};
use crate::theme::ThemeColors;

const BREADCRUMB_SEPARATOR: &str = " › ";

/// Render the application UI.
pub fn render(app: &App, frame: &mut Frame) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(app, frame, header);
    render_body(app, frame, body);
    render_footer(app, frame, footer);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let crumbs = app.navigator.breadcrumb().join(BREADCRUMB_SEPARATOR);
    let width = area.width as usize;
    // Keep the tail of a long path; the current view matters most.
    let chars: Vec<char> = crumbs.chars().collect();
    let mut text = crumbs.clone();
    let mut skip = 0;
    while text.width() + 1 > width && skip < chars.len() {
        skip += 1;
        text = std::iter::once('…').chain(chars[skip..].iter().copied()).collect();
    }
    let line = Line::from(Span::styled(
        format!(" {text}"),
        Style::default()
            .fg(app.theme.header_fg)
            .add_modifier(Modifier::BOLD),
    ));
    frame.buffer_mut().set_line(area.x, area.y, &line, area.width);
}

fn body_block<'a>(theme: &ThemeColors, title: Line<'a>) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg))
        .title(title)
}

fn render_body(app: &App, frame: &mut Frame, area: Rect) {
    let nav = &app.navigator;
    let theme = &app.theme;
    let viewport = nav.viewport();
    let len = nav.displayed_len();
    let window = viewport.window(len);

    match nav.view() {
        ViewState::FileViewer(file) => render_file(app, frame, area, file),
        ViewState::DatabaseTableContent { table, window: page, .. } => {
            let lines = table::lines(
                page,
                table,
                window.clone(),
                app.config.max_column_width(),
                theme.content_fg,
                theme.dim_fg,
            );
            let mut rows = lines.rows;
            if let Some(row) = nav
                .cursor()
                .and_then(|c| c.checked_sub(window.start))
                .and_then(|i| rows.get_mut(i))
            {
                row.style = Style::default()
                    .bg(theme.list_selected_bg)
                    .fg(theme.list_selected_fg);
            }
            let placeholder = if table.row_count == 0 { "(no rows)" } else { "Loading…" };
            let widget = table_widget(lines.header, &rows, placeholder, theme);
            frame.render_widget(widget, area);
        }
        view => {
            let rows = rows_for(view, nav.filter(), window);
            let title = Line::from(format!(" {} ", view.title()));
            if rows.is_empty() {
                let placeholder = if nav.is_loading() {
                    "Loading…"
                } else if nav.filter().is_active() {
                    "No matches"
                } else {
                    "(empty)"
                };
                let widget = ContentWidget::new(&[], theme)
                    .placeholder(placeholder)
                    .block(body_block(theme, title));
                frame.render_widget(widget, area);
            } else {
                let widget = ListWidget::new(&rows, viewport.offset, nav.cursor(), theme)
                    .block(body_block(theme, title));
                frame.render_widget(widget, area);
            }
        }
    }
}

/// Table rows under a block whose title is the column header. The title
/// starts at the inner x, so header and row separators share columns.
fn table_widget<'a>(
    header: Line<'a>,
    rows: &'a [Line<'static>],
    placeholder: &'a str,
    theme: &'a ThemeColors,
) -> ContentWidget<'a> {
    ContentWidget::new(rows, theme)
        .placeholder(placeholder)
        .block(body_block(theme, header))
}

fn render_file(app: &App, frame: &mut Frame, area: Rect, file: &FileView) {
    let theme = &app.theme;
    let viewport = app.navigator.viewport();
    let window = viewport.window(file.line_count());

    let mut placeholder = String::from("Loading…");
    let lines: Vec<Line<'static>> = match &file.body {
        FileBody::Loading => Vec::new(),
        FileBody::Text { doc, syntax } => app.highlighter.highlight(
            &doc.lines(window.clone()),
            window.start,
            doc.line_count(),
            *syntax,
            theme.content_line_nr_fg,
        ),
        FileBody::Hex(doc) => hex::lines(
            &doc.rows(window.clone()),
            theme.content_line_nr_fg,
            theme.content_fg,
        ),
        FileBody::Decoding { kind, .. } => {
            placeholder = format!("Decoding {}…", kind.label());
            Vec::new()
        }
        FileBody::Image(grid) => image::paint(grid),
        FileBody::Lines { lines, syntax } => {
            let visible: Vec<Option<String>> =
                lines[window.clone()].iter().cloned().map(Some).collect();
            app.highlighter.highlight(
                &visible,
                window.start,
                lines.len(),
                *syntax,
                theme.content_line_nr_fg,
            )
        }
        FileBody::Error(message) => {
            placeholder = message.clone();
            Vec::new()
        }
    };
    if lines.is_empty() && matches!(file.body, FileBody::Text { .. } | FileBody::Lines { .. }) {
        placeholder = "(empty file)".to_string();
    }

    let kind = file.kind.map(|k| k.label()).unwrap_or("…");
    let title = Line::from(vec![
        Span::styled(format!(" {} ", file.name), Style::default().fg(theme.header_fg)),
        Span::styled(
            format!("{} · {} ", format_size(file.size), kind),
            Style::default().fg(theme.dim_fg),
        ),
    ]);
    let mut block = body_block(theme, title);
    if let Some(note) = &file.note {
        block = block.title_bottom(Line::styled(
            format!(" {note} "),
            Style::default().fg(theme.warning_fg),
        ));
    }
    let widget = ContentWidget::new(&lines, theme)
        .placeholder(&placeholder)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let nav = &app.navigator;
    if nav.search_active() {
        let total = list_len(nav.view());
        let widget = SearchBarWidget::new(&nav.filter().query, nav.filter().len(), total, &app.theme);
        frame.render_widget(widget, area);
        return;
    }

    let info = position_info(nav);
    let hints = key_hints(nav.view());
    let mut widget = StatusBarWidget::new(&info, hints, &app.theme).loading(nav.is_loading());
    if let Some((message, _)) = &app.status_message {
        widget = match message {
            StatusMessage::Info(text) => widget.status_message(text, false),
            StatusMessage::Error(text) => widget.status_message(text, true),
        };
    }
    frame.render_widget(widget, area);
}

fn list_len(view: &ViewState) -> usize {
    match view {
        ViewState::DeviceList { devices } => devices.len(),
        ViewState::AppList { apps, .. } | ViewState::AllAppsList { apps } => apps.len(),
        ViewState::FileBrowser { entries, .. } => entries.len(),
        ViewState::DatabaseTableList { tables, .. } => tables.len(),
        ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. } => 0,
    }
}

/// Label of the toggled predicate in a list view.
pub fn flag_label(view: &ViewState) -> Option<&'static str> {
    match view {
        ViewState::DeviceList { .. } => Some("booted only"),
        ViewState::AppList { .. } | ViewState::AllAppsList { .. } => Some("with data"),
        ViewState::FileBrowser { .. } => Some("no dotfiles"),
        ViewState::DatabaseTableList { .. } => Some("non-empty"),
        ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. } => None,
    }
}

fn position_info(nav: &Navigator) -> String {
    let len = nav.displayed_len();
    let at = nav.cursor().map(|c| c + 1).unwrap_or(0);
    match nav.view() {
        ViewState::FileViewer(file) => {
            let mut info = format!("line {at}/{len}");
            if let FileBody::Text { doc, .. } = &file.body {
                if !doc.index.is_complete() {
                    info.push_str("+  indexing…");
                }
            }
            info
        }
        ViewState::DatabaseTableContent { .. } => format!("row {at}/{len}"),
        view => {
            let mut info = format!("{at}/{len}");
            let filter = nav.filter();
            if filter.flag {
                if let Some(label) = flag_label(view) {
                    info.push_str(&format!("  [{label}]"));
                }
            }
            if !filter.query.is_empty() {
                info.push_str(&format!("  /{}", fit(&filter.query, 20).trim_end()));
            }
            info
        }
    }
}

fn key_hints(view: &ViewState) -> &'static str {
    match view {
        ViewState::DeviceList { .. } => "⏎:open  a:all apps  b:boot  /:search  f:booted  r:refresh  q:quit",
        ViewState::AppList { .. } | ViewState::AllAppsList { .. } => {
            "⏎:open  esc:back  /:search  f:with data  r:refresh  q:quit"
        }
        ViewState::FileBrowser { .. } => "⏎:open  esc:back  /:search  f:dotfiles  r:refresh  q:quit",
        ViewState::DatabaseTableList { .. } => "⏎:rows  esc:back  /:search  f:non-empty  q:quit",
        ViewState::FileViewer(_) => "j/k:scroll  g/G:top/end  esc:back  q:quit",
        ViewState::DatabaseTableContent { .. } => "j/k:row  PgUp/PgDn:page  esc:back  q:quit",
    }
}
