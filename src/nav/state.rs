//! The navigation state machine.
//!
//! [`Navigator::dispatch`] is the only way state changes. It returns the
//! side effects (collaborator calls, status messages) the host must carry
//! out; results come back later as [`Action::AsyncResult`].
//!
//! Every request is tagged with the view generation it was issued for.
//! Any transition between views bumps the generation, so a result that
//! arrives after the user moved on is dropped instead of being applied to
//! the wrong view.

use std::mem;
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::FetchError;
use crate::nav::chunk::{ContentBuffer, HexDocument, TextDocument};
use crate::nav::filter::FilterState;
use crate::nav::model::{
    AppSummary, Decoded, DeviceSummary, Entry, OpenedFile, PixelGrid, Row, TableSchema,
};
use crate::nav::pagination::{PageWindow, TablePage};
use crate::nav::router::{self, RenderKind};
use crate::nav::viewport::{visible_count, Viewport, CHROME_LINES};

/// Loading limits threaded in from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSettings {
    pub chunk_size: u64,
    pub small_file_threshold: u64,
    pub max_resident_chunks: usize,
    pub max_decode_bytes: u64,
    pub page_size: usize,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            small_file_threshold: 256 * 1024,
            max_resident_chunks: 32,
            max_decode_bytes: 32 * 1024 * 1024,
            page_size: 200,
        }
    }
}

/// Identity of an issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub generation: u64,
    pub id: u64,
}

#[derive(Debug, Default)]
struct RequestIds {
    generation: u64,
    next: u64,
}

impl RequestIds {
    fn next(&mut self) -> RequestTag {
        self.next += 1;
        RequestTag {
            generation: self.generation,
            id: self.next,
        }
    }

    fn bump(&mut self) {
        self.generation += 1;
    }
}

/// Content of a file viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum FileBody {
    /// Waiting for the stat and first bytes.
    Loading,
    Text {
        doc: TextDocument,
        syntax: Option<&'static str>,
    },
    Hex(HexDocument),
    /// A whole-payload renderer is working; `head` is kept for fallback.
    Decoding { kind: RenderKind, head: Vec<u8> },
    Image(PixelGrid),
    Lines {
        lines: Vec<String>,
        syntax: Option<&'static str>,
    },
    Error(String),
}

/// A file being viewed.
#[derive(Debug, Clone, PartialEq)]
pub struct FileView {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub kind: Option<RenderKind>,
    pub body: FileBody,
    /// Informational note, e.g. which fallback was taken.
    pub note: Option<String>,
    /// Keep indexing until the last line is known, then jump to it.
    pub follow_end: bool,
}

impl FileView {
    fn loading(path: PathBuf, name: String) -> Self {
        Self {
            path,
            name,
            size: 0,
            kind: None,
            body: FileBody::Loading,
            note: None,
            follow_end: false,
        }
    }

    /// Number of scrollable lines in the body.
    pub fn line_count(&self) -> usize {
        match &self.body {
            FileBody::Text { doc, .. } => doc.line_count(),
            FileBody::Hex(doc) => doc.row_count(),
            FileBody::Lines { lines, .. } => lines.len(),
            FileBody::Image(_) => 1,
            FileBody::Loading | FileBody::Decoding { .. } | FileBody::Error(_) => 0,
        }
    }
}

/// What is currently displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    DeviceList {
        devices: Vec<DeviceSummary>,
    },
    AppList {
        device: DeviceSummary,
        apps: Vec<AppSummary>,
    },
    AllAppsList {
        apps: Vec<AppSummary>,
    },
    FileBrowser {
        app: AppSummary,
        root: PathBuf,
        path: PathBuf,
        entries: Vec<Entry>,
    },
    FileViewer(FileView),
    DatabaseTableList {
        path: PathBuf,
        tables: Vec<TableSchema>,
    },
    DatabaseTableContent {
        path: PathBuf,
        table: TableSchema,
        window: PageWindow,
    },
}

impl ViewState {
    /// Breadcrumb segment for this view.
    pub fn title(&self) -> String {
        match self {
            ViewState::DeviceList { .. } => "Devices".to_string(),
            ViewState::AppList { device, .. } => device.name.clone(),
            ViewState::AllAppsList { .. } => "All apps".to_string(),
            ViewState::FileBrowser {
                app, root, path, ..
            } => {
                if path == root {
                    app.name.clone()
                } else {
                    file_name(path)
                }
            }
            ViewState::FileViewer(file) => file.name.clone(),
            ViewState::DatabaseTableList { path, .. } => file_name(path),
            ViewState::DatabaseTableContent { table, .. } => table.name.clone(),
        }
    }

    /// Views whose items are searchable and selectable.
    pub fn is_list(&self) -> bool {
        !matches!(
            self,
            ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. }
        )
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Saved state of a parent view, restored verbatim on `Back`.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationFrame {
    pub view: ViewState,
    pub cursor: Option<usize>,
    pub viewport: Viewport,
    pub filter: FilterState,
}

/// Status line content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Input to [`Navigator::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    JumpFirst,
    JumpLast,
    Enter,
    Back,
    ToggleFilterFlag,
    StartSearch,
    /// Carries the full query text, not a single keystroke.
    UpdateSearchQuery(String),
    CancelSearch,
    Resize { width: u16, height: u16 },
    ShowAllApps,
    Refresh,
    BootDevice,
    AsyncResult(AsyncResult),
}

/// A collaborator call the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ListDevices {
        tag: RequestTag,
    },
    ListApps {
        tag: RequestTag,
        device: DeviceSummary,
    },
    ListAllApps {
        tag: RequestTag,
    },
    ReadDir {
        tag: RequestTag,
        path: PathBuf,
    },
    /// Stat `path`, then read it whole when it is at most
    /// `small_file_threshold` bytes, else only the first `head_len` bytes.
    OpenFile {
        tag: RequestTag,
        path: PathBuf,
        head_len: u64,
        small_file_threshold: u64,
    },
    ReadChunk {
        tag: RequestTag,
        path: PathBuf,
        index: u64,
        start: u64,
        len: u64,
    },
    /// Read the whole payload and run the renderer for `kind`.
    Decode {
        tag: RequestTag,
        path: PathBuf,
        kind: RenderKind,
        max_bytes: u64,
        width: u16,
        height: u16,
    },
    ListTables {
        tag: RequestTag,
        path: PathBuf,
    },
    FetchRows {
        tag: RequestTag,
        path: PathBuf,
        table: String,
        offset: usize,
        limit: usize,
    },
    Boot {
        tag: RequestTag,
        device: DeviceSummary,
    },
    Status(StatusMessage),
}

/// Result of a collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Devices(Result<Vec<DeviceSummary>, FetchError>),
    Apps(Result<Vec<AppSummary>, FetchError>),
    Entries(Result<Vec<Entry>, FetchError>),
    FileOpened(Result<OpenedFile, FetchError>),
    Chunk {
        index: u64,
        bytes: Result<Vec<u8>, FetchError>,
    },
    Decoded(Result<Decoded, FetchError>),
    Tables(Result<Vec<TableSchema>, FetchError>),
    Rows {
        offset: usize,
        rows: Result<Vec<Row>, FetchError>,
    },
    Booted {
        device: DeviceSummary,
        result: Result<(), FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsyncResult {
    pub tag: RequestTag,
    pub payload: Payload,
}

/// Current view, back-stack and pending request bookkeeping.
#[derive(Debug)]
pub struct Navigator {
    view: ViewState,
    cursor: Option<usize>,
    viewport: Viewport,
    filter: FilterState,
    search_active: bool,
    stack: Vec<NavigationFrame>,
    ids: RequestIds,
    /// Id of the outstanding primary load of the current view.
    primary: Option<u64>,
    width: u16,
    settings: LoadSettings,
}

impl Navigator {
    pub fn new(settings: LoadSettings) -> Self {
        Self {
            view: ViewState::DeviceList {
                devices: Vec::new(),
            },
            cursor: None,
            viewport: Viewport::default(),
            filter: FilterState::default(),
            search_active: false,
            stack: Vec::new(),
            ids: RequestIds::default(),
            primary: None,
            width: 80,
            settings,
        }
    }

    /// Initial load of the root device list.
    pub fn start(&mut self) -> Vec<Effect> {
        self.load_current()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn search_active(&self) -> bool {
        self.search_active
    }

    #[cfg(test)]
    pub fn stack(&self) -> &[NavigationFrame] {
        &self.stack
    }

    pub fn is_loading(&self) -> bool {
        self.primary.is_some()
            || matches!(
                &self.view,
                ViewState::FileViewer(FileView {
                    body: FileBody::Loading | FileBody::Decoding { .. },
                    ..
                })
            )
    }

    /// Titles from the root to the current view.
    pub fn breadcrumb(&self) -> Vec<String> {
        self.stack
            .iter()
            .map(|frame| frame.view.title())
            .chain(std::iter::once(self.view.title()))
            .collect()
    }

    /// Length of the displayed sequence the cursor indexes into.
    pub fn displayed_len(&self) -> usize {
        match &self.view {
            ViewState::FileViewer(file) => file.line_count(),
            ViewState::DatabaseTableContent { window, .. } => window.total_rows,
            _ => self.filter.len(),
        }
    }

    /// Source index of the selected list item.
    pub fn selected(&self) -> Option<usize> {
        self.cursor.and_then(|c| self.filter.source_index(c))
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::MoveUp => self.move_by(-1),
            Action::MoveDown => self.move_by(1),
            Action::PageUp => self.move_by(-(self.viewport.visible as isize)),
            Action::PageDown => self.move_by(self.viewport.visible as isize),
            Action::JumpFirst => self.jump_first(),
            Action::JumpLast => self.jump_last(),
            Action::Enter => self.enter(),
            Action::Back => self.back(),
            Action::ToggleFilterFlag => self.toggle_flag(),
            Action::StartSearch => {
                if self.view.is_list() {
                    self.search_active = true;
                }
                Vec::new()
            }
            Action::UpdateSearchQuery(query) => {
                if self.search_active {
                    self.filter.query = query;
                    self.refilter();
                }
                Vec::new()
            }
            Action::CancelSearch => {
                if self.search_active {
                    self.search_active = false;
                    self.filter.query.clear();
                    self.refilter();
                }
                Vec::new()
            }
            Action::Resize { width, height } => self.resize(width, height),
            Action::ShowAllApps => self.show_all_apps(),
            Action::Refresh => self.refresh(),
            Action::BootDevice => self.boot_selected(),
            Action::AsyncResult(result) => self.receive(result),
        }
    }

    // ── Movement ──────────────────────────────────────────────────────

    fn is_scroll_view(&self) -> bool {
        matches!(self.view, ViewState::FileViewer(_))
    }

    fn move_by(&mut self, delta: isize) -> Vec<Effect> {
        let len = self.displayed_len();
        if len == 0 {
            self.cursor = None;
            return Vec::new();
        }
        if self.is_scroll_view() {
            let max = self.viewport.max_offset(len) as isize;
            let offset = (self.viewport.offset as isize + delta).clamp(0, max) as usize;
            self.set_scroll(offset);
        } else {
            let current = self.cursor.unwrap_or(0) as isize;
            let next = (current + delta).clamp(0, len as isize - 1) as usize;
            self.cursor = Some(next);
            self.viewport.follow(self.cursor, len);
        }
        self.sync_content()
    }

    // In viewers the cursor is pinned to the top visible line.
    fn set_scroll(&mut self, offset: usize) {
        self.viewport.offset = offset;
        self.cursor = Some(offset);
        let len = self.displayed_len();
        self.viewport.follow(self.cursor, len);
        self.cursor = (len > 0).then_some(self.viewport.offset);
    }

    fn jump_first(&mut self) -> Vec<Effect> {
        if self.displayed_len() == 0 {
            return Vec::new();
        }
        if self.is_scroll_view() {
            self.set_scroll(0);
        } else {
            self.cursor = Some(0);
            self.viewport.follow(self.cursor, self.displayed_len());
        }
        self.sync_content()
    }

    fn jump_last(&mut self) -> Vec<Effect> {
        if let ViewState::FileViewer(file) = &mut self.view {
            if let FileBody::Text { doc, .. } = &mut file.body {
                if !doc.index.is_complete() {
                    file.follow_end = true;
                    let path = file.path.clone();
                    return doc
                        .continue_indexing()
                        .map(|r| Effect::ReadChunk {
                            tag: self.ids.next(),
                            path,
                            index: r.index,
                            start: r.start,
                            len: r.len,
                        })
                        .into_iter()
                        .collect();
                }
            }
        }
        let len = self.displayed_len();
        if len == 0 {
            return Vec::new();
        }
        if self.is_scroll_view() {
            self.set_scroll(self.viewport.max_offset(len));
        } else {
            self.cursor = Some(len - 1);
            self.viewport.follow(self.cursor, len);
        }
        self.sync_content()
    }

    fn resize(&mut self, width: u16, height: u16) -> Vec<Effect> {
        self.width = width;
        self.viewport.visible = visible_count(height, CHROME_LINES);
        let len = self.displayed_len();
        if self.is_scroll_view() {
            let offset = self.viewport.offset.min(self.viewport.max_offset(len));
            self.set_scroll(offset);
        } else {
            self.viewport.follow(self.cursor, len);
        }
        self.sync_content()
    }

    // ── Filter ────────────────────────────────────────────────────────

    fn toggle_flag(&mut self) -> Vec<Effect> {
        if self.view.is_list() {
            self.filter.flag = !self.filter.flag;
            self.refilter();
        }
        Vec::new()
    }

    fn refilter(&mut self) {
        let cursor = self.cursor;
        let filter = &mut self.filter;
        self.cursor = match &self.view {
            ViewState::DeviceList { devices } => filter.apply(devices, cursor),
            ViewState::AppList { apps, .. } | ViewState::AllAppsList { apps } => {
                filter.apply(apps, cursor)
            }
            ViewState::FileBrowser { entries, .. } => filter.apply(entries, cursor),
            ViewState::DatabaseTableList { tables, .. } => filter.apply(tables, cursor),
            ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. } => return,
        };
        let len = self.displayed_len();
        self.viewport.follow(self.cursor, len);
    }

    // ── Transitions ───────────────────────────────────────────────────

    fn enter(&mut self) -> Vec<Effect> {
        self.search_active = false;
        let Some(index) = self.selected() else {
            return Vec::new();
        };
        let next = match &self.view {
            ViewState::DeviceList { devices } => devices.get(index).map(|d| ViewState::AppList {
                device: d.clone(),
                apps: Vec::new(),
            }),
            ViewState::AppList { apps, .. } | ViewState::AllAppsList { apps } => {
                apps.get(index).map(|app| {
                    let root = app.browse_root();
                    ViewState::FileBrowser {
                        app: app.clone(),
                        path: root.clone(),
                        root,
                        entries: Vec::new(),
                    }
                })
            }
            ViewState::FileBrowser {
                app, root, entries, ..
            } => entries.get(index).map(|entry| {
                if entry.is_dir {
                    ViewState::FileBrowser {
                        app: app.clone(),
                        root: root.clone(),
                        path: entry.path.clone(),
                        entries: Vec::new(),
                    }
                } else {
                    ViewState::FileViewer(FileView::loading(
                        entry.path.clone(),
                        entry.name.clone(),
                    ))
                }
            }),
            ViewState::DatabaseTableList { path, tables } => {
                tables
                    .get(index)
                    .map(|table| ViewState::DatabaseTableContent {
                        path: path.clone(),
                        table: table.clone(),
                        window: PageWindow::new(table.row_count, self.settings.page_size),
                    })
            }
            ViewState::FileViewer(_) | ViewState::DatabaseTableContent { .. } => None,
        };
        match next {
            Some(view) => self.push(view),
            None => Vec::new(),
        }
    }

    fn show_all_apps(&mut self) -> Vec<Effect> {
        if !matches!(self.view, ViewState::DeviceList { .. }) {
            return Vec::new();
        }
        self.search_active = false;
        self.push(ViewState::AllAppsList { apps: Vec::new() })
    }

    fn push(&mut self, view: ViewState) -> Vec<Effect> {
        let parent = NavigationFrame {
            view: mem::replace(&mut self.view, view),
            cursor: self.cursor,
            viewport: self.viewport,
            filter: mem::take(&mut self.filter),
        };
        self.stack.push(parent);
        self.reset_view_state();
        self.load_current()
    }

    // Fresh view: empty filter, cursor at the top, nothing pending.
    fn reset_view_state(&mut self) {
        self.ids.bump();
        self.primary = None;
        self.search_active = false;
        self.filter = FilterState::default();
        self.viewport.offset = 0;
        self.cursor = (self.displayed_len() > 0).then_some(0);
    }

    fn back(&mut self) -> Vec<Effect> {
        let Some(frame) = self.stack.pop() else {
            return Vec::new();
        };
        let visible = self.viewport.visible;
        self.view = frame.view;
        self.cursor = frame.cursor;
        self.viewport = frame.viewport;
        self.filter = frame.filter;
        self.search_active = false;
        self.ids.bump();
        self.primary = None;
        if self.viewport.visible != visible {
            self.viewport.visible = visible;
            let len = self.displayed_len();
            self.viewport.follow(self.cursor, len);
        }
        Vec::new()
    }

    /// Issue the primary load of the current view.
    fn load_current(&mut self) -> Vec<Effect> {
        let tag = self.ids.next();
        let effect = match &self.view {
            ViewState::DeviceList { .. } => Effect::ListDevices { tag },
            ViewState::AppList { device, .. } => Effect::ListApps {
                tag,
                device: device.clone(),
            },
            ViewState::AllAppsList { .. } => Effect::ListAllApps { tag },
            ViewState::FileBrowser { path, .. } => Effect::ReadDir {
                tag,
                path: path.clone(),
            },
            ViewState::FileViewer(file) => Effect::OpenFile {
                tag,
                path: file.path.clone(),
                head_len: self.settings.chunk_size,
                small_file_threshold: self.settings.small_file_threshold,
            },
            ViewState::DatabaseTableList { path, .. } => Effect::ListTables {
                tag,
                path: path.clone(),
            },
            ViewState::DatabaseTableContent { .. } => return self.sync_content(),
        };
        self.primary = Some(tag.id);
        vec![effect]
    }

    fn refresh(&mut self) -> Vec<Effect> {
        match &mut self.view {
            ViewState::FileViewer(file) => {
                self.ids.bump();
                *file = FileView::loading(file.path.clone(), file.name.clone());
                self.cursor = None;
                self.viewport.offset = 0;
            }
            ViewState::DatabaseTableContent { table, window, .. } => {
                self.ids.bump();
                *window = PageWindow::new(table.row_count, self.settings.page_size);
            }
            _ => {}
        }
        self.load_current()
    }

    fn boot_selected(&mut self) -> Vec<Effect> {
        let ViewState::DeviceList { devices } = &self.view else {
            return Vec::new();
        };
        let Some(device) = self.selected().and_then(|i| devices.get(i)).cloned() else {
            return Vec::new();
        };
        if device.is_booted() {
            return vec![Effect::Status(StatusMessage::Info(format!(
                "{} is already booted",
                device.name
            )))];
        }
        let status = Effect::Status(StatusMessage::Info(format!("Booting {}…", device.name)));
        vec![
            status,
            Effect::Boot {
                tag: self.ids.next(),
                device,
            },
        ]
    }

    // ── Content loading ───────────────────────────────────────────────

    /// Chunk and page requests for whatever is on screen.
    fn sync_content(&mut self) -> Vec<Effect> {
        let len = self.displayed_len();
        let window = self.viewport.window(len);
        let lookahead = self.viewport.visible;
        let ids = &mut self.ids;
        match &mut self.view {
            ViewState::FileViewer(file) => {
                let requests = match &mut file.body {
                    FileBody::Text { doc, .. } => doc.sync(window, lookahead),
                    FileBody::Hex(doc) => doc.sync(window),
                    _ => return Vec::new(),
                };
                requests
                    .into_iter()
                    .map(|r| Effect::ReadChunk {
                        tag: ids.next(),
                        path: file.path.clone(),
                        index: r.index,
                        start: r.start,
                        len: r.len,
                    })
                    .collect()
            }
            ViewState::DatabaseTableContent {
                path,
                table,
                window: pages,
            } => pages
                .ensure_visible(window)
                .map(|r| Effect::FetchRows {
                    tag: ids.next(),
                    path: path.clone(),
                    table: table.name.clone(),
                    offset: r.offset,
                    limit: r.limit,
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn body_for(&self, kind: RenderKind, head: Vec<u8>, size: u64, name: &str) -> FileBody {
        let buffer = ContentBuffer::with_head(
            size,
            self.settings.chunk_size,
            self.settings.max_resident_chunks,
            head,
        );
        match kind {
            RenderKind::Text | RenderKind::Vector => FileBody::Text {
                doc: TextDocument::new(buffer),
                syntax: router::syntax_hint(kind, name),
            },
            _ => FileBody::Hex(HexDocument::new(buffer)),
        }
    }

    fn on_file_opened(&mut self, opened: Result<OpenedFile, FetchError>) -> Vec<Effect> {
        let ViewState::FileViewer(file) = &self.view else {
            return Vec::new();
        };
        let (path, name) = (file.path.clone(), file.name.clone());
        let opened = match opened {
            Ok(opened) => opened,
            Err(err) => {
                warn!("open {} failed: {err}", path.display());
                self.set_file_body(FileBody::Error(err.to_string()), None);
                return vec![Effect::Status(StatusMessage::Error(err.to_string()))];
            }
        };
        let size = opened.stat.size;
        let kind = router::classify(&opened.head, &name);
        debug!("{} classified as {}", path.display(), kind.label());

        if kind == RenderKind::Database {
            // Same stack depth: Back from the table list returns to the
            // directory the file was opened from.
            self.view = ViewState::DatabaseTableList {
                path,
                tables: Vec::new(),
            };
            self.reset_view_state();
            return self.load_current();
        }

        if let ViewState::FileViewer(file) = &mut self.view {
            file.size = size;
            file.kind = Some(kind);
        }

        if kind.needs_whole_payload() {
            if size <= self.settings.max_decode_bytes {
                let tag = self.ids.next();
                self.primary = Some(tag.id);
                self.set_file_body(
                    FileBody::Decoding {
                        kind,
                        head: opened.head,
                    },
                    None,
                );
                return vec![Effect::Decode {
                    tag,
                    path,
                    kind,
                    max_bytes: self.settings.max_decode_bytes,
                    width: self.width,
                    height: (self.viewport.visible as u16).saturating_mul(2),
                }];
            }
            let next = router::fallback(kind, &opened.head, &name);
            debug!("{} too large for {} renderer", path.display(), kind.label());
            let note = format!(
                "{} too large to render ({size} bytes), showing {}",
                kind.label(),
                next.label()
            );
            let body = self.body_for(next, opened.head, size, &name);
            self.set_file_body(body, Some(note));
            return self.sync_content();
        }

        let note = (kind == RenderKind::Vector)
            .then(|| "vector rasterization unavailable, showing source".to_string());
        let body = self.body_for(kind, opened.head, size, &name);
        self.set_file_body(body, note);
        self.sync_content()
    }

    fn on_decoded(&mut self, decoded: Result<Decoded, FetchError>) -> Vec<Effect> {
        let ViewState::FileViewer(file) = &mut self.view else {
            return Vec::new();
        };
        if !matches!(file.body, FileBody::Decoding { .. }) {
            return Vec::new();
        }
        let FileBody::Decoding { kind, head } = mem::replace(&mut file.body, FileBody::Loading)
        else {
            return Vec::new();
        };
        let (name, size) = (file.name.clone(), file.size);
        match decoded {
            Ok(Decoded::Image(grid)) => self.set_file_body(FileBody::Image(grid), None),
            Ok(Decoded::Lines(lines)) => {
                let syntax = router::syntax_hint(kind, &name);
                self.set_file_body(FileBody::Lines { lines, syntax }, None);
            }
            Err(err) => {
                let next = router::fallback(kind, &head, &name);
                debug!("{} renderer failed for {name}: {err}", kind.label());
                let note = format!(
                    "{} could not be rendered ({err}), showing {}",
                    kind.label(),
                    next.label()
                );
                let body = self.body_for(next, head, size, &name);
                self.set_file_body(body, Some(note));
            }
        }
        self.sync_content()
    }

    fn set_file_body(&mut self, body: FileBody, note: Option<String>) {
        if let ViewState::FileViewer(file) = &mut self.view {
            file.body = body;
            file.note = note;
            file.follow_end = false;
        }
        self.viewport.offset = 0;
        self.cursor = (self.displayed_len() > 0).then_some(0);
    }

    fn on_chunk(&mut self, index: u64, bytes: Result<Vec<u8>, FetchError>) -> Vec<Effect> {
        let ViewState::FileViewer(file) = &mut self.view else {
            return Vec::new();
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(err) => {
                match &mut file.body {
                    FileBody::Text { doc, .. } => doc.buffer.abandon(index),
                    FileBody::Hex(doc) => doc.buffer.abandon(index),
                    _ => {}
                }
                file.follow_end = false;
                warn!("chunk {index} of {} failed: {err}", file.path.display());
                return vec![Effect::Status(StatusMessage::Error(err.to_string()))];
            }
        };
        let accepted = match &mut file.body {
            FileBody::Text { doc, .. } => doc.on_chunk(index, bytes),
            FileBody::Hex(doc) => doc.on_chunk(index, bytes),
            _ => false,
        };
        if !accepted {
            debug!("discarding unrequested chunk {index}");
            return Vec::new();
        }
        if file.follow_end {
            if let FileBody::Text { doc, .. } = &mut file.body {
                if !doc.index.is_complete() {
                    let path = file.path.clone();
                    let ids = &mut self.ids;
                    return doc
                        .continue_indexing()
                        .map(|r| Effect::ReadChunk {
                            tag: ids.next(),
                            path,
                            index: r.index,
                            start: r.start,
                            len: r.len,
                        })
                        .into_iter()
                        .collect();
                }
            }
            file.follow_end = false;
            let len = self.displayed_len();
            self.set_scroll(self.viewport.max_offset(len));
        }
        self.sync_content()
    }

    fn on_rows(&mut self, offset: usize, rows: Result<Vec<Row>, FetchError>) -> Vec<Effect> {
        let ViewState::DatabaseTableContent { table, window, .. } = &mut self.view else {
            return Vec::new();
        };
        match rows {
            Ok(rows) => {
                let page = TablePage {
                    table_name: table.name.clone(),
                    row_offset: offset,
                    page_size: window.page_size,
                    rows,
                    columns: table.columns.clone(),
                };
                if !window.accept(page) {
                    debug!("discarding page at offset {offset} of {}", table.name);
                    return Vec::new();
                }
                self.sync_content()
            }
            Err(err) => {
                window.abandon(offset);
                warn!("rows of {} failed: {err}", table.name);
                vec![Effect::Status(StatusMessage::Error(err.to_string()))]
            }
        }
    }

    fn on_booted(&mut self, device: DeviceSummary, result: Result<(), FetchError>) -> Vec<Effect> {
        match result {
            Ok(()) => {
                let mut effects = vec![Effect::Status(StatusMessage::Info(format!(
                    "Booted {}",
                    device.name
                )))];
                if matches!(self.view, ViewState::DeviceList { .. }) {
                    effects.extend(self.load_current());
                }
                effects
            }
            Err(err) => {
                warn!("boot {} failed: {err}", device.udid);
                vec![Effect::Status(StatusMessage::Error(format!(
                    "Boot {} failed: {err}",
                    device.name
                )))]
            }
        }
    }

    /// Store a primary list load into the current view.
    fn on_list<T>(
        &mut self,
        result: Result<Vec<T>, FetchError>,
        store: impl FnOnce(&mut ViewState, Vec<T>) -> bool,
    ) -> Vec<Effect> {
        match result {
            Ok(items) => {
                if !store(&mut self.view, items) {
                    debug!("list result does not match the current view");
                    return Vec::new();
                }
                self.refilter();
                Vec::new()
            }
            Err(err) => {
                warn!("loading {} failed: {err}", self.view.title());
                self.refilter();
                vec![Effect::Status(StatusMessage::Error(err.to_string()))]
            }
        }
    }

    fn receive(&mut self, result: AsyncResult) -> Vec<Effect> {
        let AsyncResult { tag, payload } = result;
        // Boot outcomes are reported whatever the user is looking at.
        let is_boot = matches!(payload, Payload::Booted { .. });
        if !is_boot && tag.generation != self.ids.generation {
            debug!("discarding stale result {tag:?}");
            return Vec::new();
        }
        let is_primary = matches!(
            payload,
            Payload::Devices(_)
                | Payload::Apps(_)
                | Payload::Entries(_)
                | Payload::FileOpened(_)
                | Payload::Decoded(_)
                | Payload::Tables(_)
        );
        if is_primary {
            if self.primary != Some(tag.id) {
                debug!("discarding superseded result {tag:?}");
                return Vec::new();
            }
            self.primary = None;
        }

        match payload {
            Payload::Devices(result) => self.on_list(result, |view, items| match view {
                ViewState::DeviceList { devices } => {
                    *devices = items;
                    true
                }
                _ => false,
            }),
            Payload::Apps(result) => self.on_list(result, |view, items| match view {
                ViewState::AppList { apps, .. } | ViewState::AllAppsList { apps } => {
                    *apps = items;
                    true
                }
                _ => false,
            }),
            Payload::Entries(result) => self.on_list(result, |view, items| match view {
                ViewState::FileBrowser { entries, .. } => {
                    *entries = items;
                    true
                }
                _ => false,
            }),
            Payload::Tables(result) => self.on_list(result, |view, items| match view {
                ViewState::DatabaseTableList { tables, .. } => {
                    *tables = items;
                    true
                }
                _ => false,
            }),
            Payload::FileOpened(result) => self.on_file_opened(result),
            Payload::Decoded(result) => self.on_decoded(result),
            Payload::Chunk { index, bytes } => self.on_chunk(index, bytes),
            Payload::Rows { offset, rows } => self.on_rows(offset, rows),
            Payload::Booted { device, result } => self.on_booted(device, result),
        }
    }
}
