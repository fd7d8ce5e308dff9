//! Carries out navigator effects against the collaborators.
//!
//! Each call runs on tokio's blocking pool and posts its result back into
//! the event channel; the loop hands it to the navigator like any other
//! event.

use std::path::Path;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::FetchError;
use crate::event::Event;
use crate::nav::model::Decoded;
use crate::nav::router::RenderKind;
use crate::nav::state::{AsyncResult, Effect, Payload};
use crate::render;
use crate::source::{FileReader, Sources};

/// Run `effect` off the event loop. Status effects are not collaborator
/// calls and are ignored here.
pub fn spawn(effect: Effect, sources: &Sources, tx: &UnboundedSender<Event>) {
    if matches!(effect, Effect::Status(_)) {
        return;
    }
    let sources = sources.clone();
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        if let Some(result) = execute(effect, &sources) {
            // The receiver is gone only while shutting down.
            let _ = tx.send(Event::Fetched(result));
        }
    });
}

/// Perform the call an effect describes and wrap its outcome.
pub fn execute(effect: Effect, sources: &Sources) -> Option<AsyncResult> {
    let (tag, payload) = match effect {
        Effect::ListDevices { tag } => (tag, Payload::Devices(sources.devices.list_devices())),
        Effect::ListApps { tag, device } => {
            (tag, Payload::Apps(sources.devices.list_apps(&device)))
        }
        Effect::ListAllApps { tag } => (tag, Payload::Apps(sources.devices.list_all_apps())),
        Effect::ReadDir { tag, path } => (tag, Payload::Entries(sources.files.read_dir(&path))),
        Effect::OpenFile {
            tag,
            path,
            head_len,
            small_file_threshold,
        } => (
            tag,
            Payload::FileOpened(sources.files.open(&path, head_len, small_file_threshold)),
        ),
        Effect::ReadChunk {
            tag,
            path,
            index,
            start,
            len,
        } => (
            tag,
            Payload::Chunk {
                index,
                bytes: sources.files.read_range(&path, start, len),
            },
        ),
        Effect::Decode {
            tag,
            path,
            kind,
            max_bytes,
            width,
            height,
        } => (
            tag,
            Payload::Decoded(decode(
                sources.files.as_ref(),
                &path,
                kind,
                max_bytes,
                width,
                height,
            )),
        ),
        Effect::ListTables { tag, path } => {
            (tag, Payload::Tables(sources.database.list_tables(&path)))
        }
        Effect::FetchRows {
            tag,
            path,
            table,
            offset,
            limit,
        } => (
            tag,
            Payload::Rows {
                offset,
                rows: sources.database.fetch_rows(&path, &table, offset, limit),
            },
        ),
        Effect::Boot { tag, device } => {
            let result = sources.devices.boot(&device);
            (tag, Payload::Booted { device, result })
        }
        Effect::Status(_) => return None,
    };
    if let Some(err) = failure(&payload) {
        warn!("request {}: {err}", tag.id);
    }
    Some(AsyncResult { tag, payload })
}

fn failure(payload: &Payload) -> Option<&FetchError> {
    match payload {
        Payload::Devices(r) => r.as_ref().err(),
        Payload::Apps(r) => r.as_ref().err(),
        Payload::Entries(r) => r.as_ref().err(),
        Payload::FileOpened(r) => r.as_ref().err(),
        Payload::Chunk { bytes, .. } => bytes.as_ref().err(),
        Payload::Tables(r) => r.as_ref().err(),
        Payload::Rows { rows, .. } => rows.as_ref().err(),
        Payload::Booted { result, .. } => result.as_ref().err(),
        // Renderer failures are logged where they happen.
        Payload::Decoded(_) => None,
    }
}

fn decode(
    files: &dyn FileReader,
    path: &Path,
    kind: RenderKind,
    max_bytes: u64,
    width: u16,
    height: u16,
) -> Result<Decoded, FetchError> {
    let stat = files.stat(path)?;
    if stat.size > max_bytes {
        return Err(FetchError::unsupported(format!(
            "{} bytes exceeds the {max_bytes} byte decode limit",
            stat.size
        )));
    }
    let bytes = files.read_range(path, 0, stat.size)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("decoding {} as {}", path.display(), kind.label());
    render::decode(kind, &bytes, &name, width, height).inspect_err(|err| {
        warn!("{} renderer failed on {}: {err}", kind.label(), path.display());
    })
}
