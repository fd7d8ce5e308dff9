//! Lazy, chunk-aligned loading of file content.
//!
//! A [`ContentBuffer`] never reads anything itself. Callers describe the
//! byte range they need on screen and get back the chunk reads still
//! missing; results are handed back through [`ContentBuffer::accept`].
//! Chunks are aligned to `chunk_size`, so loaded ranges never overlap.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// A text line never grows past this many bytes before it is wrapped.
pub const MAX_LINE_BYTES: usize = 4096;
/// Bytes shown per hex dump row.
pub const HEX_ROW_BYTES: u64 = 16;

/// A chunk read the caller must issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    pub index: u64,
    pub start: u64,
    pub len: u64,
}

/// Resident chunks of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBuffer {
    total_size: u64,
    chunk_size: u64,
    max_resident: usize,
    chunks: BTreeMap<u64, Vec<u8>>,
    in_flight: BTreeSet<u64>,
    focus: Range<u64>,
}

impl ContentBuffer {
    pub fn new(total_size: u64, chunk_size: u64, max_resident: usize) -> Self {
        Self {
            total_size,
            chunk_size: chunk_size.max(1),
            max_resident: max_resident.max(1),
            chunks: BTreeMap::new(),
            in_flight: BTreeSet::new(),
            focus: 0..1,
        }
    }

    /// Buffer seeded with the bytes read when the file was opened.
    ///
    /// When `head` already holds the whole file it becomes a single chunk,
    /// which is how small files skip chunking entirely.
    pub fn with_head(total_size: u64, chunk_size: u64, max_resident: usize, head: Vec<u8>) -> Self {
        let whole = head.len() as u64 >= total_size;
        let chunk_size = if whole {
            chunk_size.max(total_size)
        } else {
            chunk_size
        };
        let mut buffer = Self::new(total_size, chunk_size, max_resident);
        let first = buffer.chunk_range(0);
        // A head shorter than the first chunk is dropped; the chunk will be
        // requested like any other.
        if total_size > 0 && head.len() as u64 >= first.end - first.start {
            let mut head = head;
            head.truncate((first.end - first.start) as usize);
            buffer.chunks.insert(0, head);
        }
        buffer
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> u64 {
        self.total_size.div_ceil(self.chunk_size)
    }

    /// Byte range covered by chunk `index`.
    pub fn chunk_range(&self, index: u64) -> Range<u64> {
        let start = index * self.chunk_size;
        start..(start + self.chunk_size).min(self.total_size)
    }

    /// Chunk reads needed to cover `range`, skipping anything resident or
    /// already requested.
    pub fn ensure_loaded(&mut self, range: Range<u64>) -> Vec<ChunkRequest> {
        let end = range.end.min(self.total_size);
        if range.start >= end {
            return Vec::new();
        }
        let first = range.start / self.chunk_size;
        let last = (end - 1) / self.chunk_size;
        self.focus = first..last + 1;

        let mut requests = Vec::new();
        for index in first..=last {
            if self.chunks.contains_key(&index) || self.in_flight.contains(&index) {
                continue;
            }
            self.in_flight.insert(index);
            let range = self.chunk_range(index);
            requests.push(ChunkRequest {
                index,
                start: range.start,
                len: range.end - range.start,
            });
        }
        requests
    }

    /// Request a single chunk outside the focused window.
    pub fn request_chunk(&mut self, index: u64) -> Option<ChunkRequest> {
        if index >= self.chunk_count()
            || self.chunks.contains_key(&index)
            || self.in_flight.contains(&index)
        {
            return None;
        }
        self.in_flight.insert(index);
        let range = self.chunk_range(index);
        Some(ChunkRequest {
            index,
            start: range.start,
            len: range.end - range.start,
        })
    }

    /// Store a chunk that was requested. Unrequested chunks are ignored.
    pub fn accept(&mut self, index: u64, bytes: Vec<u8>) -> bool {
        if !self.in_flight.remove(&index) {
            return false;
        }
        self.chunks.insert(index, bytes);
        self.evict(index);
        true
    }

    /// Forget an in-flight request that failed so it can be retried.
    pub fn abandon(&mut self, index: u64) {
        self.in_flight.remove(&index);
    }

    /// Bytes of `range` if every chunk it touches is resident.
    pub fn read(&self, range: Range<u64>) -> Option<Vec<u8>> {
        let end = range.end.min(self.total_size);
        if range.start >= end {
            return Some(Vec::new());
        }
        let mut out = Vec::with_capacity((end - range.start) as usize);
        let mut pos = range.start;
        while pos < end {
            let index = pos / self.chunk_size;
            let chunk = self.chunks.get(&index)?;
            let chunk_start = index * self.chunk_size;
            let from = (pos - chunk_start) as usize;
            let to = ((end - chunk_start) as usize).min(chunk.len());
            if from >= to {
                return None;
            }
            out.extend_from_slice(&chunk[from..to]);
            pos = chunk_start + to as u64;
        }
        Some(out)
    }

    /// Resident chunk by index.
    pub fn chunk(&self, index: u64) -> Option<&[u8]> {
        self.chunks.get(&index).map(Vec::as_slice)
    }

    // Drop chunks farthest from the focused window until back under the cap.
    fn evict(&mut self, keep: u64) {
        while self.chunks.len() > self.max_resident {
            let focus = self.focus.clone();
            let victim = self
                .chunks
                .keys()
                .copied()
                .filter(|&i| i != keep && !focus.contains(&i))
                .max_by_key(|&i| {
                    if i < focus.start {
                        focus.start - i
                    } else {
                        i + 1 - focus.end
                    }
                });
            match victim {
                Some(i) => {
                    self.chunks.remove(&i);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
impl ContentBuffer {
    pub fn is_loaded(&self, index: u64) -> bool {
        self.chunks.contains_key(&index)
    }

    pub fn is_in_flight(&self, index: u64) -> bool {
        self.in_flight.contains(&index)
    }

    pub fn resident_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Loaded byte ranges, merged and in order.
    pub fn loaded_ranges(&self) -> Vec<Range<u64>> {
        let mut out: Vec<Range<u64>> = Vec::new();
        for &index in self.chunks.keys() {
            let range = self.chunk_range(index);
            match out.last_mut() {
                Some(last) if last.end == range.start => last.end = range.end,
                _ => out.push(range),
            }
        }
        out
    }
}

/// Incremental index of line start offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<u64>,
    indexed_to: u64,
    line_len: usize,
    complete: bool,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self {
            starts: vec![0],
            indexed_to: 0,
            line_len: 0,
            complete: false,
        }
    }
}

impl LineIndex {
    pub fn indexed_to(&self) -> u64 {
        self.indexed_to
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Scan `bytes` that start exactly where the previous feed ended.
    pub fn feed(&mut self, bytes: &[u8], total_size: u64) {
        for (i, &b) in bytes.iter().enumerate() {
            let pos = self.indexed_to + i as u64;
            if self.line_len >= MAX_LINE_BYTES && b & 0xc0 != 0x80 {
                self.starts.push(pos);
                self.line_len = 0;
            }
            if b == b'\n' {
                self.starts.push(pos + 1);
                self.line_len = 0;
            } else {
                self.line_len += 1;
            }
        }
        self.indexed_to += bytes.len() as u64;
        if self.indexed_to >= total_size {
            self.complete = true;
        }
    }

    /// Lines whose extent is fully known.
    pub fn line_count(&self) -> usize {
        let starts = self.starts.len();
        if !self.complete {
            return starts - 1;
        }
        match self.starts.last() {
            Some(&last) if last == self.indexed_to && self.indexed_to > 0 => starts - 1,
            _ => starts,
        }
    }

    /// Byte range of `line`, including its trailing newline.
    pub fn line_range(&self, line: usize) -> Option<Range<u64>> {
        if line >= self.line_count() {
            return None;
        }
        let start = self.starts[line];
        let end = self
            .starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.indexed_to);
        Some(start..end)
    }
}

/// A text file shown line by line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDocument {
    pub buffer: ContentBuffer,
    pub index: LineIndex,
}

impl TextDocument {
    pub fn new(buffer: ContentBuffer) -> Self {
        let mut doc = Self {
            buffer,
            index: LineIndex::default(),
        };
        doc.advance_index();
        doc
    }

    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Requests needed for the lines in `window`, plus the next unindexed
    /// chunk when the window reaches within `lookahead` lines of the end of
    /// the index.
    pub fn sync(&mut self, window: Range<usize>, lookahead: usize) -> Vec<ChunkRequest> {
        let mut requests = Vec::new();
        if let Some(bytes) = self.window_bytes(window.clone()) {
            requests.extend(self.buffer.ensure_loaded(bytes));
        }
        if !self.index.is_complete() && window.end + lookahead >= self.line_count() {
            let next = self.index.indexed_to() / self.buffer.chunk_size();
            requests.extend(self.buffer.request_chunk(next));
        }
        requests
    }

    /// Request the next chunk the index needs, if any.
    pub fn continue_indexing(&mut self) -> Option<ChunkRequest> {
        if self.index.is_complete() {
            return None;
        }
        let next = self.index.indexed_to() / self.buffer.chunk_size();
        self.buffer.request_chunk(next)
    }

    pub fn on_chunk(&mut self, index: u64, bytes: Vec<u8>) -> bool {
        if !self.buffer.accept(index, bytes) {
            return false;
        }
        self.advance_index();
        true
    }

    /// Text of each line in `window`; `None` while its bytes are not resident.
    pub fn lines(&self, window: Range<usize>) -> Vec<Option<String>> {
        window
            .map(|line| {
                let range = self.index.line_range(line)?;
                let bytes = self.buffer.read(range)?;
                let text = String::from_utf8_lossy(&bytes);
                Some(text.trim_end_matches(['\n', '\r']).to_string())
            })
            .collect()
    }

    fn window_bytes(&self, window: Range<usize>) -> Option<Range<u64>> {
        let count = self.line_count();
        if window.start >= count {
            return None;
        }
        let last = window.end.min(count).checked_sub(1)?;
        let start = self.index.line_range(window.start)?.start;
        let end = self.index.line_range(last)?.end;
        Some(start..end)
    }

    // Feed every contiguous resident chunk past the indexed prefix.
    fn advance_index(&mut self) {
        let total = self.buffer.total_size();
        if total == 0 {
            self.index.feed(&[], 0);
            return;
        }
        while !self.index.is_complete() {
            let pos = self.index.indexed_to();
            let chunk_size = self.buffer.chunk_size();
            let index = pos / chunk_size;
            let Some(chunk) = self.buffer.chunk(index) else {
                break;
            };
            let from = (pos - index * chunk_size) as usize;
            if from >= chunk.len() {
                break;
            }
            let bytes = chunk[from..].to_vec();
            self.index.feed(&bytes, total);
        }
    }
}

/// One row of a hex dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRow {
    pub offset: u64,
    pub bytes: Option<Vec<u8>>,
}

/// A binary file shown as a hex dump.
#[derive(Debug, Clone, PartialEq)]
pub struct HexDocument {
    pub buffer: ContentBuffer,
}

impl HexDocument {
    pub fn new(buffer: ContentBuffer) -> Self {
        Self { buffer }
    }

    pub fn row_count(&self) -> usize {
        self.buffer.total_size().div_ceil(HEX_ROW_BYTES) as usize
    }

    pub fn sync(&mut self, window: Range<usize>) -> Vec<ChunkRequest> {
        let start = window.start as u64 * HEX_ROW_BYTES;
        let end = window.end as u64 * HEX_ROW_BYTES;
        self.buffer.ensure_loaded(start..end)
    }

    pub fn on_chunk(&mut self, index: u64, bytes: Vec<u8>) -> bool {
        self.buffer.accept(index, bytes)
    }

    pub fn rows(&self, window: Range<usize>) -> Vec<HexRow> {
        let total = self.buffer.total_size();
        window
            .map(|row| {
                let offset = row as u64 * HEX_ROW_BYTES;
                let end = (offset + HEX_ROW_BYTES).min(total);
                HexRow {
                    offset,
                    bytes: self.buffer.read(offset..end),
                }
            })
            .collect()
    }
}
