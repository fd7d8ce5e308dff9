//! Content classification and renderer selection.
//!
//! Classification looks at a byte sample first and the file name last. The
//! decision order is fixed:
//!
//! 1. SQLite signature → `Database`
//! 2. binary or XML property list → `PropertyList`
//! 3. archive magic bytes → `Archive`
//! 4. raster image magic bytes → `Image`
//! 5. SVG extension or `<svg` sniff → `Vector`
//! 6. control-byte ratio → `Text` or `Binary`, extension breaks ties

use std::path::Path;

/// Bytes of the sample scanned for an `<svg` or `<plist` marker.
const SNIFF_WINDOW: usize = 1024;
/// At or below this ratio of non-printable bytes the sample is text.
const TEXT_RATIO: f64 = 0.05;
/// At or above this ratio the sample is binary regardless of extension.
const BINARY_RATIO: f64 = 0.30;

/// Renderer that handles a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Text,
    Binary,
    Image,
    Vector,
    Archive,
    Database,
    PropertyList,
}

impl RenderKind {
    pub fn label(&self) -> &'static str {
        match self {
            RenderKind::Text => "text",
            RenderKind::Binary => "binary",
            RenderKind::Image => "image",
            RenderKind::Vector => "vector image",
            RenderKind::Archive => "archive",
            RenderKind::Database => "database",
            RenderKind::PropertyList => "property list",
        }
    }

    /// Whether the renderer needs the whole payload rather than chunks.
    pub fn needs_whole_payload(&self) -> bool {
        matches!(
            self,
            RenderKind::Image | RenderKind::Archive | RenderKind::PropertyList
        )
    }
}

/// Classify a payload from its leading bytes and its name.
pub fn classify(sample: &[u8], name: &str) -> RenderKind {
    if is_sqlite(sample) {
        return RenderKind::Database;
    }
    if is_property_list(sample) {
        return RenderKind::PropertyList;
    }
    if is_archive(sample) {
        return RenderKind::Archive;
    }
    if is_raster_image(sample) {
        return RenderKind::Image;
    }
    if is_vector_image(sample, name) {
        return RenderKind::Vector;
    }
    text_or_binary(sample, name)
}

/// Renderer to use when `failed` could not handle the payload.
///
/// Image and archive payloads always degrade to the hex view. A property
/// list that cannot be normalized is re-judged by the byte heuristic.
pub fn fallback(failed: RenderKind, sample: &[u8], name: &str) -> RenderKind {
    match failed {
        RenderKind::Image | RenderKind::Archive | RenderKind::Database => RenderKind::Binary,
        RenderKind::PropertyList | RenderKind::Vector => text_or_binary(sample, name),
        RenderKind::Text | RenderKind::Binary => RenderKind::Binary,
    }
}

/// Syntax name hint for the text highlighter, from extension or content.
pub fn syntax_hint(kind: RenderKind, name: &str) -> Option<&'static str> {
    match kind {
        RenderKind::PropertyList | RenderKind::Vector => Some("XML"),
        RenderKind::Text => syntax_for_extension(extension(name).as_deref()),
        _ => None,
    }
}

fn is_sqlite(sample: &[u8]) -> bool {
    sample.starts_with(b"SQLite format 3\0")
}

fn is_property_list(sample: &[u8]) -> bool {
    if sample.starts_with(b"bplist") {
        return true;
    }
    let head = strip_text_preamble(sample);
    if !(head.starts_with(b"<?xml") || head.starts_with(b"<!DOCTYPE") || head.starts_with(b"<plist"))
    {
        return false;
    }
    let window = &head[..head.len().min(SNIFF_WINDOW)];
    contains(window, b"<!DOCTYPE plist") || contains(window, b"<plist")
}

fn is_archive(sample: &[u8]) -> bool {
    const SIGNATURES: &[&[u8]] = &[
        b"PK\x03\x04",
        b"PK\x05\x06",
        b"PK\x07\x08",
        b"\x1f\x8b",
        b"7z\xbc\xaf\x27\x1c",
        b"Rar!\x1a\x07",
        b"BZh",
        b"\xfd7zXZ\x00",
    ];
    if SIGNATURES.iter().any(|sig| sample.starts_with(sig)) {
        return true;
    }
    // POSIX tar keeps its magic at offset 257.
    sample.len() >= 262 && &sample[257..262] == b"ustar"
}

fn is_raster_image(sample: &[u8]) -> bool {
    const SIGNATURES: &[&[u8]] = &[
        b"\x89PNG",
        b"\xff\xd8\xff",
        b"GIF87a",
        b"GIF89a",
        b"II*\x00",
        b"MM\x00*",
        b"\x00\x00\x01\x00",
    ];
    if SIGNATURES.iter().any(|sig| sample.starts_with(sig)) {
        return true;
    }
    if sample.len() >= 12 && &sample[0..4] == b"RIFF" && &sample[8..12] == b"WEBP" {
        return true;
    }
    // ISO base media with an image brand (HEIC/HEIF/AVIF).
    if sample.len() >= 12 && &sample[4..8] == b"ftyp" {
        let brand = &sample[8..12];
        return matches!(brand, b"heic" | b"heix" | b"mif1" | b"avif");
    }
    // BMP: "BM" is short, so also require the zeroed reserved words.
    sample.len() >= 10 && &sample[0..2] == b"BM" && sample[6..10] == [0u8; 4]
}

fn is_vector_image(sample: &[u8], name: &str) -> bool {
    if extension(name).as_deref() == Some("svg") {
        return true;
    }
    let head = strip_text_preamble(sample);
    let window = &head[..head.len().min(SNIFF_WINDOW)];
    head.starts_with(b"<") && contains(window, b"<svg")
}

fn text_or_binary(sample: &[u8], name: &str) -> RenderKind {
    let ratio = non_printable_ratio(sample);
    if ratio <= TEXT_RATIO {
        RenderKind::Text
    } else if ratio >= BINARY_RATIO {
        RenderKind::Binary
    } else if is_text_extension(extension(name).as_deref()) {
        RenderKind::Text
    } else {
        RenderKind::Binary
    }
}

/// Share of bytes that would not print as text.
///
/// Bytes above 0x7f count as printable only when the sample is valid UTF-8
/// (a multi-byte sequence cut off by the sample end is tolerated).
pub fn non_printable_ratio(sample: &[u8]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let utf8 = is_mostly_utf8(sample);
    let bad = sample
        .iter()
        .filter(|&&b| match b {
            b'\t' | b'\n' | b'\r' | 0x0c | 0x1b => false,
            0x00..=0x1f | 0x7f => true,
            0x80..=0xff => !utf8,
            _ => false,
        })
        .count();
    bad as f64 / sample.len() as f64
}

fn is_mostly_utf8(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && sample.len() - e.valid_up_to() < 4,
    }
}

fn strip_text_preamble(sample: &[u8]) -> &[u8] {
    let sample = sample.strip_prefix(b"\xef\xbb\xbf").unwrap_or(sample);
    let start = sample
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(sample.len());
    &sample[start..]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_text_extension(ext: Option<&str>) -> bool {
    matches!(
        ext,
        Some(
            "txt" | "log" | "md" | "json" | "xml" | "html" | "htm" | "css" | "js" | "ts" | "swift"
                | "m" | "h" | "c" | "cpp" | "rs" | "py" | "sh" | "yaml" | "yml" | "toml" | "csv"
                | "ini" | "cfg" | "conf" | "strings" | "sql" | "plist" | "entitlements"
        )
    )
}

/// Syntax name for the highlighter, keyed by lowercase extension.
pub fn syntax_for_extension(ext: Option<&str>) -> Option<&'static str> {
    let name = match ext? {
        "swift" => "Swift",
        "m" | "mm" => "Objective-C",
        "h" | "c" => "C",
        "cpp" | "hpp" | "cc" => "C++",
        "rs" => "Rust",
        "py" => "Python",
        "js" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "sh" | "bash" | "zsh" => "Bash",
        "sql" => "SQL",
        "md" | "markdown" => "Markdown",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "xml" | "plist" | "entitlements" | "storyboard" | "xib" => "XML",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_magic_beats_misleading_extension() {
        assert_eq!(classify(&[0x89, b'P', b'N', b'G'], "data.bin"), RenderKind::Image);
    }

    #[test]
    fn sqlite_signature_is_database() {
        let mut sample = b"SQLite format 3\0".to_vec();
        sample.extend_from_slice(&[0x10, 0x00, 0x01, 0x01]);
        assert_eq!(classify(&sample, "Cache.db-wal"), RenderKind::Database);
    }

    #[test]
    fn database_wins_over_everything_else() {
        // Named like an image, looks like a database.
        assert_eq!(
            classify(b"SQLite format 3\0rest", "photo.png"),
            RenderKind::Database
        );
    }

    #[test]
    fn binary_plist_detected() {
        assert_eq!(classify(b"bplist00\xd1\x01\x02", "prefs"), RenderKind::PropertyList);
    }

    #[test]
    fn xml_plist_detected() {
        let xml = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n<plist version=\"1.0\"><dict/></plist>";
        assert_eq!(classify(xml, "Info.plist"), RenderKind::PropertyList);
    }

    #[test]
    fn plain_xml_is_text() {
        let xml = b"<?xml version=\"1.0\"?>\n<root><child/></root>\n";
        assert_eq!(classify(xml, "layout.xml"), RenderKind::Text);
    }

    #[test]
    fn zip_by_magic_without_extension() {
        assert_eq!(classify(b"PK\x03\x04\x14\x00", "payload"), RenderKind::Archive);
    }

    #[test]
    fn tar_magic_at_offset() {
        let mut sample = vec![0u8; 512];
        sample[..8].copy_from_slice(b"file.txt");
        sample[257..262].copy_from_slice(b"ustar");
        assert_eq!(classify(&sample, "bundle"), RenderKind::Archive);
    }

    #[test]
    fn other_raster_signatures() {
        assert_eq!(classify(b"\xff\xd8\xff\xe0", "x"), RenderKind::Image);
        assert_eq!(classify(b"GIF89a....", "x"), RenderKind::Image);
        assert_eq!(classify(b"RIFF\x00\x00\x00\x00WEBPVP8 ", "x"), RenderKind::Image);
        assert_eq!(
            classify(b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00", "IMG_0001"),
            RenderKind::Image
        );
    }

    #[test]
    fn bm_prefix_alone_is_not_an_image() {
        assert_eq!(classify(b"BMW owners club\n", "notes"), RenderKind::Text);
    }

    #[test]
    fn svg_by_extension_and_sniff() {
        assert_eq!(classify(b"whatever", "icon.svg"), RenderKind::Vector);
        let svg = b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert_eq!(classify(svg, "icon"), RenderKind::Vector);
    }

    #[test]
    fn extensionless_text() {
        assert_eq!(classify(b"hello world\nsecond line\n", "README"), RenderKind::Text);
    }

    #[test]
    fn utf8_text_is_text() {
        assert_eq!(
            classify("héllo wörld ✓ 日本語\n".as_bytes(), "notes"),
            RenderKind::Text
        );
    }

    #[test]
    fn truncated_utf8_tail_is_tolerated() {
        let mut sample = "日本語".as_bytes().to_vec();
        sample.pop();
        assert_eq!(non_printable_ratio(&sample), 0.0);
    }

    #[test]
    fn control_heavy_sample_is_binary() {
        let sample: Vec<u8> = (0u8..=255).collect();
        assert_eq!(classify(&sample, "notes.txt"), RenderKind::Binary);
    }

    #[test]
    fn extension_breaks_ambiguous_ties() {
        // 10% control bytes: neither clearly text nor clearly binary.
        let mut sample = vec![b'a'; 90];
        sample.extend_from_slice(&[0x01; 10]);
        assert_eq!(classify(&sample, "server.log"), RenderKind::Text);
        assert_eq!(classify(&sample, "blob"), RenderKind::Binary);
    }

    #[test]
    fn empty_sample_is_text() {
        assert_eq!(classify(b"", "empty"), RenderKind::Text);
    }

    #[test]
    fn fallback_chain() {
        assert_eq!(fallback(RenderKind::Image, b"\x89PNG", "a.png"), RenderKind::Binary);
        assert_eq!(fallback(RenderKind::Archive, b"PK\x03\x04", "a.zip"), RenderKind::Binary);
        assert_eq!(
            fallback(RenderKind::PropertyList, b"<?xml?><plist>", "a.plist"),
            RenderKind::Text
        );
        assert_eq!(
            fallback(RenderKind::PropertyList, b"bplist00\x00\x01\x02\x03\x04", "a"),
            RenderKind::Binary
        );
    }

    #[test]
    fn syntax_hints() {
        assert_eq!(syntax_hint(RenderKind::Text, "main.swift"), Some("Swift"));
        assert_eq!(syntax_hint(RenderKind::PropertyList, "Info.plist"), Some("XML"));
        assert_eq!(syntax_hint(RenderKind::Text, "README"), None);
        assert_eq!(syntax_hint(RenderKind::Binary, "a.json"), None);
    }
}
