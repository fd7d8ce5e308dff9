//! Archive listings. Zip goes through `zip`, tar and gzip-compressed tar
//! through `tar` + `flate2`. Other containers are reported unsupported.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;

use crate::error::FetchError;

fn listing_line(size: u64, name: &str, is_dir: bool) -> String {
    if is_dir {
        format!("{:>12}  {name}", "-")
    } else {
        format!("{size:>12}  {name}")
    }
}

fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06")
}

fn is_tar(bytes: &[u8]) -> bool {
    bytes.len() >= 262 && &bytes[257..262] == b"ustar"
}

/// One line per member: size (or `-` for directories) then path, followed
/// by a summary line.
pub fn list(bytes: &[u8]) -> Result<Vec<String>, FetchError> {
    let mut lines = if is_zip(bytes) {
        list_zip(bytes)?
    } else if bytes.starts_with(b"\x1f\x8b") {
        list_tar(GzDecoder::new(bytes))?
    } else if is_tar(bytes) {
        list_tar(bytes)?
    } else {
        return Err(FetchError::unsupported("archive container not recognized"));
    };
    let summary = format!("{} entries", lines.len());
    lines.push(String::new());
    lines.push(summary);
    Ok(lines)
}

fn list_zip(bytes: &[u8]) -> Result<Vec<String>, FetchError> {
    let bad = |e: zip::result::ZipError| FetchError::unsupported(format!("zip: {e}"));
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(bad)?;
    let mut lines = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(bad)?;
        lines.push(listing_line(file.size(), file.name(), file.is_dir()));
    }
    Ok(lines)
}

fn list_tar<R: Read>(reader: R) -> Result<Vec<String>, FetchError> {
    let bad = |e: std::io::Error| FetchError::unsupported(format!("tar: {e}"));
    let mut archive = tar::Archive::new(reader);
    let mut lines = Vec::new();
    for entry in archive.entries().map_err(bad)? {
        let entry = entry.map_err(bad)?;
        let header = entry.header();
        let name = entry.path().map_err(bad)?.to_string_lossy().into_owned();
        let size = header.size().map_err(bad)?;
        lines.push(listing_line(size, &name, header.entry_type().is_dir()));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_fixture() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory("docs/", options).unwrap();
        writer.start_file("docs/readme.txt", options).unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn tar_fixture() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let data = b"0123456789";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "logs/app.log", &data[..])
            .unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn lists_zip_members() {
        let lines = list(&zip_fixture()).unwrap();
        assert_eq!(lines[0], format!("{:>12}  docs/", "-"));
        assert_eq!(lines[1], format!("{:>12}  docs/readme.txt", 5));
        assert_eq!(lines.last().unwrap(), "2 entries");
    }

    #[test]
    fn lists_tar_members() {
        let lines = list(&tar_fixture()).unwrap();
        assert_eq!(lines[0], format!("{:>12}  logs/app.log", 10));
    }

    #[test]
    fn lists_gzipped_tar_members() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_fixture()).unwrap();
        let lines = list(&encoder.finish().unwrap()).unwrap();
        assert_eq!(lines[0], format!("{:>12}  logs/app.log", 10));
    }

    #[test]
    fn truncated_zip_is_unsupported() {
        let mut bytes = zip_fixture();
        bytes.truncate(30);
        assert!(matches!(list(&bytes), Err(FetchError::Unsupported(_))));
    }

    #[test]
    fn seven_zip_is_unsupported() {
        assert!(list(b"7z\xbc\xaf\x27\x1c rest").is_err());
    }
}
