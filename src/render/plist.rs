use std::io::Cursor;

use plist::Value;

use crate::error::FetchError;

/// Parse a binary or XML property list and re-emit it as indented XML.
pub fn normalize(bytes: &[u8]) -> Result<Vec<String>, FetchError> {
    let value = Value::from_reader(Cursor::new(bytes))
        .map_err(|e| FetchError::unsupported(format!("property list: {e}")))?;
    let mut out = Vec::new();
    value
        .to_writer_xml(&mut out)
        .map_err(|e| FetchError::unsupported(format!("property list: {e}")))?;
    Ok(String::from_utf8_lossy(&out)
        .lines()
        .map(str::to_string)
        .collect())
}
