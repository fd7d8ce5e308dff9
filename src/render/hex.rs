use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::nav::chunk::{HexRow, HEX_ROW_BYTES};

/// `00000010  48 65 6c 6c 6f 0a ...  |Hello.|`
pub fn format_row(offset: u64, bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(HEX_ROW_BYTES as usize * 3 + 1);
    for i in 0..HEX_ROW_BYTES as usize {
        if i == 8 {
            hex.push(' ');
        }
        match bytes.get(i) {
            Some(b) => hex.push_str(&format!("{b:02x} ")),
            None => hex.push_str("   "),
        }
    }
    let ascii: String = bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect();
    format!("{offset:08x}  {hex} |{ascii}|")
}

/// Styled dump lines; rows whose bytes are not resident show only the
/// offset.
pub fn lines(rows: &[HexRow], offset_fg: Color, fg: Color) -> Vec<Line<'static>> {
    rows.iter()
        .map(|row| match &row.bytes {
            Some(bytes) => {
                let text = format_row(row.offset, bytes);
                let (offset, rest) = text.split_at(8);
                Line::from(vec![
                    Span::styled(offset.to_string(), Style::default().fg(offset_fg)),
                    Span::styled(rest.to_string(), Style::default().fg(fg)),
                ])
            }
            None => Line::from(vec![
                Span::styled(format!("{:08x}", row.offset), Style::default().fg(offset_fg)),
                Span::styled("  …", Style::default().fg(offset_fg)),
            ]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_row() {
        let row = format_row(16, b"Hello, world!\n\x00\xff");
        assert_eq!(
            row,
            "00000010  48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 0a 00 ff  |Hello, world!...|"
        );
    }

    #[test]
    fn short_tail_row_is_padded() {
        let row = format_row(0x20, b"ab");
        assert!(row.starts_with("00000020  61 62 "));
        assert!(row.ends_with(" |ab|"));
        assert_eq!(row.len(), format_row(0, &[0u8; 16]).len() - 14);
    }

    #[test]
    fn pending_rows_show_offset() {
        let rows = vec![HexRow {
            offset: 0x30,
            bytes: None,
        }];
        let out = lines(&rows, Color::DarkGray, Color::White);
        let text: String = out[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "00000030  …");
    }
}
