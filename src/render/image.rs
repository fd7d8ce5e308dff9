//! Raster images drawn with half-block cells: each terminal row shows two
//! pixel rows, the upper as foreground of `▀` and the lower as background.

use image::imageops::FilterType;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::FetchError;
use crate::nav::model::PixelGrid;

const UPPER_HALF: &str = "▀";

/// Decode `bytes` and shrink the result to fit `max_width` x `max_height`
/// pixels, keeping the aspect ratio. Never upscales.
pub fn decode(bytes: &[u8], max_width: u32, max_height: u32) -> Result<PixelGrid, FetchError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| FetchError::unsupported(format!("image decode failed: {e}")))?;
    let (max_width, max_height) = (max_width.max(1), max_height.max(1));
    let img = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Triangle)
    } else {
        img
    };
    let rgb = img.to_rgb8();
    Ok(PixelGrid {
        width: rgb.width(),
        height: rgb.height(),
        pixels: rgb.pixels().map(|p| p.0).collect(),
    })
}

fn rgb(pixel: [u8; 3]) -> Color {
    Color::Rgb(pixel[0], pixel[1], pixel[2])
}

/// One line per pair of pixel rows.
pub fn paint(grid: &PixelGrid) -> Vec<Line<'static>> {
    (0..grid.height.div_ceil(2))
        .map(|row| {
            let top = row * 2;
            let spans: Vec<Span<'static>> = (0..grid.width)
                .map(|x| {
                    let mut style = Style::default();
                    if let Some(upper) = grid.get(x, top) {
                        style = style.fg(rgb(upper));
                    }
                    if let Some(lower) = grid.get(x, top + 1) {
                        style = style.bg(rgb(lower));
                    }
                    Span::styled(UPPER_HALF, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let grid = decode(&png(4, 3), 80, 48).unwrap();
        assert_eq!((grid.width, grid.height), (4, 3));
        assert_eq!(grid.get(2, 1), Some([2, 1, 200]));
    }

    #[test]
    fn large_image_fits_bounds() {
        let grid = decode(&png(200, 100), 40, 40).unwrap();
        assert!(grid.width <= 40 && grid.height <= 40);
        assert_eq!(grid.width, 40);
        assert_eq!(grid.pixels.len(), (grid.width * grid.height) as usize);
    }

    #[test]
    fn corrupt_image_is_unsupported() {
        let mut bytes = png(4, 4);
        bytes.truncate(20);
        assert!(matches!(decode(&bytes, 10, 10), Err(FetchError::Unsupported(_))));
    }

    #[test]
    fn odd_height_leaves_last_background_unset() {
        let grid = PixelGrid {
            width: 1,
            height: 3,
            pixels: vec![[1, 1, 1], [2, 2, 2], [3, 3, 3]],
        };
        let lines = paint(&grid);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Rgb(1, 1, 1)));
        assert_eq!(lines[0].spans[0].style.bg, Some(Color::Rgb(2, 2, 2)));
        assert_eq!(lines[1].spans[0].style.bg, None);
    }
}
