//! Renderers behind the content router.
//!
//! `image`, `archive` and `plist` turn a whole payload into a
//! [`Decoded`](crate::nav::model::Decoded) on the blocking pool. `text`,
//! `hex` and `table` style what the navigator has resident at draw time.

pub mod archive;
pub mod hex;
pub mod image;
pub mod plist;
pub mod table;
pub mod text;

use crate::error::FetchError;
use crate::nav::model::Decoded;
use crate::nav::router::RenderKind;

/// Run the whole-payload renderer for `kind`.
///
/// `width` and `height` bound the image output, in terminal cells and pixel
/// rows respectively.
pub fn decode(
    kind: RenderKind,
    bytes: &[u8],
    name: &str,
    width: u16,
    height: u16,
) -> Result<Decoded, FetchError> {
    match kind {
        RenderKind::Image => image::decode(bytes, u32::from(width), u32::from(height))
            .map(Decoded::Image),
        RenderKind::Archive => archive::list(bytes).map(Decoded::Lines),
        RenderKind::PropertyList => plist::normalize(bytes).map(Decoded::Lines),
        other => Err(FetchError::unsupported(format!(
            "{} is not decoded whole ({name})",
            other.label()
        ))),
    }
}
