//! Parameter types for encoding.
//!
//! These describe *what* image to produce. The [`backend`](super::backend)
//! implementations decide *how*.

use std::fmt;
use std::path::PathBuf;

/// A crop rectangle in ImageMagick geometry form, `WxH+X+Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropGeometry {
    /// Parse `WxH+X+Y`. The offset may be omitted (`WxH` means `+0+0`).
    pub fn parse(geometry: &str) -> Option<Self> {
        let (size, offset) = match geometry.find('+') {
            Some(i) => (&geometry[..i], Some(&geometry[i + 1..])),
            None => (geometry, None),
        };
        let (w, h) = size.split_once('x')?;
        let (x, y) = match offset {
            Some(offset) => offset.split_once('+')?,
            None => ("0", "0"),
        };
        let geometry = Self {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        };
        (geometry.width > 0 && geometry.height > 0).then_some(geometry)
    }
}

impl fmt::Display for CropGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Full description of one encode: raster shape, colours and destination.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub cols: u32,
    pub rows: u32,
    pub alpha: bool,
    /// Canvas background, 6 or 8 hex digits.
    pub background: String,
    /// Tile into side-by-side strips of this many rows.
    pub height: Option<u32>,
    /// Crop applied after tiling. Ignored without `height`.
    pub crop: Option<CropGeometry>,
    pub out: PathBuf,
}
