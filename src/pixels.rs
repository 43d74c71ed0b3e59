//! Colour rows → raw pixel bytes.
//!
//! - [`pad`] fixes a row to the output width.
//! - [`PixelPacker`] turns `rrggbb[aa]` strings into 3- or 4-byte pixels,
//!   memoised for the lifetime of one run since it is called once per pixel.
//! - [`blit`] streams rows as headerless, row-major raw bytes.

use crate::types::{Color, Row};
use std::collections::HashMap;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid colour '{0}': expected 6 or 8 hex digits")]
    InvalidColor(String),
}

/// Pad `colors` with `fill` up to `cols` entries, or keep the first `cols`.
pub fn pad(mut colors: Vec<Color>, cols: usize, fill: &str) -> Vec<Color> {
    if colors.len() < cols {
        colors.resize(cols, fill.to_string());
    } else {
        colors.truncate(cols);
    }
    colors
}

/// Parse a colour into pixel bytes without caching.
///
/// RGB input gains an opaque alpha byte in alpha mode; RGBA input loses its
/// alpha byte otherwise.
pub fn pack_color(color: &str, alpha: bool) -> Result<Vec<u8>, PixelError> {
    let invalid = || PixelError::InvalidColor(color.to_string());
    if !matches!(color.len(), 6 | 8) || !color.is_ascii() {
        return Err(invalid());
    }
    let mut bytes = (0..color.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&color[i..i + 2], 16).map_err(|_| invalid()))
        .collect::<Result<Vec<u8>, _>>()?;
    if alpha && bytes.len() < 4 {
        bytes.push(255);
    }
    if !alpha && bytes.len() > 3 {
        bytes.truncate(3);
    }
    Ok(bytes)
}

/// Memoising colour packer, one cache per alpha mode.
#[derive(Debug, Default)]
pub struct PixelPacker {
    cache: [HashMap<String, Vec<u8>>; 2],
}

impl PixelPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pack(&mut self, color: &str, alpha: bool) -> Result<&[u8], PixelError> {
        let cache = &mut self.cache[usize::from(alpha)];
        if !cache.contains_key(color) {
            let pixel = pack_color(color, alpha)?;
            cache.insert(color.to_string(), pixel);
        }
        Ok(&cache[color])
    }

    /// Number of distinct colours packed so far, across both modes.
    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.cache.iter().map(HashMap::len).sum()
    }
}

/// Write `rows` to `out` as raw pixels. Returns the number of bytes written.
pub fn blit(
    rows: &[Row],
    alpha: bool,
    packer: &mut PixelPacker,
    out: &mut dyn Write,
) -> Result<u64, PixelError> {
    let mut written = 0u64;
    for row in rows {
        for color in row {
            let pixel = packer.pack(color, alpha)?;
            out.write_all(pixel)?;
            written += pixel.len() as u64;
        }
    }
    out.flush()?;
    Ok(written)
}

/// First `limit` rows, or all of them when no limit is set.
pub fn top(rows: &[Row], limit: Option<usize>) -> &[Row] {
    match limit {
        Some(n) => &rows[..n.min(rows.len())],
        None => rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(list: &[&str]) -> Vec<Color> {
        list.iter().map(|c| c.to_string()).collect()
    }

    // =========================================================================
    // Padding
    // =========================================================================

    #[test]
    fn pad_appends_fill() {
        let padded = pad(colors(&["000000"]), 3, "ffffff");
        assert_eq!(padded, colors(&["000000", "ffffff", "ffffff"]));
    }

    #[test]
    fn pad_truncates_to_prefix() {
        let padded = pad(colors(&["aa0000", "bb0000", "cc0000"]), 2, "ffffff");
        assert_eq!(padded, colors(&["aa0000", "bb0000"]));
    }

    #[test]
    fn pad_length_always_matches_cols() {
        for cols in 0..6 {
            for len in 0..6 {
                let input = vec!["123456".to_string(); len];
                let padded = pad(input, cols, "ffffff");
                assert_eq!(padded.len(), cols);
                if len < cols {
                    assert!(padded[len..].iter().all(|c| c == "ffffff"));
                }
            }
        }
    }

    #[test]
    fn pad_zero_cols_is_empty() {
        assert!(pad(colors(&["000000"]), 0, "ffffff").is_empty());
    }

    // =========================================================================
    // Packing
    // =========================================================================

    #[test]
    fn pack_rgb_without_alpha() {
        assert_eq!(pack_color("ff9900", false).unwrap(), vec![255, 153, 0]);
    }

    #[test]
    fn pack_rgb_with_alpha_adds_opaque() {
        assert_eq!(pack_color("ff9900", true).unwrap(), vec![255, 153, 0, 255]);
    }

    #[test]
    fn pack_rgba_without_alpha_drops_alpha() {
        assert_eq!(pack_color("ff990080", false).unwrap(), vec![255, 153, 0]);
    }

    #[test]
    fn pack_rgba_with_alpha_keeps_alpha() {
        assert_eq!(pack_color("ff990080", true).unwrap(), vec![255, 153, 0, 128]);
    }

    #[test]
    fn pack_rejects_malformed() {
        assert!(matches!(
            pack_color("fff", false),
            Err(PixelError::InvalidColor(_))
        ));
        assert!(pack_color("gg0000", false).is_err());
        assert!(pack_color("ff99é0", false).is_err());
    }

    #[test]
    fn packer_memoises_per_mode() {
        let mut packer = PixelPacker::new();
        let first = packer.pack("ff9900", false).unwrap().to_vec();
        let second = packer.pack("ff9900", false).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(packer.cached(), 1);

        assert_eq!(packer.pack("ff9900", true).unwrap(), &[255, 153, 0, 255]);
        assert_eq!(packer.cached(), 2);
    }

    // =========================================================================
    // Blit
    // =========================================================================

    #[test]
    fn blit_is_row_major() {
        let rows = vec![colors(&["010203", "040506"]), colors(&["070809", "0a0b0c"])];
        let mut out = Vec::new();
        let written = blit(&rows, false, &mut PixelPacker::new(), &mut out).unwrap();
        assert_eq!(written, 12);
        assert_eq!(out, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn blit_alpha_writes_four_bytes_per_pixel() {
        let rows = vec![colors(&["000000", "ffffff80"])];
        let mut out = Vec::new();
        blit(&rows, true, &mut PixelPacker::new(), &mut out).unwrap();
        assert_eq!(out, vec![0, 0, 0, 255, 255, 255, 255, 128]);
    }

    #[test]
    fn top_limits_rows() {
        let rows = vec![colors(&["000000"]); 5];
        assert_eq!(top(&rows, Some(2)).len(), 2);
        assert_eq!(top(&rows, Some(10)).len(), 5);
        assert_eq!(top(&rows, None).len(), 5);
    }
}
