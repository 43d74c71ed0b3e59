//! Image encoding for the magick phase.
//!
//! | Encoder | How |
//! |---|---|
//! | [`MagickEncoder`] (default) | raw pixels piped into ImageMagick `convert` |
//! | [`NativeEncoder`] | `image` crate, PNG written in-process |
//!
//! The module is split into:
//! - **Layout**: pure tiling/crop math on colour rows (unit testable)
//! - **Parameters**: what to encode ([`EncodeParams`], [`CropGeometry`])
//! - **Backend**: the [`RasterEncoder`] trait and its implementations

pub mod backend;
mod layout;
pub mod magick;
pub mod native;
mod params;

pub use backend::{EncodeError, RasterEncoder};
pub use magick::MagickEncoder;
pub use native::NativeEncoder;
pub use params::{CropGeometry, EncodeParams};

use crate::config::{EncoderKind, RunConfig};

/// The encoder selected by `output.encoder`.
pub fn encoder_for(kind: EncoderKind) -> Box<dyn RasterEncoder> {
    match kind {
        EncoderKind::Magick => Box::new(MagickEncoder::new()),
        EncoderKind::Native => Box::new(NativeEncoder::new()),
    }
}

/// Encode parameters for a raster of `rows` rows under `config`.
pub fn params_for(config: &RunConfig, rows: usize) -> EncodeParams {
    EncodeParams {
        cols: config.render.cols as u32,
        rows: rows as u32,
        alpha: config.render.alpha,
        background: config.render.bg.clone(),
        height: config.output.height,
        crop: config
            .output
            .crop
            .as_deref()
            .and_then(CropGeometry::parse),
        out: config.output.out.clone(),
    }
}
