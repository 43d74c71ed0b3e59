//! Encoder trait and shared error type.
//!
//! The [`RasterEncoder`] trait turns colour rows into an image file. The
//! default implementation is [`MagickEncoder`](super::magick::MagickEncoder),
//! which pipes raw pixels into ImageMagick. [`NativeEncoder`](super::native::NativeEncoder)
//! does the same work in-process.

use super::params::EncodeParams;
use crate::pixels::{PixelError, PixelPacker};
use crate::types::Row;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pixel(#[from] PixelError),
    #[error("Nothing to encode: the raster has no rows")]
    Empty,
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Encodes a raster of colour rows into an image file.
pub trait RasterEncoder {
    fn encode(
        &self,
        rows: &[Row],
        params: &EncodeParams,
        packer: &mut PixelPacker,
    ) -> Result<(), EncodeError>;
}
