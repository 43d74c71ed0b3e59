//! In-process encoder using the `image` crate.
//!
//! Produces the same picture as the ImageMagick pipeline without an external
//! process: rows are tiled and cropped by [`layout`](super::layout), packed
//! with the shared [`blit`] routine, and saved in the format implied by the
//! output extension.

use super::backend::{EncodeError, RasterEncoder};
use super::layout;
use super::params::EncodeParams;
use crate::pixels::{PixelPacker, blit, pad};
use crate::types::Row;
use image::{DynamicImage, RgbImage, RgbaImage};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEncoder;

impl NativeEncoder {
    pub fn new() -> Self {
        Self
    }

    /// The rows that end up in the image, after tiling and cropping.
    pub fn arrange(rows: &[Row], params: &EncodeParams) -> Vec<Row> {
        let cols = params.cols as usize;
        let rows: Vec<Row> = rows
            .iter()
            .map(|row| pad(row.clone(), cols, &params.background))
            .collect();
        let Some(height) = params.height else {
            return rows;
        };
        let tiled = layout::tile(&rows, cols, height as usize, &params.background);
        match params.crop {
            Some(geometry) => layout::crop(&tiled, geometry),
            None => tiled,
        }
    }
}

impl RasterEncoder for NativeEncoder {
    fn encode(
        &self,
        rows: &[Row],
        params: &EncodeParams,
        packer: &mut PixelPacker,
    ) -> Result<(), EncodeError> {
        let arranged = Self::arrange(rows, params);
        let (Some(first), height) = (arranged.first(), arranged.len()) else {
            return Err(EncodeError::Empty);
        };
        let width = first.len() as u32;
        if width == 0 {
            return Err(EncodeError::Empty);
        }

        let mut raw = Vec::new();
        blit(&arranged, params.alpha, packer, &mut raw)?;
        let height = height as u32;
        let image = if params.alpha {
            RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
        };
        let Some(image) = image else {
            return Err(EncodeError::Empty);
        };
        log::debug!("saving {width}x{height} image to {}", params.out.display());
        image.save(&params.out)?;
        Ok(())
    }
}
