//! ImageMagick encoder.
//!
//! Spawns `convert` with the raster's geometry and streams raw pixels into its
//! stdin:
//!
//! ```text
//! convert -size 100x4000 -background #ffffff -depth 8 rgb:- \
//!         -crop x1000 +append -crop 400x1000+0+0 textpixels.png
//! ```
//!
//! `convert` writes nothing useful to stdout, so it is discarded; stderr is
//! inherited so its diagnostics reach the user.

use super::backend::{EncodeError, RasterEncoder};
use super::params::EncodeParams;
use crate::pixels::{PixelPacker, blit};
use crate::types::Row;
use std::io::BufWriter;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct MagickEncoder {
    program: String,
}

impl MagickEncoder {
    pub fn new() -> Self {
        Self::with_program("convert")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one encode.
    pub fn convert_args(params: &EncodeParams) -> Vec<String> {
        let background: String = params.background.chars().take(6).collect();
        let format = if params.alpha { "rgba:-" } else { "rgb:-" };
        let mut args = vec![
            "-size".to_string(),
            format!("{}x{}", params.cols, params.rows),
            "-background".to_string(),
            format!("#{background}"),
            "-depth".to_string(),
            "8".to_string(),
            format.to_string(),
        ];
        if let Some(height) = params.height {
            args.push("-crop".into());
            args.push(format!("x{height}"));
            args.push("+append".into());
            if let Some(crop) = params.crop {
                args.push("-crop".into());
                args.push(crop.to_string());
            }
        }
        args.push(params.out.to_string_lossy().into_owned());
        args
    }
}

impl Default for MagickEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterEncoder for MagickEncoder {
    fn encode(
        &self,
        rows: &[Row],
        params: &EncodeParams,
        packer: &mut PixelPacker,
    ) -> Result<(), EncodeError> {
        if rows.is_empty() {
            return Err(EncodeError::Empty);
        }
        let args = Self::convert_args(params);
        log::debug!("{} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| EncodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Write first, but report the exit status ahead of a broken pipe:
        // if convert died early its status explains why the write failed.
        let written = match child.stdin.take() {
            Some(stdin) => {
                let mut writer = BufWriter::new(stdin);
                blit(rows, params.alpha, packer, &mut writer)
            }
            None => Ok(0),
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(EncodeError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        let written = written?;
        log::debug!("wrote {written} bytes to {}", self.program);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::CropGeometry;

    fn params() -> EncodeParams {
        EncodeParams {
            cols: 100,
            rows: 4000,
            alpha: false,
            background: "ffffff".into(),
            height: None,
            crop: None,
            out: "out.png".into(),
        }
    }

    #[test]
    fn args_plain() {
        assert_eq!(
            MagickEncoder::convert_args(&params()),
            vec![
                "-size", "100x4000", "-background", "#ffffff", "-depth", "8", "rgb:-", "out.png"
            ]
        );
    }

    #[test]
    fn args_alpha_uses_rgba_and_six_digit_background() {
        let mut p = params();
        p.alpha = true;
        p.background = "11223344".into();
        let args = MagickEncoder::convert_args(&p);
        assert_eq!(args[3], "#112233");
        assert_eq!(args[6], "rgba:-");
    }

    #[test]
    fn args_tiling_and_crop() {
        let mut p = params();
        p.height = Some(1000);
        p.crop = CropGeometry::parse("400x1000+0+0");
        let args = MagickEncoder::convert_args(&p);
        assert_eq!(
            &args[7..],
            &["-crop", "x1000", "+append", "-crop", "400x1000+0+0", "out.png"]
        );
    }

    #[test]
    fn args_crop_needs_height() {
        let mut p = params();
        p.crop = CropGeometry::parse("400x1000+0+0");
        assert!(!MagickEncoder::convert_args(&p).contains(&"-crop".to_string()));
    }

    #[test]
    fn empty_raster_is_error() {
        let result = MagickEncoder::new().encode(&[], &params(), &mut PixelPacker::new());
        assert!(matches!(result, Err(EncodeError::Empty)));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let rows = vec![vec!["000000".to_string()]];
        let result = MagickEncoder::with_program("textpixels-no-such-convert").encode(
            &rows,
            &params(),
            &mut PixelPacker::new(),
        );
        assert!(matches!(result, Err(EncodeError::Spawn { .. })));
    }
}
