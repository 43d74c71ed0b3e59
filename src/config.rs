//! Run configuration.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! `textpixels.toml`, which is in turn overridden by command-line flags. All
//! layers are merged as TOML values before being deserialised, so every layer
//! may be sparse.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! phases = ["findfiles", "identify", "htmlize", "pixelate", "magick"]
//! # finish = "pixelate"     # Stop after this phase
//!
//! [input]
//! # files_from = "."        # Directory, list file, or omit for stdin
//! discovery = "git"         # "git" (tracked files) or "walk"
//!
//! [render]
//! cols = 100                # Pixels per source line
//! fg = "000000"             # Default foreground
//! bg = "ffffff"             # Default background
//! alpha = false             # Emit RGBA instead of RGB
//! # style = "monokai"       # Highlighter theme
//! lang_as = ["color"]       # Per-language colour: "color", "background-color"
//!
//! [output]
//! out = "textpixels.png"
//! encoder = "magick"        # "magick" (ImageMagick convert) or "native"
//! # line_limit = 10000      # Only render the first N rows
//! # height = 2000           # Tile into columns of this height
//! # crop = "3000x2000+0+0"  # Crop after tiling
//!
//! [state]
//! # load = "state.json"     # Resume from a saved run
//! # save = "state.json"     # Checkpoint at the end of the run
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::pipeline::Phase;
use crate::stylesheet::normalize_hex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "textpixels.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Phases to run, in order.
    pub phases: Vec<Phase>,
    /// Stop after this phase has completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<Phase>,
    pub input: InputConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
    pub state: StateConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            phases: Phase::DEFAULT.to_vec(),
            finish: None,
            input: InputConfig::default(),
            render: RenderConfig::default(),
            output: OutputConfig::default(),
            state: StateConfig::default(),
        }
    }
}

impl RunConfig {
    /// Canonicalise colour values (`#FFF` → `ffffff`).
    ///
    /// Invalid colours are left untouched for [`validate`](Self::validate)
    /// to report.
    pub fn normalize(&mut self) {
        for color in [&mut self.render.fg, &mut self.render.bg] {
            let hex = color.trim_start_matches('#');
            if let Some(normalized) = normalize_hex(hex) {
                *color = normalized;
            }
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.cols == 0 {
            return Err(ConfigError::Validation("render.cols must be non-zero".into()));
        }
        for (key, color) in [("render.fg", &self.render.fg), ("render.bg", &self.render.bg)] {
            if !is_hex_color(color) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be 6 or 8 hex digits, got '{color}'"
                )));
            }
        }
        if let Some(finish) = self.finish
            && !self.phases.contains(&finish)
        {
            return Err(ConfigError::Validation(format!(
                "finish = \"{finish}\" is not one of the requested phases"
            )));
        }
        if self.output.height == Some(0) {
            return Err(ConfigError::Validation("output.height must be non-zero".into()));
        }
        if let Some(crop) = &self.output.crop
            && crate::encode::CropGeometry::parse(crop).is_none()
        {
            return Err(ConfigError::Validation(format!(
                "output.crop must look like WxH+X+Y, got '{crop}'"
            )));
        }
        Ok(())
    }
}

fn is_hex_color(color: &str) -> bool {
    matches!(color.len(), 6 | 8) && color.chars().all(|c| c.is_ascii_hexdigit())
}

/// Where file paths come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// A directory to enumerate, a file listing one path per line, or unset
    /// to read paths from stdin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_from: Option<PathBuf>,
    /// How a directory is enumerated.
    pub discovery: Discovery,
}

/// Directory enumeration strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discovery {
    /// Files tracked by git (`git ls-files`).
    #[default]
    Git,
    /// Every regular file under the directory, hidden entries skipped.
    Walk,
}

/// Rasterization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output width in pixels; each source line becomes one row.
    pub cols: usize,
    /// Default foreground colour.
    pub fg: String,
    /// Default background colour.
    pub bg: String,
    /// Emit 4-byte RGBA pixels instead of 3-byte RGB.
    pub alpha: bool,
    /// Highlighter theme whose CSS supplies token colours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// CSS properties painted with each language's canonical colour.
    pub lang_as: Vec<CssProperty>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cols: 100,
            fg: "000000".to_string(),
            bg: "ffffff".to_string(),
            alpha: false,
            style: None,
            lang_as: vec![CssProperty::Color],
        }
    }
}

/// A colour property derivable from a language colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CssProperty {
    Color,
    BackgroundColor,
}

impl CssProperty {
    pub fn as_css(self) -> &'static str {
        match self {
            CssProperty::Color => "color",
            CssProperty::BackgroundColor => "background-color",
        }
    }
}

/// Image output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Image written by the magick phase.
    pub out: PathBuf,
    /// Which encoder the magick phase uses.
    pub encoder: EncoderKind,
    /// Render only the first N rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_limit: Option<usize>,
    /// Tile the raster into side-by-side columns of this many rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Crop geometry (`WxH+X+Y`) applied after tiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out: PathBuf::from("textpixels.png"),
            encoder: EncoderKind::default(),
            line_limit: None,
            height: None,
            crop: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// ImageMagick `convert`, fed raw pixels over a pipe.
    #[default]
    Magick,
    /// In-process encoding with the `image` crate.
    Native,
}

/// Run-state persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Resume from this saved state instead of starting fresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<PathBuf>,
    /// Save the state here when the run ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<PathBuf>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RunConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge layers in order onto the stock defaults, then deserialise,
/// normalise and validate.
pub fn resolve_config(
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<RunConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let mut config: RunConfig = merged.try_into()?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Load the run config.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present. `overrides` (from the command line)
/// are applied last.
pub fn load_config(path: Option<&Path>, overrides: toml::Value) -> Result<RunConfig, ConfigError> {
    let file_layer = match path {
        Some(p) => Some(load_raw_config(p)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                Some(load_raw_config(default)?)
            } else {
                None
            }
        }
    };
    resolve_config(file_layer.into_iter().chain(std::iter::once(overrides)))
}

/// Command-line values that override the config file.
///
/// Only fields that were given become part of the overlay.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub phases: Vec<Phase>,
    pub finish: Option<Phase>,
    pub files_from: Option<PathBuf>,
    pub discovery: Option<Discovery>,
    pub cols: Option<usize>,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub alpha: bool,
    pub style: Option<String>,
    pub lang_as: Vec<CssProperty>,
    pub out: Option<PathBuf>,
    pub encoder: Option<EncoderKind>,
    pub line_limit: Option<usize>,
    pub height: Option<u32>,
    pub crop: Option<String>,
    pub load_state: Option<PathBuf>,
    pub save_state: Option<PathBuf>,
}

impl Overrides {
    /// Convert to a sparse TOML table suitable for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        use toml::map::Map;
        use toml::Value;

        fn put<T: Serialize>(table: &mut Map<String, Value>, key: &str, value: Option<T>) {
            if let Some(v) = value.and_then(|v| Value::try_from(v).ok()) {
                table.insert(key.to_string(), v);
            }
        }
        fn section(root: &mut Map<String, Value>, key: &str, table: Map<String, Value>) {
            if !table.is_empty() {
                root.insert(key.to_string(), Value::Table(table));
            }
        }
        fn non_empty<T: Clone>(list: &[T]) -> Option<Vec<T>> {
            (!list.is_empty()).then(|| list.to_vec())
        }

        let mut root = Map::new();
        put(&mut root, "phases", non_empty(&self.phases));
        put(&mut root, "finish", self.finish);

        let mut input = Map::new();
        put(&mut input, "files_from", self.files_from.clone());
        put(&mut input, "discovery", self.discovery);
        section(&mut root, "input", input);

        let mut render = Map::new();
        put(&mut render, "cols", self.cols.map(|c| c as i64));
        put(&mut render, "fg", self.fg.clone());
        put(&mut render, "bg", self.bg.clone());
        put(&mut render, "alpha", self.alpha.then_some(true));
        put(&mut render, "style", self.style.clone());
        put(&mut render, "lang_as", non_empty(&self.lang_as));
        section(&mut root, "render", render);

        let mut output = Map::new();
        put(&mut output, "out", self.out.clone());
        put(&mut output, "encoder", self.encoder);
        put(&mut output, "line_limit", self.line_limit.map(|n| n as i64));
        put(&mut output, "height", self.height.map(i64::from));
        put(&mut output, "crop", self.crop.clone());
        section(&mut root, "output", output);

        let mut state = Map::new();
        put(&mut state, "load", self.load_state.clone());
        put(&mut state, "save", self.save_state.clone());
        section(&mut root, "state", state);

        Value::Table(root)
    }
}

/// Returns a fully-commented stock `textpixels.toml` with all keys explained.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# textpixels configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Phases to run, in order. Phases already recorded in a loaded state are
# skipped. Known phases:
#   findfiles  enumerate input paths
#   identify   drop binary, generated and vendored files; detect languages
#   htmlize    run the syntax highlighter on each file
#   pixelate   convert highlighted markup to colour rows
#   blit       write raw pixels to stdout
#   magick     encode the image
phases = ["findfiles", "identify", "htmlize", "pixelate", "magick"]

# Stop once this phase has run (must be one of `phases`).
# finish = "pixelate"

# ---------------------------------------------------------------------------
# Input
# ---------------------------------------------------------------------------
[input]
# A directory (its tracked files are used), a file listing one path per line,
# or leave unset to read paths from stdin.
# files_from = "."

# How a directory is enumerated: "git" (git ls-files) or "walk".
discovery = "git"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Pixels per source line. Longer lines are cut, shorter ones padded.
cols = 100

# Default colours as 6 (RGB) or 8 (RGBA) hex digits.
fg = "000000"
bg = "ffffff"

# Emit RGBA pixels.
alpha = false

# Highlighter theme supplying token colours.
# style = "monokai"

# Paint each language's canonical colour as these CSS properties.
# Any of "color", "background-color"; empty to disable.
lang_as = ["color"]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
out = "textpixels.png"

# "magick" pipes raw pixels into ImageMagick's convert; "native" encodes
# in-process.
encoder = "magick"

# Only render the first N rows.
# line_limit = 10000

# Tile the image into side-by-side columns of this many rows.
# height = 2000

# Crop geometry applied after tiling.
# crop = "3000x2000+0+0"

# ---------------------------------------------------------------------------
# State
# ---------------------------------------------------------------------------
[state]
# Resume from a state saved by an earlier run.
# load = "state.json"

# Save the state when the run ends.
# save = "state.json"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = RunConfig::default();
        assert_eq!(config.phases, Phase::DEFAULT.to_vec());
        assert_eq!(config.render.cols, 100);
        assert_eq!(config.render.fg, "000000");
        assert_eq!(config.render.bg, "ffffff");
        assert_eq!(config.render.lang_as, vec![CssProperty::Color]);
        assert_eq!(config.output.encoder, EncoderKind::Magick);
        assert_eq!(config.input.discovery, Discovery::Git);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[render]
cols = 80
bg = "#000"
"##;
        let config = resolve_config([toml::from_str(toml).unwrap()]).unwrap();
        assert_eq!(config.render.cols, 80);
        assert_eq!(config.render.bg, "000000");
        // Untouched defaults
        assert_eq!(config.render.fg, "000000");
        assert_eq!(config.output.out, PathBuf::from("textpixels.png"));
    }

    #[test]
    fn phases_parse_from_names() {
        let toml = r#"phases = ["pixelate", "blit"]
finish = "pixelate""#;
        let config = resolve_config([toml::from_str(toml).unwrap()]).unwrap();
        assert_eq!(config.phases, vec![Phase::Pixelate, Phase::Blit]);
        assert_eq!(config.finish, Some(Phase::Pixelate));
    }

    #[test]
    fn unknown_phase_name_rejected() {
        let toml = r#"phases = ["findfiles", "sparkle"]"#;
        let value: toml::Value = toml::from_str(toml).unwrap();
        assert!(matches!(resolve_config([value]), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_keys_rejected() {
        let value: toml::Value = toml::from_str("[render]\ncolumns = 3").unwrap();
        assert!(resolve_config([value]).is_err());
    }

    #[test]
    fn lang_as_kebab_case() {
        let toml = r#"[render]
lang_as = ["color", "background-color"]"#;
        let config = resolve_config([toml::from_str(toml).unwrap()]).unwrap();
        assert_eq!(
            config.render.lang_as,
            vec![CssProperty::Color, CssProperty::BackgroundColor]
        );
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn zero_cols_rejected() {
        let mut config = RunConfig::default();
        config.render.cols = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn bad_color_rejected() {
        let value: toml::Value = toml::from_str("[render]\nfg = \"red\"").unwrap();
        let err = resolve_config([value]).unwrap_err();
        assert!(err.to_string().contains("render.fg"));
    }

    #[test]
    fn rgba_background_accepted() {
        let value: toml::Value = toml::from_str("[render]\nbg = \"FFFFFF00\"").unwrap();
        let config = resolve_config([value]).unwrap();
        assert_eq!(config.render.bg, "ffffff00");
    }

    #[test]
    fn zero_height_rejected() {
        let mut config = RunConfig::default();
        config.output.height = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn finish_outside_phases_rejected() {
        let toml = r#"phases = ["findfiles", "identify"]
finish = "magick""#;
        let err = resolve_config([toml::from_str(toml).unwrap()]).unwrap_err();
        assert!(err.to_string().contains("magick"));
    }

    #[test]
    fn malformed_crop_rejected() {
        let mut config = RunConfig::default();
        config.output.crop = Some("big".into());
        assert!(config.validate().is_err());
        config.output.crop = Some("100x50+10+0".into());
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Layering
    // =========================================================================

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[render]\ncols = 100\nfg = \"000000\"").unwrap();
        let overlay: toml::Value = toml::from_str("[render]\ncols = 40").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["render"]["cols"].as_integer(), Some(40));
        assert_eq!(merged["render"]["fg"].as_str(), Some("000000"));
    }

    #[test]
    fn overrides_beat_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("textpixels.toml");
        fs::write(&path, "[render]\ncols = 40\nbg = \"eeeeee\"").unwrap();

        let overrides = Overrides {
            cols: Some(20),
            alpha: true,
            ..Default::default()
        };
        let config = load_config(Some(&path), overrides.to_toml()).unwrap();
        assert_eq!(config.render.cols, 20);
        assert_eq!(config.render.bg, "eeeeee");
        assert!(config.render.alpha);
    }

    #[test]
    fn empty_overrides_are_an_empty_table() {
        let value = Overrides::default().to_toml();
        assert_eq!(value.as_table().map(|t| t.len()), Some(0));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(
            Some(&tmp.path().join("nope.toml")),
            Overrides::default().to_toml(),
        );
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config([value]).unwrap();
        assert_eq!(config, RunConfig::default());
    }
}
