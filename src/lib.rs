//! # textpixels
//!
//! Pixel art from source code. Every character of every file in a corpus
//! becomes one pixel: non-whitespace takes its syntax-highlighting foreground
//! colour, whitespace its background. Each source line is one row of the
//! image.
//!
//! # Architecture: Resumable Phase Pipeline
//!
//! A run is an ordered list of phases applied to one [`state::RunState`]:
//!
//! ```text
//! findfiles  paths        →  filenames
//! identify   filenames    →  blobs       (binary/generated/vendored dropped)
//! htmlize    blobs        →  html        (external highlighter)
//! pixelate   html         →  colorrows   (markup rasterizer)
//! blit       colorrows    →  raw RGB(A) on stdout
//! magick     colorrows    →  image file  (ImageMagick or in-process)
//! ```
//!
//! Highlighting thousands of files is slow; rasterizing them is not. The
//! state can be saved after any run and loaded by the next, and phases
//! already recorded as run are skipped, so colours, widths and encodings can
//! be re-tried without re-highlighting.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Phase enum, executor, events |
//! | [`state`] | Versioned JSON run state, atomic save |
//! | [`rasterize`] | Markup → colour rows with a scope stack |
//! | [`stylesheet`] | CSS class → colour table, synthetic per-language CSS |
//! | [`entities`] | Numeric and named character reference decoding |
//! | [`pixels`] | Row padding, colour packing, raw pixel output |
//! | [`discover`] | File enumeration: git, directory walk, path lists |
//! | [`classify`] | Binary/generated/vendored detection |
//! | [`languages`] | Built-in language table |
//! | [`highlight`] | Highlighter trait and the `pygmentize` driver |
//! | [`encode`] | Image encoders: ImageMagick pipe, native PNG |
//! | [`config`] | Layered `textpixels.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types stored in the run state |
//!
//! # Design Decisions
//!
//! ## External Collaborators Behind Traits
//!
//! Highlighting, classification and encoding are done by other tools. Each
//! sits behind a trait ([`highlight::Highlighter`], [`classify::Classifier`],
//! [`encode::RasterEncoder`]) so the executor can be tested with recording
//! mocks, and so the rasterizer only ever sees markup text.
//!
//! ## Parse-Tolerant Core
//!
//! Stylesheets, entities and markup come from tools we don't control.
//! Malformed fragments are ignored or replaced (U+FFFD), never fatal. Only
//! configuration and resource failures abort a run.

pub mod classify;
pub mod config;
pub mod discover;
pub mod encode;
pub mod entities;
pub mod highlight;
pub mod languages;
pub mod output;
pub mod pipeline;
pub mod pixels;
pub mod rasterize;
pub mod state;
pub mod stylesheet;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
