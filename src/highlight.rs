//! Syntax highlighting for the htmlize phase.
//!
//! Highlighting is delegated to an external tool. The [`Highlighter`] trait
//! covers the two things the pipeline needs from it:
//!
//! - **markup** for one file, wrapped in a block carrying the file's
//!   `lang-<alias>` class, and
//! - **theme CSS** for a named style, parsed into the colour table.
//!
//! [`PygmentsHighlighter`] drives `pygmentize`:
//!
//! ```text
//! pygmentize -f html -O cssclass=lang-rust -l rust src/main.rs
//! pygmentize -S monokai -f html
//! ```
//!
//! Its HTML output has the shape the rasterizer expects: a
//! `<div class="..."><pre>` wrapper, nested `<span class="...">` tokens and a
//! final `</pre></div>` line.

use crate::types::{Blob, lang_css};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use thiserror::Error;

/// Lexer used when a file's language is unknown.
pub const PLAIN_LEXER: &str = "text";

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Highlighting {} failed: {message}", path.display())]
    File { path: PathBuf, message: String },
    #[error("Style '{style}' failed: {message}")]
    Style { style: String, message: String },
}

/// Produces highlighted markup and theme stylesheets.
pub trait Highlighter {
    /// Highlight one file, wrapping it in a block with class `css_class`.
    fn highlight(&self, blob: &Blob, css_class: &str) -> Result<String, HighlightError>;

    /// Stylesheet text for a named theme.
    fn style_css(&self, style: &str) -> Result<String, HighlightError>;
}

/// Highlight a blob with its own language class.
pub fn highlight_blob(highlighter: &dyn Highlighter, blob: &Blob) -> Result<String, HighlightError> {
    highlighter.highlight(blob, &lang_css(blob.language.as_ref()))
}

/// [`Highlighter`] backed by the `pygmentize` command.
#[derive(Debug, Clone)]
pub struct PygmentsHighlighter {
    program: String,
}

impl PygmentsHighlighter {
    pub fn new() -> Self {
        Self::with_program("pygmentize")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for highlighting one file.
    pub fn highlight_args(blob: &Blob, css_class: &str) -> Vec<String> {
        let lexer = blob
            .language
            .as_ref()
            .map(|l| l.alias.as_str())
            .unwrap_or(PLAIN_LEXER);
        vec![
            "-f".into(),
            "html".into(),
            "-O".into(),
            format!("cssclass={css_class}"),
            "-l".into(),
            lexer.into(),
            blob.entry.path.to_string_lossy().into_owned(),
        ]
    }

    /// Arguments for printing a theme's stylesheet.
    pub fn style_args(style: &str) -> Vec<String> {
        vec!["-S".into(), style.into(), "-f".into(), "html".into()]
    }

    fn run(&self, args: &[String]) -> Result<Output, HighlightError> {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HighlightError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

impl Default for PygmentsHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for PygmentsHighlighter {
    fn highlight(&self, blob: &Blob, css_class: &str) -> Result<String, HighlightError> {
        let output = self.run(&Self::highlight_args(blob, css_class))?;
        if !output.status.success() {
            return Err(HighlightError::File {
                path: blob.entry.path.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn style_css(&self, style: &str) -> Result<String, HighlightError> {
        let output = self.run(&Self::style_args(style))?;
        if !output.status.success() {
            return Err(HighlightError::Style {
                style: style.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
