//! Shared test utilities for the textpixels test suite.
//!
//! Provides mock collaborators that record what they were asked to do, and
//! small builders for pipeline fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let classifier = MockClassifier::dropping(&["logo.png"]);
//! let highlighter = MockHighlighter::new();
//! // ... run phases ...
//! assert_eq!(highlighter.highlighted(), vec!["src/main.rs"]);
//! ```

use std::sync::Mutex;

use crate::classify::{Classification, ClassifyError, Classifier};
use crate::highlight::{HighlightError, Highlighter};
use crate::types::{Blob, FileEntry};

// =========================================================================
// Fixtures
// =========================================================================

/// Root-less file entries for `paths`.
pub fn entries(paths: &[&str]) -> Vec<FileEntry> {
    paths.iter().map(|p| FileEntry::new(*p, None)).collect()
}

/// The markup [`MockHighlighter`] produces for `path`: one visible line.
pub fn html_for(path: &str) -> String {
    format!("<div class=\"lang-unknown\"><pre>{path}\n</pre></div>\n")
}

// =========================================================================
// Mock classifier
// =========================================================================

/// Keeps every file (without a language) except the named ones, which are
/// reported as binary. Never touches the filesystem.
#[derive(Default)]
pub struct MockClassifier {
    binary: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn dropping(binary: &[&str]) -> Self {
        Self {
            binary: binary.iter().map(|s| s.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Paths classified so far, in call order.
    pub fn classified(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, entry: &FileEntry) -> Result<Classification, ClassifyError> {
        let path = entry.path.to_string_lossy().into_owned();
        self.seen.lock().unwrap().push(path.clone());
        if self.binary.contains(&path) {
            return Ok(Classification::Binary);
        }
        Ok(Classification::Keep(Blob {
            entry: entry.clone(),
            language: None,
        }))
    }
}

// =========================================================================
// Mock highlighter
// =========================================================================

/// Wraps each file's path in highlighter-shaped markup (see [`html_for`]).
#[derive(Default)]
pub struct MockHighlighter {
    style: String,
    fail: bool,
    seen: Mutex<Vec<String>>,
}

impl MockHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `css` for every style request.
    pub fn with_style(css: &str) -> Self {
        Self {
            style: css.to_string(),
            ..Self::default()
        }
    }

    /// Fails every highlight request.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Paths highlighted so far, in call order.
    pub fn highlighted(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Highlighter for MockHighlighter {
    fn highlight(&self, blob: &Blob, _css_class: &str) -> Result<String, HighlightError> {
        if self.fail {
            return Err(HighlightError::File {
                path: blob.entry.path.clone(),
                message: "mock failure".into(),
            });
        }
        let path = blob.entry.path.to_string_lossy().into_owned();
        self.seen.lock().unwrap().push(path.clone());
        Ok(html_for(&path))
    }

    fn style_css(&self, _style: &str) -> Result<String, HighlightError> {
        Ok(self.style.clone())
    }
}
