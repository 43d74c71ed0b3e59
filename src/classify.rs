//! File classification for the identify phase.
//!
//! Decides which discovered files are worth drawing. Binary, generated and
//! vendored files are dropped; every kept file becomes a [`Blob`] with its
//! detected language.
//!
//! | Verdict | Rule |
//! |---|---|
//! | binary | NUL byte within the first 8000 bytes |
//! | vendored | a path component such as `vendor/` or `node_modules/` |
//! | generated | lock/minified/protobuf file names, or a generated-code marker in the first lines |
//!
//! The [`Classifier`] trait lets tests (and other detectors) stand in for
//! [`HeuristicClassifier`].

use crate::languages;
use crate::types::{Blob, FileEntry};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Bytes sniffed for NUL when detecting binary content.
const SNIFF_LEN: u64 = 8000;

/// Leading lines searched for generated-code markers.
const HEADER_LINES: usize = 5;

const VENDOR_DIRS: &[&str] = &[
    "vendor",
    "vendors",
    "node_modules",
    "third_party",
    "bower_components",
    "Godeps",
    ".git",
];

const GENERATED_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "Gemfile.lock",
    "poetry.lock",
    "composer.lock",
];

const GENERATED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".map", ".pb.go", "_pb2.py"];

const GENERATED_MARKERS: &[&str] = &["@generated", "DO NOT EDIT", "Code generated"];

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Keep(Blob),
    Binary,
    Generated,
    Vendored,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Keep(_) => "kept",
            Classification::Binary => "binary",
            Classification::Generated => "generated",
            Classification::Vendored => "vendored",
        }
    }
}

/// Classifies discovered files.
pub trait Classifier {
    fn classify(&self, entry: &FileEntry) -> Result<Classification, ClassifyError>;
}

/// Path- and content-based classifier with the built-in language table.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl Classifier for HeuristicClassifier {
    fn classify(&self, entry: &FileEntry) -> Result<Classification, ClassifyError> {
        let read_err = |source| ClassifyError::Read {
            path: entry.path.clone(),
            source,
        };
        let relative = entry.relative_path();
        if is_vendored(relative) {
            return Ok(Classification::Vendored);
        }

        let mut head = Vec::new();
        std::fs::File::open(&entry.path)
            .and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head))
            .map_err(read_err)?;

        if head.contains(&0) {
            return Ok(Classification::Binary);
        }
        if has_generated_name(relative) || has_generated_marker(&head) {
            return Ok(Classification::Generated);
        }
        Ok(Classification::Keep(Blob {
            entry: entry.clone(),
            language: languages::detect(relative),
        }))
    }
}

fn is_vendored(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => VENDOR_DIRS.iter().any(|v| name == *v),
        _ => false,
    })
}

fn has_generated_name(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    GENERATED_NAMES.contains(&name.as_ref())
        || GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn has_generated_marker(head: &[u8]) -> bool {
    String::from_utf8_lossy(head)
        .lines()
        .take(HEADER_LINES)
        .any(|line| GENERATED_MARKERS.iter().any(|m| line.contains(m)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) -> FileEntry {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        FileEntry::new(path, Some(root.to_path_buf()))
    }

    #[test]
    fn keeps_source_with_language() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "src/main.rs", b"fn main() {}\n");
        match HeuristicClassifier.classify(&entry).unwrap() {
            Classification::Keep(blob) => {
                assert_eq!(blob.entry, entry);
                assert_eq!(blob.language.map(|l| l.alias).as_deref(), Some("rust"));
            }
            other => panic!("expected Keep, got {other:?}"),
        }
    }

    #[test]
    fn keeps_unknown_language_file() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "NOTES", b"just text\n");
        assert!(matches!(
            HeuristicClassifier.classify(&entry).unwrap(),
            Classification::Keep(Blob { language: None, .. })
        ));
    }

    #[test]
    fn drops_binary() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "logo.png", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR");
        assert_eq!(
            HeuristicClassifier.classify(&entry).unwrap(),
            Classification::Binary
        );
    }

    #[test]
    fn drops_vendored_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "node_modules/left-pad/index.js", b"module.exports = 1;\n");
        assert_eq!(
            HeuristicClassifier.classify(&entry).unwrap(),
            Classification::Vendored
        );
    }

    #[test]
    fn drops_generated_by_name_and_marker() {
        let tmp = TempDir::new().unwrap();
        let lock = write(tmp.path(), "Cargo.lock", b"# lock\n");
        let min = write(tmp.path(), "static/app.min.js", b"var a=1;\n");
        let marked = write(
            tmp.path(),
            "api.go",
            b"// Code generated by protoc-gen-go. DO NOT EDIT.\npackage api\n",
        );
        for entry in [lock, min, marked] {
            assert_eq!(
                HeuristicClassifier.classify(&entry).unwrap(),
                Classification::Generated,
                "{}",
                entry.path.display()
            );
        }
    }

    #[test]
    fn marker_after_header_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "a.py", b"1\n2\n3\n4\n5\n# DO NOT EDIT\n");
        assert!(matches!(
            HeuristicClassifier.classify(&entry).unwrap(),
            Classification::Keep(_)
        ));
    }

    #[test]
    fn missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let entry = FileEntry::new(tmp.path().join("gone.rs"), None);
        assert!(matches!(
            HeuristicClassifier.classify(&entry),
            Err(ClassifyError::Read { .. })
        ));
    }
}
