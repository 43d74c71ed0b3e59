//! Resumable run state.
//!
//! [`RunState`] is the record every phase reads from and writes to. It can be
//! saved at the end of a run and loaded at the start of the next, so a long
//! job (highlighting thousands of files) can be split across invocations:
//!
//! ```text
//! textpixels run --save-state s.json --finish htmlize   # slow part, once
//! textpixels run --load-state s.json --cols 80          # re-render cheaply
//! ```
//!
//! Phases recorded in [`RunState::ran`] are skipped on resume.
//!
//! ## Storage
//!
//! The state is a versioned JSON document with one key per field. Writes go
//! to a temporary sibling file that is then renamed over the target, so an
//! interrupted save never leaves a truncated state behind. A document with a
//! different version is an error.

use crate::pipeline::Phase;
use crate::types::{Blob, FileEntry, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the state document. Bump when the shape changes.
pub const STATE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Corrupt state file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Cannot encode state for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("State file {} has version {found}, expected {}", path.display(), STATE_VERSION)]
    Version { path: PathBuf, found: u32 },
}

/// Everything one run has produced so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Paths from findfiles, in enumeration order.
    pub filenames: Vec<FileEntry>,
    /// Files kept by identify, in `filenames` order.
    pub blobs: Vec<Blob>,
    /// Highlighter markup, one entry per blob.
    pub html: Vec<String>,
    /// Rows for every line of every file, file order then line order.
    pub colorrows: Vec<Row>,
    /// Phases that have completed.
    pub ran: BTreeSet<Phase>,
}

#[derive(Serialize)]
struct StateDocumentRef<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a RunState,
}

#[derive(Deserialize)]
struct StateDocument {
    version: u32,
    #[serde(flatten)]
    state: RunState,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously saved state.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json_err = |source| StateError::Json {
            path: path.to_path_buf(),
            source,
        };
        // Check the version before the full shape so old documents report a
        // version mismatch instead of a confusing field error.
        let probe: VersionProbe = serde_json::from_str(&content).map_err(json_err)?;
        if probe.version != STATE_VERSION {
            return Err(StateError::Version {
                path: path.to_path_buf(),
                found: probe.version,
            });
        }
        let doc: StateDocument = serde_json::from_str(&content).map_err(json_err)?;
        Ok(doc.state)
    }

    /// Save atomically: write a sibling temp file, then rename it into place.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string(&StateDocumentRef {
            version: STATE_VERSION,
            state: self,
        })
        .map_err(|source| StateError::Encode {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = temp_path(path);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            io_err(e)
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(format!(".tmp{}", std::process::id()));
    path.with_file_name(name)
}
