//! Input file enumeration for the findfiles phase.
//!
//! Paths come from one of three places, chosen by `input.files_from`:
//!
//! | `files_from` | Source | Root |
//! |---|---|---|
//! | directory | `git ls-files` (or a directory walk with `discovery = "walk"`) | the directory |
//! | file | one path per line | none |
//! | unset | one path per line on stdin | none |
//!
//! Git listing uses `<dir>/.git` as the git directory when it exists and the
//! directory itself otherwise, so bare repositories work too. Only entries
//! that exist as regular files are kept (submodules and deleted-but-staged
//! files are skipped).

use crate::config::{Discovery, InputConfig};
use crate::types::FileEntry;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot read file list {}: {source}", path.display())]
    List { path: PathBuf, source: io::Error },
    #[error("git ls-files failed in {}: {message}", dir.display())]
    Git { dir: PathBuf, message: String },
    #[error("Walking {} failed: {source}", dir.display())]
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },
}

/// Enumerate input files according to `input`, reading stdin if needed.
pub fn find_files(input: &InputConfig) -> Result<Vec<FileEntry>, DiscoverError> {
    match &input.files_from {
        Some(path) if path.is_dir() => match input.discovery {
            Discovery::Git => git_files(path),
            Discovery::Walk => walk_files(path),
        },
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|source| DiscoverError::List {
                path: path.clone(),
                source,
            })?;
            read_list(io::BufReader::new(file))
        }
        None => read_list(io::stdin().lock()),
    }
}

/// Read one path per line. Blank lines are skipped.
pub fn read_list(reader: impl BufRead) -> Result<Vec<FileEntry>, DiscoverError> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let path = line.trim_end_matches('\r');
        if !path.trim().is_empty() {
            entries.push(FileEntry::new(path, None));
        }
    }
    Ok(entries)
}

/// Files tracked by git under `dir`, in index order.
pub fn git_files(dir: &Path) -> Result<Vec<FileEntry>, DiscoverError> {
    let dot_git = dir.join(".git");
    let git_dir = if dot_git.is_dir() {
        dot_git
    } else {
        dir.to_path_buf()
    };

    let output = Command::new("git")
        .arg(format!("--git-dir={}", git_dir.display()))
        .args(["ls-files", "-z"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| DiscoverError::Git {
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DiscoverError::Git {
            dir: dir.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(tracked_files(dir, &output.stdout))
}

/// Join NUL-separated `git ls-files -z` output to `dir`, keeping existing
/// regular files.
fn tracked_files(dir: &Path, listing: &[u8]) -> Vec<FileEntry> {
    listing
        .split(|&b| b == 0)
        .filter(|name| !name.is_empty())
        .map(|name| dir.join(path_from_bytes(name)))
        .filter(|path| path.is_file())
        .map(|path| FileEntry::new(path, Some(dir.to_path_buf())))
        .collect()
}

#[cfg(unix)]
fn path_from_bytes(name: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(name))
}

// Git writes UTF-8 paths on other platforms.
#[cfg(not(unix))]
fn path_from_bytes(name: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(name).into_owned())
}

/// Every regular file under `dir`, sorted by name, hidden entries skipped.
pub fn walk_files(dir: &Path) -> Result<Vec<FileEntry>, DiscoverError> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.map_err(|source| DiscoverError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            entries.push(FileEntry::new(entry.into_path(), Some(dir.to_path_buf())));
        }
    }
    Ok(entries)
}
