//! Shared types threaded through every pipeline phase.
//!
//! These types are persisted inside the run state between invocations
//! (findfiles → identify → htmlize → pixelate → blit/magick) and must stay
//! serialisable with a stable shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A colour as 6 (RGB) or 8 (RGBA) lowercase hex digits, without `#`.
pub type Color = String;

/// One rendered source line: exactly `cols` colours.
pub type Row = Vec<Color>;

/// A path discovered by the findfiles phase.
///
/// `root` is the directory the path was enumerated from, when there is one;
/// classification uses the path relative to it.
///
/// Paths are stored as JSON strings when they are valid UTF-8 and as an
/// array of raw OS units otherwise, so any name the filesystem hands back
/// survives a save and load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(with = "path_repr")]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "path_repr::option")]
    pub root: Option<PathBuf>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, root: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// Path relative to `root`, or the path itself when unrooted.
    pub fn relative_path(&self) -> &std::path::Path {
        match &self.root {
            Some(root) => self.path.strip_prefix(root).unwrap_or(&self.path),
            None => &self.path,
        }
    }
}

/// A programming language as known to the classifier and highlighter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Display name, e.g. `"Rust"`.
    pub name: String,
    /// Highlighter alias, e.g. `"rust"`. Also names the CSS class `lang-<alias>`.
    pub alias: String,
    /// Canonical colour as `#rrggbb`, when the language has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A classified source file kept for highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub entry: FileEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

/// CSS class naming a file's language; `lang-unknown` when undetected.
pub fn lang_css(language: Option<&Language>) -> String {
    match language {
        Some(lang) => format!("lang-{}", lang.alias),
        None => UNKNOWN_LANG_CSS.to_string(),
    }
}

/// Class used for files whose language could not be determined.
pub const UNKNOWN_LANG_CSS: &str = "lang-unknown";

/// Lossless serde encoding for paths.
mod path_repr {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::path::{Path, PathBuf};

    #[cfg(windows)]
    type RawUnit = u16;
    #[cfg(not(windows))]
    type RawUnit = u8;

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum PathRepr {
        Text(String),
        Raw(Vec<RawUnit>),
    }

    #[cfg(unix)]
    fn to_raw(path: &Path) -> Option<Vec<RawUnit>> {
        use std::os::unix::ffi::OsStrExt;
        Some(path.as_os_str().as_bytes().to_vec())
    }

    #[cfg(unix)]
    fn from_raw(raw: Vec<RawUnit>) -> Option<PathBuf> {
        use std::os::unix::ffi::OsStringExt;
        Some(PathBuf::from(std::ffi::OsString::from_vec(raw)))
    }

    #[cfg(windows)]
    fn to_raw(path: &Path) -> Option<Vec<RawUnit>> {
        use std::os::windows::ffi::OsStrExt;
        Some(path.as_os_str().encode_wide().collect())
    }

    #[cfg(windows)]
    fn from_raw(raw: Vec<RawUnit>) -> Option<PathBuf> {
        use std::os::windows::ffi::OsStringExt;
        Some(PathBuf::from(std::ffi::OsString::from_wide(&raw)))
    }

    #[cfg(not(any(unix, windows)))]
    fn to_raw(_path: &Path) -> Option<Vec<RawUnit>> {
        None
    }

    #[cfg(not(any(unix, windows)))]
    fn from_raw(_raw: Vec<RawUnit>) -> Option<PathBuf> {
        None
    }

    fn encode(path: &Path) -> Option<PathRepr> {
        match path.to_str() {
            Some(text) => Some(PathRepr::Text(text.to_string())),
            None => to_raw(path).map(PathRepr::Raw),
        }
    }

    fn decode(repr: PathRepr) -> Option<PathBuf> {
        match repr {
            PathRepr::Text(text) => Some(PathBuf::from(text)),
            PathRepr::Raw(raw) => from_raw(raw),
        }
    }

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = encode(path).ok_or_else(|| {
            <S::Error as serde::ser::Error>::custom(format!("unencodable path {}", path.display()))
        })?;
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        decode(PathRepr::deserialize(deserializer)?)
            .ok_or_else(|| serde::de::Error::custom("raw path bytes are not supported on this platform"))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            path: &Option<PathBuf>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match path {
                Some(path) => serializer.serialize_some(&Wrapper(path)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<PathBuf>, D::Error> {
            Option::<PathRepr>::deserialize(deserializer)?
                .map(|repr| {
                    decode(repr).ok_or_else(|| {
                        serde::de::Error::custom("raw path bytes are not supported on this platform")
                    })
                })
                .transpose()
        }

        struct Wrapper<'a>(&'a PathBuf);

        impl Serialize for Wrapper<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                super::serialize(self.0, serializer)
            }
        }
    }
}
