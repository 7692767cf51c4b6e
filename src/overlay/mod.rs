//! Base artifacts and overlays
//!
//! A baked game is a base game directory with an ordered list of overlay
//! trees copied on top of it. This module holds the identities of both,
//! the on-disk naming contract shared with the engine, and the pieces that
//! locate, merge and describe them.

pub mod compose;
pub mod manifest;
pub mod resolve;

pub use compose::{apply_overlay, copy_tree};
pub use manifest::BakedManifest;
pub use resolve::{is_valid_artifact, ArtifactResolver, SearchRoots};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Manifest marker every engine-readable game must carry at its root
pub const MANIFEST_FILE: &str = "modinfo.lua";

/// Extension of the expanded (plain directory) form
pub const EXPANDED_EXT: &str = "sdd";

/// Extensions of the packaged archive forms
pub const ARCHIVE_EXTS: &[&str] = &["sdz", "sd7"];

/// Identity of a base game: its type tag and the engine it targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Base game type (e.g. "byar"), matched against directory names
    pub base_type: String,

    /// Engine/runtime version tag
    pub engine_version: String,
}

impl ArtifactRef {
    pub fn new(base_type: impl Into<String>, engine_version: impl Into<String>) -> Self {
        Self {
            base_type: base_type.into(),
            engine_version: engine_version.into(),
        }
    }
}

/// One overlay to apply on top of the base.
///
/// `(name, version)` is the identity. `path` only says where the content
/// lives right now and never takes part in hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRef {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

impl OverlayRef {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for OverlayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// The two on-disk forms an artifact may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactForm {
    /// Plain directory ending in `.sdd`
    Expanded,
    /// `.sdz` / `.sd7` packaged archive
    Archive,
}

impl ArtifactForm {
    /// Classify a path by its extension alone (no filesystem access)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == EXPANDED_EXT {
            Some(Self::Expanded)
        } else if ARCHIVE_EXTS.contains(&ext.as_str()) {
            Some(Self::Archive)
        } else {
            None
        }
    }
}

impl fmt::Display for ArtifactForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expanded => f.pad("expanded"),
            Self::Archive => f.pad("archive"),
        }
    }
}
