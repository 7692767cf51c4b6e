//! Base game resolution
//!
//! Finds the on-disk base game for a type tag by searching, in order:
//! 1. Writable data root: `{data_root}/games/`
//! 2. Engine-scoped bundled assets: `{bundled}/engine/{engine_version}/games/`
//! 3. Generic bundled assets: `{bundled}/games/`
//!
//! First valid match wins, so user-customized games shadow bundled ones.

use crate::error::{BakeError, BakeResult};
use crate::overlay::{ArtifactForm, ArtifactRef, MANIFEST_FILE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directories the resolver searches
#[derive(Debug, Clone)]
pub struct SearchRoots {
    /// Writable data root (also hosts the bake cache)
    pub data_root: PathBuf,

    /// Assets shipped with the application, if any
    pub bundled_assets: Option<PathBuf>,
}

impl SearchRoots {
    /// Search directories for `engine_version`, in precedence order
    pub fn search_dirs(&self, engine_version: &str) -> Vec<PathBuf> {
        let mut dirs = vec![self.data_root.join("games")];
        if let Some(ref bundled) = self.bundled_assets {
            dirs.push(bundled.join("engine").join(engine_version).join("games"));
            dirs.push(bundled.join("games"));
        }
        dirs
    }
}

/// Resolves base game type tags to validated paths
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    roots: SearchRoots,
    aliases: HashMap<String, Vec<String>>,
}

impl ArtifactResolver {
    pub fn new(roots: SearchRoots) -> Self {
        Self {
            roots,
            aliases: HashMap::new(),
        }
    }

    /// Add name fragments per base type on top of the built-in aliases
    pub fn with_aliases(mut self, aliases: HashMap<String, Vec<String>>) -> Self {
        for (base_type, fragments) in aliases {
            self.aliases
                .entry(base_type.to_lowercase())
                .or_default()
                .extend(fragments.into_iter().map(|f| f.to_lowercase()));
        }
        self
    }

    /// Locate the base game for `base`.
    ///
    /// Fails with [`BakeError::NotFound`] when no search directory holds a
    /// valid candidate.
    pub async fn resolve_base(&self, base: &ArtifactRef) -> BakeResult<PathBuf> {
        validate_base(base)?;
        let fragments = self.fragments(&base.base_type);
        let dirs = self.roots.search_dirs(&base.engine_version);

        for dir in &dirs {
            for candidate in matching_entries(dir, &fragments).await {
                if is_valid_artifact(&candidate).await {
                    debug!("Resolved {} -> {}", base.base_type, candidate.display());
                    return Ok(candidate);
                }
                debug!("Skipping invalid candidate {}", candidate.display());
            }
        }

        let searched: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
        Err(BakeError::NotFound {
            base_type: base.base_type.clone(),
            searched: searched.join(", "),
        })
    }

    /// Every valid candidate for `base`, in precedence order
    pub async fn candidates(&self, base: &ArtifactRef) -> BakeResult<Vec<PathBuf>> {
        validate_base(base)?;
        let fragments = self.fragments(&base.base_type);

        let mut found = Vec::new();
        for dir in self.roots.search_dirs(&base.engine_version) {
            for candidate in matching_entries(&dir, &fragments).await {
                if is_valid_artifact(&candidate).await {
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }

    /// Lowercase name fragments that identify `base_type`
    fn fragments(&self, base_type: &str) -> Vec<String> {
        let key = base_type.to_lowercase();
        let mut fragments = vec![key.clone()];

        let builtin = builtin_aliases(&key).iter().map(|a| a.to_string());
        let configured = self.aliases.get(&key).into_iter().flatten().cloned();
        for fragment in builtin.chain(configured) {
            if !fragment.is_empty() && !fragments.contains(&fragment) {
                fragments.push(fragment);
            }
        }
        fragments
    }
}

/// Check that `path` looks like a usable artifact.
///
/// A `.sdd` directory must contain `modinfo.lua`; `.sdz`/`.sd7` files are
/// accepted without opening them. Anything else, including paths that
/// cannot be statted, is not an artifact.
pub async fn is_valid_artifact(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path).await else {
        return false;
    };

    match ArtifactForm::from_path(path) {
        Some(ArtifactForm::Expanded) if meta.is_dir() => fs::metadata(path.join(MANIFEST_FILE))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false),
        Some(ArtifactForm::Archive) => meta.is_file(),
        _ => false,
    }
}

/// Built-in name fragments for well-known base games
fn builtin_aliases(base_type: &str) -> &'static [&'static str] {
    match base_type {
        "bar" | "byar" | "beyond all reason" | "beyond-all-reason" => {
            &["byar", "beyond all reason", "beyond-all-reason"]
        }
        _ => &[],
    }
}

/// Reject inputs that would escape the search directories or match everything
pub(crate) fn validate_base(base: &ArtifactRef) -> BakeResult<()> {
    if base.base_type.trim().is_empty() {
        return Err(BakeError::InvalidInput(
            "base game type cannot be empty".to_string(),
        ));
    }
    let ev = &base.engine_version;
    if ev.is_empty()
        || ev.contains('/')
        || ev.contains('\\')
        || ev.contains("..")
        || ev.contains('\0')
    {
        return Err(BakeError::InvalidInput(format!(
            "Invalid engine version '{}': must be non-empty and not contain path separators or '..'",
            ev
        )));
    }
    Ok(())
}

/// Entries of `dir` whose lowercase name contains any fragment, sorted by name.
/// A missing or unreadable directory yields nothing.
async fn matching_entries(dir: &Path, fragments: &[String]) -> Vec<PathBuf> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping search directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if fragments.iter().any(|f| name.contains(f.as_str())) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    matches
}
