//! On-disk store of baked games
//!
//! Layout under the writable data root:
//!
//! ```text
//! baked-games/
//!   baked-<key16>/            published, complete, immutable
//!   baked-<key16>.sdz         packaged form, treated the same way
//!   .staging/
//!     baked-<key16>-<uuid>/   private to one in-flight build
//! ```
//!
//! A build is assembled under `.staging/` and becomes visible with one
//! `rename` onto its final name, so `lookup` can never observe a partial
//! artifact and two identical builds cannot interleave their writes.
//!
//! Staging directories are registered as in flight from `begin_build` until
//! their [`Staging`] handle is dropped. A sweep never touches a registered
//! directory, and only removes unregistered leftovers once they are older
//! than both the sweep age and [`STAGING_GRACE`].

use crate::cache::fingerprint::{CombinationKey, ARTIFACT_PREFIX};
use crate::error::{BakeError, BakeResult};
use crate::overlay::{ArtifactForm, ARCHIVE_EXTS, MANIFEST_FILE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

/// Cache directory name under the data root
pub const CACHE_DIR: &str = "baked-games";

/// Staging area inside the cache directory (same filesystem, so rename is atomic)
pub const STAGING_DIR: &str = ".staging";

/// Minimum age before an unregistered staging directory counts as abandoned.
/// Covers builds running in other processes, which this store cannot see.
pub const STAGING_GRACE: Duration = Duration::from_secs(24 * 60 * 60);

/// A published cache entry
#[derive(Debug, Clone, Serialize)]
pub struct BakedArtifact {
    /// Entry name without extension (`baked-<key16>`)
    pub name: String,

    /// Directory or archive location
    pub path: PathBuf,

    pub form: ArtifactForm,

    /// Full key, when the entry was found through it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<CombinationKey>,

    /// Modification time, used for eviction
    pub modified: DateTime<Utc>,
}

/// A build in progress: where to construct, and where it will be published.
///
/// The working path stays registered as in flight until this is dropped.
#[derive(Debug)]
pub struct Staging {
    pub key: CombinationKey,
    pub path: PathBuf,
    pub final_path: PathBuf,
    _claim: InFlightClaim,
}

/// Staging paths with a live [`Staging`] handle, shared by clones of a store
#[derive(Debug, Clone, Default)]
struct InFlight(Arc<Mutex<HashSet<PathBuf>>>);

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // Every critical section is one set operation, so poison is ignored
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn claim(&self, path: &Path) -> InFlightClaim {
        self.lock().insert(path.to_path_buf());
        InFlightClaim {
            registry: self.clone(),
            path: path.to_path_buf(),
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }
}

#[derive(Debug)]
struct InFlightClaim {
    registry: InFlight,
    path: PathBuf,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.path);
    }
}

/// Outcome of an eviction sweep
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepReport {
    /// Names of removed published entries
    pub removed: Vec<String>,

    /// Abandoned staging directories removed
    pub stale_staging: usize,

    /// Entries that could not be removed (logged, sweep continued)
    pub failed: usize,
}

/// Handle to the baked-games directory.
///
/// Obtained from [`CacheStore::open`], which is the only place the
/// directory structure is created.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    staging: PathBuf,
    in_flight: InFlight,
}

impl CacheStore {
    /// Create `<data_root>/baked-games/` (and its staging area) and return a ready store
    pub async fn open(data_root: &Path) -> BakeResult<Self> {
        let root = data_root.join(CACHE_DIR);
        let staging = root.join(STAGING_DIR);

        fs::create_dir_all(&staging)
            .await
            .map_err(|e| BakeError::io(format!("creating cache directory {}", staging.display()), e))?;

        debug!("Cache store ready at {}", root.display());
        Ok(Self {
            root,
            staging,
            in_flight: InFlight::default(),
        })
    }

    /// Cache directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of the expanded form for `key`
    pub fn artifact_path(&self, key: &CombinationKey) -> PathBuf {
        self.root.join(key.artifact_name())
    }

    /// Find the published artifact for `key`.
    ///
    /// Existence under the final name is the completeness signal; staging
    /// directories are never consulted. Stat failures count as a miss.
    pub async fn lookup(&self, key: &CombinationKey) -> Option<BakedArtifact> {
        let name = key.artifact_name();

        let dir = self.root.join(&name);
        if let Some(modified) = stat_modified(&dir, true).await {
            return Some(BakedArtifact {
                name,
                path: dir,
                form: ArtifactForm::Expanded,
                key: Some(*key),
                modified,
            });
        }

        for ext in ARCHIVE_EXTS {
            let archive = self.root.join(format!("{name}.{ext}"));
            if let Some(modified) = stat_modified(&archive, false).await {
                return Some(BakedArtifact {
                    name,
                    path: archive,
                    form: ArtifactForm::Archive,
                    key: Some(*key),
                    modified,
                });
            }
        }

        None
    }

    /// Pick a private working path for a new build of `key`.
    ///
    /// Nothing is created on disk; the caller builds into `path`. The path
    /// is shielded from sweeps for as long as the returned handle lives.
    pub fn begin_build(&self, key: &CombinationKey) -> Staging {
        let unique = uuid::Uuid::new_v4().simple().to_string();
        let path = self
            .staging
            .join(format!("{}-{}", key.artifact_name(), unique));
        Staging {
            key: *key,
            _claim: self.in_flight.claim(&path),
            path,
            final_path: self.artifact_path(key),
        }
    }

    /// Whether `path` belongs to a build that has not finished yet
    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.in_flight.contains(path)
    }

    /// Make a finished build visible under its final name.
    ///
    /// If an identical build already got there first, this copy is
    /// discarded and the existing artifact returned.
    pub async fn publish(&self, staging: Staging) -> BakeResult<BakedArtifact> {
        match fs::rename(&staging.path, &staging.final_path).await {
            Ok(()) => {
                info!("Published {}", staging.final_path.display());
                let modified = stat_modified(&staging.final_path, true)
                    .await
                    .unwrap_or_else(Utc::now);
                Ok(BakedArtifact {
                    name: staging.key.artifact_name(),
                    path: staging.final_path,
                    form: ArtifactForm::Expanded,
                    key: Some(staging.key),
                    modified,
                })
            }
            Err(e) => {
                if let Some(existing) = self.lookup(&staging.key).await {
                    debug!(
                        "{} was published concurrently, discarding {}",
                        existing.name,
                        staging.path.display()
                    );
                    self.cleanup_failed(&staging.path).await;
                    return Ok(existing);
                }
                Err(BakeError::io(
                    format!(
                        "publishing {} to {}",
                        staging.path.display(),
                        staging.final_path.display()
                    ),
                    e,
                ))
            }
        }
    }

    /// Remove a failed or abandoned working path.
    ///
    /// Best-effort: failures are logged and swallowed so they never mask
    /// the error that triggered the cleanup.
    pub async fn cleanup_failed(&self, path: &Path) {
        if let Err(e) = remove_entry(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("{}", BakeError::cleanup(path, e));
            }
        }
    }

    /// List published artifacts, sorted by name
    pub async fn entries(&self) -> BakeResult<Vec<BakedArtifact>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(BakeError::io(
                    format!("reading cache directory {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            BakeError::io(format!("reading cache directory {}", self.root.display()), e)
        })? {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.starts_with(ARTIFACT_PREFIX) {
                continue;
            }

            let Ok(meta) = entry.metadata().await else {
                continue;
            };

            let (name, form) = if meta.is_dir() {
                (file_name.to_string(), ArtifactForm::Expanded)
            } else if ArtifactForm::from_path(&path) == Some(ArtifactForm::Archive) {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(file_name)
                    .to_string();
                (stem, ArtifactForm::Archive)
            } else {
                continue;
            };

            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            artifacts.push(BakedArtifact {
                name,
                path,
                form,
                key: None,
                modified,
            });
        }

        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    /// Remove every complete entry older than `max_age`.
    pub async fn evict_older_than(&self, max_age: Duration) -> BakeResult<SweepReport> {
        self.evict_older_than_at(max_age, SystemTime::now()).await
    }

    /// Entries a sweep at `now` would remove, without touching anything.
    ///
    /// An entry exactly `max_age` old is kept. Directory entries without a
    /// manifest are never selected.
    pub async fn expired_at(
        &self,
        max_age: Duration,
        now: SystemTime,
    ) -> BakeResult<Vec<BakedArtifact>> {
        let mut expired = Vec::new();
        for artifact in self.entries().await? {
            if !is_expired(artifact.modified.into(), max_age, now) {
                continue;
            }
            if artifact.form == ArtifactForm::Expanded
                && fs::metadata(artifact.path.join(MANIFEST_FILE)).await.is_err()
            {
                debug!("Skipping {} (no manifest)", artifact.name);
                continue;
            }
            expired.push(artifact);
        }
        Ok(expired)
    }

    /// [`evict_older_than`](Self::evict_older_than) against an explicit clock
    pub async fn evict_older_than_at(
        &self,
        max_age: Duration,
        now: SystemTime,
    ) -> BakeResult<SweepReport> {
        let mut report = SweepReport::default();

        for artifact in self.expired_at(max_age, now).await? {
            match remove_entry(&artifact.path).await {
                Ok(()) => {
                    info!("Evicted {}", artifact.name);
                    report.removed.push(artifact.name);
                }
                Err(e) => {
                    warn!("{}", BakeError::cleanup(&artifact.path, e));
                    report.failed += 1;
                }
            }
        }

        report.stale_staging = self.sweep_staging(max_age.max(STAGING_GRACE), now).await;
        Ok(report)
    }

    /// Remove staging directories left behind by crashed processes.
    ///
    /// Registered builds are skipped whatever their age.
    async fn sweep_staging(&self, min_age: Duration, now: SystemTime) -> usize {
        let Ok(mut entries) = fs::read_dir(&self.staging).await else {
            return 0;
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if self.is_in_flight(&path) {
                debug!("Skipping in-flight build {}", path.display());
                continue;
            }
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if !is_expired(modified, min_age, now) {
                continue;
            }
            match remove_entry(&path).await {
                Ok(()) => {
                    debug!("Removed stale staging directory {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("{}", BakeError::cleanup(&path, e)),
            }
        }
        removed
    }
}

fn is_expired(modified: SystemTime, max_age: Duration, now: SystemTime) -> bool {
    // Timestamps in the future count as age zero
    now.duration_since(modified)
        .map(|age| age > max_age)
        .unwrap_or(false)
}

/// Modification time of `path` if it exists with the expected type
async fn stat_modified(path: &Path, want_dir: bool) -> Option<DateTime<Utc>> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() == want_dir => Some(
            meta.modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
        ),
        Ok(_) => None,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                debug!("Treating {} as missing: {}", path.display(), e);
            }
            None
        }
    }
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}
