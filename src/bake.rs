//! Bake orchestration
//!
//! Turns a base game plus an ordered overlay list into a cached, fully
//! composed game:
//!
//! ```text
//! fingerprint -> lookup --hit--> done
//!                   \--miss--> resolve base -> copy base -> overlay 1..N
//!                              -> manifest -> publish -> done
//! ```
//!
//! Any failure after the lookup removes the private working directory and
//! returns the original error. Nothing becomes visible in the cache unless
//! the whole build succeeded.

use crate::cache::{fingerprint, BakedArtifact, CacheStore, CombinationKey, SweepReport};
use crate::error::{BakeError, BakeResult};
use crate::overlay::{
    apply_overlay, copy_tree, ArtifactForm, ArtifactRef, ArtifactResolver, BakedManifest,
    OverlayRef,
};
use crate::overlay::resolve::validate_base;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// What to bake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeRequest {
    pub base: ArtifactRef,

    /// Applied strictly in this order; later entries win
    pub overlays: Vec<OverlayRef>,
}

impl BakeRequest {
    pub fn new(
        base_type: impl Into<String>,
        engine_version: impl Into<String>,
        overlays: Vec<OverlayRef>,
    ) -> Self {
        Self {
            base: ArtifactRef::new(base_type, engine_version),
            overlays,
        }
    }

    /// Combination key this request bakes to
    pub fn key(&self) -> CombinationKey {
        fingerprint(&self.base, &self.overlays)
    }
}

/// Result of a bake, identical in shape for hits and fresh builds
#[derive(Debug, Clone, Serialize)]
pub struct BakeOutcome {
    /// Artifact name (`baked-<key16>`)
    pub name: String,

    /// Location of the baked game
    pub archive_path: PathBuf,

    /// Full combination key
    pub hash: CombinationKey,

    /// Whether the artifact was already cached (no build happened)
    pub was_cached: bool,
}

impl BakeOutcome {
    fn from_artifact(artifact: BakedArtifact, hash: CombinationKey, was_cached: bool) -> Self {
        Self {
            name: artifact.name,
            archive_path: artifact.path,
            hash,
            was_cached,
        }
    }
}

/// Progress events emitted while baking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BakeStep {
    CacheHit,
    Resolved(PathBuf),
    CopyingBase,
    ApplyingOverlay {
        index: usize,
        total: usize,
        overlay: String,
    },
    WritingManifest,
    Publishing,
}

/// Bakes combinations into a [`CacheStore`]
#[derive(Debug, Clone)]
pub struct Baker {
    store: CacheStore,
    resolver: ArtifactResolver,
}

impl Baker {
    pub fn new(store: CacheStore, resolver: ArtifactResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Bake `request`, reusing the cached artifact when there is one
    pub async fn bake(&self, request: &BakeRequest) -> BakeResult<BakeOutcome> {
        self.bake_with_progress(request, |_| {}).await
    }

    /// [`bake`](Self::bake), reporting each step to `on_step`
    pub async fn bake_with_progress<F>(
        &self,
        request: &BakeRequest,
        mut on_step: F,
    ) -> BakeResult<BakeOutcome>
    where
        F: FnMut(BakeStep),
    {
        validate_base(&request.base)?;
        validate_overlays(&request.overlays)?;

        let key = request.key();
        debug!("Combination key for {}: {}", request.base.base_type, key);

        if let Some(existing) = self.store.lookup(&key).await {
            info!("Cache hit: {}", existing.path.display());
            on_step(BakeStep::CacheHit);
            return Ok(BakeOutcome::from_artifact(existing, key, true));
        }

        let base_path = self.resolver.resolve_base(&request.base).await?;
        on_step(BakeStep::Resolved(base_path.clone()));

        let staging = self.store.begin_build(&key);
        let work = staging.path.clone();
        debug!("Building {} in {}", key.artifact_name(), work.display());

        if let Err(e) = self
            .build(request, &key, &base_path, &work, &mut on_step)
            .await
        {
            self.store.cleanup_failed(&work).await;
            return Err(e);
        }

        on_step(BakeStep::Publishing);
        let artifact = match self.store.publish(staging).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.store.cleanup_failed(&work).await;
                return Err(e);
            }
        };

        Ok(BakeOutcome::from_artifact(artifact, key, false))
    }

    /// Evict cached artifacts older than `max_age`
    pub async fn sweep(&self, max_age: Duration) -> BakeResult<SweepReport> {
        let report = self.store.evict_older_than(max_age).await?;
        info!(
            "Sweep removed {} artifact(s), {} stale build(s), {} failure(s)",
            report.removed.len(),
            report.stale_staging,
            report.failed
        );
        Ok(report)
    }

    async fn build<F>(
        &self,
        request: &BakeRequest,
        key: &CombinationKey,
        base_path: &Path,
        work: &Path,
        on_step: &mut F,
    ) -> BakeResult<()>
    where
        F: FnMut(BakeStep),
    {
        if ArtifactForm::from_path(base_path) != Some(ArtifactForm::Expanded) {
            return Err(BakeError::Unsupported {
                path: base_path.to_path_buf(),
                reason: "packaged archives cannot be used as a base yet".to_string(),
            });
        }

        on_step(BakeStep::CopyingBase);
        copy_tree(base_path, work).await?;

        let total = request.overlays.len();
        for (i, overlay) in request.overlays.iter().enumerate() {
            on_step(BakeStep::ApplyingOverlay {
                index: i + 1,
                total,
                overlay: overlay.to_string(),
            });
            reject_packaged_overlay(overlay).await?;
            info!(
                "Applying overlay {}/{}: {} from {}",
                i + 1,
                total,
                overlay,
                overlay.path.display()
            );
            apply_overlay(&overlay.path, work).await?;
        }

        on_step(BakeStep::WritingManifest);
        BakedManifest::for_combination(&request.base, &request.overlays, key)
            .write_to(work)
            .await
    }
}

fn validate_overlays(overlays: &[OverlayRef]) -> BakeResult<()> {
    for overlay in overlays {
        if overlay.name.trim().is_empty() || overlay.version.trim().is_empty() {
            return Err(BakeError::InvalidInput(format!(
                "overlay at {} needs a non-empty name and version",
                overlay.path.display()
            )));
        }
    }
    Ok(())
}

/// Overlays are merged as trees; a packaged overlay would need extraction
async fn reject_packaged_overlay(overlay: &OverlayRef) -> BakeResult<()> {
    let is_file = tokio::fs::metadata(&overlay.path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if is_file {
        return Err(BakeError::Unsupported {
            path: overlay.path.clone(),
            reason: format!("overlay {} is a file, not a directory tree", overlay),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::manifest::read_string_field;
    use crate::overlay::{SearchRoots, MANIFEST_FILE};
    use std::fs as stdfs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        baker: Baker,
    }

    impl Fixture {
        async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let data_root = temp.path().join("data");
            let base = data_root.join("games").join("demo.sdd");
            stdfs::create_dir_all(&base).unwrap();
            stdfs::write(base.join(MANIFEST_FILE), "return { name = 'demo' }").unwrap();
            stdfs::write(base.join("data.txt"), "base").unwrap();

            let store = CacheStore::open(&data_root).await.unwrap();
            let resolver = ArtifactResolver::new(SearchRoots {
                data_root,
                bundled_assets: None,
            });
            Self {
                temp,
                baker: Baker::new(store, resolver),
            }
        }

        fn overlay(&self, name: &str, version: &str, files: &[(&str, &str)]) -> OverlayRef {
            let path = self.temp.path().join("overlays").join(name);
            for (rel, content) in files {
                let file = path.join(rel);
                stdfs::create_dir_all(file.parent().unwrap()).unwrap();
                stdfs::write(file, content).unwrap();
            }
            OverlayRef::new(name, version, path)
        }

        fn staging_is_empty(&self) -> bool {
            let staging = self.baker.store().root().join(".staging");
            stdfs::read_dir(staging).unwrap().next().is_none()
        }
    }

    fn read(path: &Path, rel: &str) -> String {
        stdfs::read_to_string(path.join(rel)).unwrap()
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let fx = Fixture::new().await;
        let patch = fx.overlay("patch", "v1", &[("data.txt", "patched")]);
        let request = BakeRequest::new("demo", "ev1", vec![patch.clone()]);

        let outcome = fx.baker.bake(&request).await.unwrap();

        assert!(!outcome.was_cached);
        assert!(outcome.name.starts_with("baked-"));
        assert_eq!(
            outcome.hash,
            fingerprint(&ArtifactRef::new("demo", "ev1"), &[patch])
        );
        assert_eq!(read(&outcome.archive_path, "data.txt"), "patched");

        let manifest = read(&outcome.archive_path, MANIFEST_FILE);
        let shortname = read_string_field(&manifest, "shortname").unwrap();
        assert!(shortname.starts_with("baked-"));
        assert_eq!(shortname, outcome.name);
        assert!(manifest.contains("demo"));
        assert!(manifest.contains("patch"));
        assert!(manifest.contains("modtype = 1"));
        assert!(fx.staging_is_empty());
    }

    #[tokio::test]
    async fn second_bake_is_a_cache_hit() {
        let fx = Fixture::new().await;
        let patch = fx.overlay("patch", "v1", &[("data.txt", "patched")]);
        let request = BakeRequest::new("demo", "ev1", vec![patch.clone()]);

        let first = fx.baker.bake(&request).await.unwrap();
        let data_mtime = stdfs::metadata(first.archive_path.join("data.txt"))
            .unwrap()
            .modified()
            .unwrap();

        // Inputs gone: a rebuild would fail, a hit must not care
        stdfs::remove_dir_all(&patch.path).unwrap();
        stdfs::remove_dir_all(fx.temp.path().join("data/games/demo.sdd")).unwrap();

        let mut steps = Vec::new();
        let second = fx
            .baker
            .bake_with_progress(&request, |s| steps.push(s))
            .await
            .unwrap();

        assert!(second.was_cached);
        assert_eq!(second.name, first.name);
        assert_eq!(second.archive_path, first.archive_path);
        assert_eq!(second.hash, first.hash);
        assert_eq!(steps, vec![BakeStep::CacheHit]);
        assert_eq!(
            stdfs::metadata(second.archive_path.join("data.txt"))
                .unwrap()
                .modified()
                .unwrap(),
            data_mtime
        );
    }

    #[tokio::test]
    async fn overlay_order_decides_precedence() {
        let fx = Fixture::new().await;
        let v1 = fx.overlay("one", "1", &[("data.txt", "v1")]);
        let v2 = fx.overlay("two", "1", &[("data.txt", "v2")]);

        let forward = fx
            .baker
            .bake(&BakeRequest::new("demo", "ev1", vec![v1.clone(), v2.clone()]))
            .await
            .unwrap();
        let backward = fx
            .baker
            .bake(&BakeRequest::new("demo", "ev1", vec![v2, v1]))
            .await
            .unwrap();

        assert_ne!(forward.hash, backward.hash);
        assert_eq!(read(&forward.archive_path, "data.txt"), "v2");
        assert_eq!(read(&backward.archive_path, "data.txt"), "v1");
    }

    #[tokio::test]
    async fn base_only_bake() {
        let fx = Fixture::new().await;
        let outcome = fx
            .baker
            .bake(&BakeRequest::new("demo", "ev1", vec![]))
            .await
            .unwrap();

        assert_eq!(read(&outcome.archive_path, "data.txt"), "base");
        let manifest = read(&outcome.archive_path, MANIFEST_FILE);
        assert_eq!(read_string_field(&manifest, "name").as_deref(), Some("demo"));
    }

    #[tokio::test]
    async fn failed_overlay_leaves_no_residue() {
        let fx = Fixture::new().await;
        let good = fx.overlay("good", "1", &[("data.txt", "good")]);
        let missing = OverlayRef::new("missing", "1", fx.temp.path().join("does-not-exist"));
        let request = BakeRequest::new("demo", "ev1", vec![good.clone(), missing]);

        let err = fx.baker.bake(&request).await.unwrap_err();

        assert!(matches!(err, BakeError::Io { .. }));
        assert!(err.to_string().contains("does-not-exist"));
        assert!(fx.baker.store().lookup(&request.key()).await.is_none());
        assert!(!fx.baker.store().artifact_path(&request.key()).exists());
        assert!(fx.staging_is_empty());

        // The failed attempt left nothing behind, so a retry builds normally
        let fixed = fx.overlay("missing", "1", &[("extra.txt", "late")]);
        let retry = BakeRequest::new("demo", "ev1", vec![good, fixed]);
        assert_eq!(retry.key(), request.key());
        let outcome = fx.baker.bake(&retry).await.unwrap();
        assert!(!outcome.was_cached);
        assert_eq!(read(&outcome.archive_path, "extra.txt"), "late");
    }

    #[tokio::test]
    async fn missing_base_touches_nothing() {
        let fx = Fixture::new().await;
        let request = BakeRequest::new("ghost", "ev1", vec![]);

        let err = fx.baker.bake(&request).await.unwrap_err();

        assert!(matches!(err, BakeError::NotFound { .. }));
        assert!(err.to_string().contains("ghost"));
        assert!(fx.baker.store().entries().await.unwrap().is_empty());
        assert!(fx.staging_is_empty());
    }

    #[tokio::test]
    async fn archive_base_is_unsupported() {
        let fx = Fixture::new().await;
        stdfs::write(fx.temp.path().join("data/games/packed.sdz"), b"PK").unwrap();

        let err = fx
            .baker
            .bake(&BakeRequest::new("packed", "ev1", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BakeError::Unsupported { .. }));
        assert!(fx.staging_is_empty());
    }

    #[tokio::test]
    async fn file_overlay_is_unsupported() {
        let fx = Fixture::new().await;
        let packed = fx.temp.path().join("patch.sdz");
        stdfs::write(&packed, b"PK").unwrap();
        let request = BakeRequest::new("demo", "ev1", vec![OverlayRef::new("p", "1", packed)]);

        let err = fx.baker.bake(&request).await.unwrap_err();

        assert!(matches!(err, BakeError::Unsupported { .. }));
        assert!(fx.baker.store().lookup(&request.key()).await.is_none());
    }

    #[tokio::test]
    async fn empty_overlay_identity_rejected() {
        let fx = Fixture::new().await;
        let nameless = fx.overlay("nameless", "1", &[("a", "a")]);
        let request = BakeRequest::new(
            "demo",
            "ev1",
            vec![OverlayRef::new("", "1", nameless.path)],
        );

        let err = fx.baker.bake(&request).await.unwrap_err();
        assert!(matches!(err, BakeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn bad_engine_version_rejected_before_lookup() {
        let fx = Fixture::new().await;
        let err = fx
            .baker
            .bake(&BakeRequest::new("demo", "../ev1", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, BakeError::InvalidInput(_)));
        assert!(fx.staging_is_empty());
    }

    #[tokio::test]
    async fn progress_steps_in_order() {
        let fx = Fixture::new().await;
        let a = fx.overlay("a", "1", &[("a.txt", "a")]);
        let b = fx.overlay("b", "1", &[("b.txt", "b")]);

        let mut steps = Vec::new();
        fx.baker
            .bake_with_progress(&BakeRequest::new("demo", "ev1", vec![a, b]), |s| {
                steps.push(s)
            })
            .await
            .unwrap();

        assert!(matches!(steps[0], BakeStep::Resolved(_)));
        assert_eq!(steps[1], BakeStep::CopyingBase);
        assert_eq!(
            steps[2],
            BakeStep::ApplyingOverlay {
                index: 1,
                total: 2,
                overlay: "a 1".to_string()
            }
        );
        assert_eq!(
            steps[3],
            BakeStep::ApplyingOverlay {
                index: 2,
                total: 2,
                overlay: "b 1".to_string()
            }
        );
        assert_eq!(steps[4], BakeStep::WritingManifest);
        assert_eq!(steps[5], BakeStep::Publishing);
        assert_eq!(steps.len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_bakes_publish_once() {
        let fx = Fixture::new().await;
        let patch = fx.overlay("patch", "v1", &[("data.txt", "patched")]);
        let request = Arc::new(BakeRequest::new("demo", "ev1", vec![patch]));
        let baker = Arc::new(fx.baker.clone());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let baker = Arc::clone(&baker);
            let request = Arc::clone(&request);
            handles.push(tokio::spawn(async move { baker.bake(&request).await }));
        }

        let mut names = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(read(&outcome.archive_path, "data.txt"), "patched");
            names.push(outcome.name);
        }
        names.dedup();
        assert_eq!(names.len(), 1);
        assert_eq!(fx.baker.store().entries().await.unwrap().len(), 1);
        assert!(fx.staging_is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_different_bakes_are_independent() {
        let fx = Fixture::new().await;
        let a = fx.overlay("a", "1", &[("data.txt", "a")]);
        let b = fx.overlay("b", "1", &[("data.txt", "b")]);
        let req_a = BakeRequest::new("demo", "ev1", vec![a]);
        let req_b = BakeRequest::new("demo", "ev1", vec![b]);

        let (out_a, out_b) = tokio::join!(fx.baker.bake(&req_a), fx.baker.bake(&req_b));
        let (out_a, out_b) = (out_a.unwrap(), out_b.unwrap());

        assert_ne!(out_a.name, out_b.name);
        assert_eq!(read(&out_a.archive_path, "data.txt"), "a");
        assert_eq!(read(&out_b.archive_path, "data.txt"), "b");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sweep_during_bake_spares_the_build() {
        let fx = Fixture::new().await;
        let sub = fx.temp.path().join("data/games/demo.sdd/sub");
        stdfs::create_dir_all(&sub).unwrap();
        for i in 0..2000 {
            stdfs::write(sub.join(format!("f{i}.txt")), "x").unwrap();
        }
        let request = BakeRequest::new("demo", "ev1", vec![]);

        let baker = fx.baker.clone();
        let build = tokio::spawn(async move { baker.bake(&request).await });

        let mut stale = 0;
        while !build.is_finished() {
            let report = fx.baker.sweep(Duration::from_millis(1)).await.unwrap();
            stale += report.stale_staging;
            tokio::task::yield_now().await;
        }

        // The published copy may itself be evicted by the last sweep; only
        // the build's own success matters here
        let outcome = build.await.unwrap().unwrap();
        assert!(!outcome.was_cached);
        assert_eq!(stale, 0);
        assert!(fx.staging_is_empty());
    }

    #[tokio::test]
    async fn sweep_keeps_fresh_artifacts() {
        let fx = Fixture::new().await;
        let outcome = fx
            .baker
            .bake(&BakeRequest::new("demo", "ev1", vec![]))
            .await
            .unwrap();

        let report = fx.baker.sweep(Duration::from_secs(24 * 60 * 60)).await.unwrap();
        assert!(report.removed.is_empty());
        assert!(outcome.archive_path.exists());
    }
}
