//! Overlay composition
//!
//! Copies an overlay tree on top of a destination tree: directories are
//! merged, files are replaced whole. Applying overlays one after another
//! gives last-writer-wins precedence per relative path.

use crate::error::{BakeError, BakeResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// What a directory entry should be treated as during the walk
enum EntryKind {
    Dir,
    File,
    Skip,
}

/// Merge `overlay_root` into the already existing `dest_root`.
///
/// Walks the overlay with an explicit stack of `(source, destination)`
/// directory pairs. Any read, create or copy failure aborts the walk; the
/// destination may then hold a partially applied overlay and must be
/// discarded by the caller.
pub async fn apply_overlay(overlay_root: &Path, dest_root: &Path) -> BakeResult<()> {
    let mut pending: Vec<(PathBuf, PathBuf)> =
        vec![(overlay_root.to_path_buf(), dest_root.to_path_buf())];
    let mut copied = 0usize;

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let mut entries = fs::read_dir(&src_dir)
            .await
            .map_err(|e| BakeError::io(format!("reading directory {}", src_dir.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BakeError::io(format!("reading directory {}", src_dir.display()), e))?
        {
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());

            match classify(&entry, &src).await? {
                EntryKind::Dir => {
                    ensure_dir(&dst).await?;
                    pending.push((src, dst));
                }
                EntryKind::File => {
                    copy_file(&src, &dst).await?;
                    copied += 1;
                }
                EntryKind::Skip => {}
            }
        }
    }

    debug!(
        "Applied {} -> {} ({} files)",
        overlay_root.display(),
        dest_root.display(),
        copied
    );
    Ok(())
}

/// Copy a whole tree into a fresh `dst` directory.
pub async fn copy_tree(src: &Path, dst: &Path) -> BakeResult<()> {
    fs::create_dir_all(dst)
        .await
        .map_err(|e| BakeError::io(format!("creating directory {}", dst.display()), e))?;
    apply_overlay(src, dst).await
}

async fn classify(entry: &fs::DirEntry, src: &Path) -> BakeResult<EntryKind> {
    let file_type = entry
        .file_type()
        .await
        .map_err(|e| BakeError::io(format!("inspecting {}", src.display()), e))?;

    if file_type.is_dir() {
        return Ok(EntryKind::Dir);
    }
    if file_type.is_file() {
        return Ok(EntryKind::File);
    }
    if file_type.is_symlink() {
        // Dangling links fail here on purpose: the content cannot be read
        let target = fs::metadata(src)
            .await
            .map_err(|e| BakeError::io(format!("following symlink {}", src.display()), e))?;
        if target.is_dir() {
            warn!("Skipping symlinked directory {}", src.display());
            return Ok(EntryKind::Skip);
        }
        return Ok(EntryKind::File);
    }

    warn!("Skipping special file {}", src.display());
    Ok(EntryKind::Skip)
}

/// Make sure `path` is a directory, replacing a file that sits in the way.
async fn ensure_dir(path: &Path) -> BakeResult<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            fs::remove_file(path)
                .await
                .map_err(|e| BakeError::io(format!("replacing file {}", path.display()), e))?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(BakeError::io(format!("inspecting {}", path.display()), e)),
    }

    fs::create_dir(path)
        .await
        .map_err(|e| BakeError::io(format!("creating directory {}", path.display()), e))
}

/// Copy `src` over `dst`, unconditionally replacing whatever is there.
async fn copy_file(src: &Path, dst: &Path) -> BakeResult<()> {
    // Remove first: copied permissions may make the old file read-only
    match fs::symlink_metadata(dst).await {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(dst).await.map_err(|e| {
                BakeError::io(format!("replacing directory {}", dst.display()), e)
            })?;
        }
        Ok(_) => {
            fs::remove_file(dst)
                .await
                .map_err(|e| BakeError::io(format!("replacing file {}", dst.display()), e))?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(BakeError::io(format!("inspecting {}", dst.display()), e)),
    }

    fs::copy(src, dst).await.map_err(|e| {
        BakeError::io(
            format!("copying {} to {}", src.display(), dst.display()),
            e,
        )
    })?;
    Ok(())
}
