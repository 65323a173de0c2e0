//! Tree copy operations.
//!
//! Copies a mounted config drive to its destination directory.

use std::os::unix::fs::symlink;
use std::path::Path;

use configdrive_shared::errors::{ConfigDriveError, ConfigDriveResult};
use walkdir::WalkDir;

/// Recursively copy the contents of `src` to a new directory `dst`.
///
/// `dst` must not exist yet; its parents are created as needed. Directories
/// are recreated, regular files copied, symlinks recreated with the same
/// target. Other file types (sockets, device nodes) are skipped.
///
/// # Errors
///
/// Returns `ConfigDriveError::Copy` if `dst` already exists, or on the first
/// I/O failure. In the latter case the destination may hold a partial tree.
pub fn copy_tree(src: &Path, dst: &Path) -> ConfigDriveResult<()> {
    if !src.is_dir() {
        return Err(ConfigDriveError::Copy(format!(
            "Source is not a directory: {}",
            src.display()
        )));
    }

    if std::fs::symlink_metadata(dst).is_ok() {
        return Err(ConfigDriveError::Copy(format!(
            "Destination already exists: {}",
            dst.display()
        )));
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| copy_err("create directory", parent, e))?;
    }
    std::fs::create_dir(dst).map_err(|e| copy_err("create destination", dst, e))?;

    tracing::info!("Copying {} to {}", src.display(), dst.display());
    let start = std::time::Instant::now();
    let mut files = 0usize;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            ConfigDriveError::Copy(format!("Failed to walk {}: {}", src.display(), e))
        })?;

        let src_path = entry.path();
        let rel = src_path.strip_prefix(src).map_err(|e| {
            ConfigDriveError::Internal(format!(
                "{} is outside {}: {}",
                src_path.display(),
                src.display(),
                e
            ))
        })?;
        let dst_path = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let target = std::fs::read_link(src_path).map_err(|e| copy_err("read symlink", src_path, e))?;
            symlink(&target, &dst_path).map_err(|e| copy_err("create symlink", &dst_path, e))?;
            tracing::debug!("Copied symlink: {} -> {}", dst_path.display(), target.display());
        } else if file_type.is_dir() {
            std::fs::create_dir(&dst_path).map_err(|e| copy_err("create directory", &dst_path, e))?;
        } else if file_type.is_file() {
            std::fs::copy(src_path, &dst_path).map_err(|e| {
                ConfigDriveError::Copy(format!(
                    "Failed to copy file {} -> {}: {}",
                    src_path.display(),
                    dst_path.display(),
                    e
                ))
            })?;
            files += 1;
        } else {
            tracing::debug!("Skipping special file {}", src_path.display());
        }
    }

    tracing::info!(
        "Copied {} files to {} in {:.2}s",
        files,
        dst.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn copy_err(action: &str, path: &Path, e: std::io::Error) -> ConfigDriveError {
    ConfigDriveError::Copy(format!("Failed to {} {}: {}", action, path.display(), e))
}
