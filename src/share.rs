use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MilestoneError;
use crate::fsutil;

/// Copy a file or folder into the shared folder, replacing an older copy.
///
/// Returns the path of the shared copy.
pub fn share_path(path: &Path, share_dir: &Path) -> Result<PathBuf> {
    let path = path.canonicalize().map_err(|_| MilestoneError::PathNotFound {
        path: path.to_path_buf(),
    })?;

    fs::create_dir_all(share_dir)
        .with_context(|| format!("Failed to create share folder: {}", share_dir.display()))?;
    let share_dir = share_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", share_dir.display()))?;

    if share_dir.starts_with(&path) {
        return Err(anyhow!(
            "The share folder {} is inside {}",
            share_dir.display(),
            path.display()
        ));
    }

    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("'{}' has no file name", path.display()))?;
    let target = share_dir.join(name);

    fsutil::remove_path(&target)?;
    fsutil::copy_path(&path, &target)?;

    info!("shared {} as {}", path.display(), target.display());
    Ok(target)
}
