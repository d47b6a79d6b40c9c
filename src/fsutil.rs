//! Filesystem helpers shared by the milestone engine.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

const VCS_METADATA_DIR: &str = ".git";

/// Copy a file or a whole folder to `dst`, keeping modification times
pub fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(src)
        .with_context(|| format!("Failed to read metadata: {}", src.display()))?;

    if !metadata.is_dir() {
        return copy_file(src, dst);
    }

    let mut dirs = Vec::new();

    // Repository metadata is never part of a copy
    let entries = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != VCS_METADATA_DIR);

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Walked outside of the copied folder")?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            dirs.push((entry.path().to_path_buf(), target));
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    // Directory times change while their children are written
    for (source_dir, target_dir) in dirs.iter().rev() {
        if let Ok(modified) = fs::metadata(source_dir).and_then(|m| m.modified()) {
            set_modified(target_dir, modified)?;
        }
    }

    Ok(())
}

/// Copy the listed files of the folder `src` to `dst`, keeping their layout.
///
/// Anything in `src` that is not listed is left out.
pub fn copy_listed(src: &Path, files: &[PathBuf], dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory: {}", dst.display()))?;

    for file in files {
        let relative = file
            .strip_prefix(src)
            .with_context(|| format!("{} is outside {}", file.display(), src.display()))?;
        let target = dst.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        copy_file(file, &target)?;
    }

    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(src)
        .with_context(|| format!("Failed to read metadata: {}", src.display()))?;

    #[cfg(unix)]
    {
        if metadata.file_type().is_symlink() {
            let link = fs::read_link(src)
                .with_context(|| format!("Failed to read link: {}", src.display()))?;
            return std::os::unix::fs::symlink(&link, dst)
                .with_context(|| format!("Failed to create link: {}", dst.display()));
        }
    }

    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy {} to {}", src.display(), dst.display())
    })?;

    if let Ok(modified) = metadata.modified() {
        set_modified(dst, modified)?;
    }

    Ok(())
}

/// Remove a file or folder; a missing path is not an error
pub fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display())),
        Ok(_) => fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to read metadata: {}", path.display())),
    }
}

/// Remove `path` if it exists and create it again empty
pub fn recreate_dir(path: &Path) -> Result<()> {
    remove_path(path)?;
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Set the modification time of a file or folder
pub fn set_modified(path: &Path, time: SystemTime) -> Result<()> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(_) => fs::OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open {} to set its time", path.display()))?,
    };

    file.set_modified(time)
        .with_context(|| format!("Failed to set modification time of {}", path.display()))
}

/// Convert epoch seconds into a `SystemTime`
pub fn epoch_to_system_time(epoch_seconds: i64) -> SystemTime {
    if epoch_seconds >= 0 {
        UNIX_EPOCH + Duration::from_secs(epoch_seconds as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(epoch_seconds.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_listed_leaves_out_unlisted_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("docs");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested").join("b.txt"), "b").unwrap();
        fs::write(src.join("debug.log"), "noise").unwrap();

        let dst = temp.path().join("copy");
        copy_listed(
            &src,
            &[src.join("a.txt"), src.join("nested").join("b.txt")],
            &dst,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
        assert!(!dst.join("debug.log").exists());
    }

    #[test]
    fn test_copy_listed_rejects_outside_files() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, "x").unwrap();

        let result = copy_listed(&temp.path().join("docs"), &[outside], &temp.path().join("copy"));
        assert!(result.is_err());
    }

    #[test]
    fn test_copy_folder_keeps_structure_and_times() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested").join("b.txt"), "b").unwrap();
        set_modified(&src.join("a.txt"), epoch_to_system_time(1_000)).unwrap();

        let dst = temp.path().join("dst");
        copy_path(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested").join("b.txt")).unwrap(), "b");
        assert_eq!(
            fs::metadata(dst.join("a.txt")).unwrap().modified().unwrap(),
            epoch_to_system_time(1_000)
        );
    }

    #[test]
    fn test_copy_folder_skips_repository_metadata() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("project");
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::write(src.join(".git").join("HEAD"), "ref").unwrap();
        fs::write(src.join("notes.txt"), "n").unwrap();

        let dst = temp.path().join("copy");
        copy_path(&src, &dst).unwrap();

        assert!(dst.join("notes.txt").exists());
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn test_recreate_dir_discards_content() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.txt"), "old").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_missing_path_is_ok() {
        let temp = TempDir::new().unwrap();
        assert!(remove_path(&temp.path().join("missing")).is_ok());
    }

    #[test]
    fn test_set_modified_on_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("folder");
        fs::create_dir(&dir).unwrap();

        set_modified(&dir, epoch_to_system_time(2_000)).unwrap();

        assert_eq!(
            fs::metadata(&dir).unwrap().modified().unwrap(),
            epoch_to_system_time(2_000)
        );
    }
}
