//! SCM (Source Control Management) abstraction layer.
//!
//! Provides the version-control primitives the milestone engine consumes,
//! implemented on top of the git CLI.

mod git;
mod revision;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::MilestoneError;

pub use git::{read_identity, write_global_identity, GitScm, Identity};
pub use revision::Revision;

/// Pattern keeping milestone output folders out of the repository
pub const MILESTONE_DIR_EXCLUDE: &str = "*_milestones/";

/// Handle to changes set aside with [`Scm::shelve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfHandle {
    pub id: String,
}

/// Index state of a file that differs from its head content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedEntry {
    /// A blob is staged with the given mode
    Blob { mode: String, object: String },
    /// The removal of the file is staged
    Removed,
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new revision was created
    Committed(String),
    /// Nothing was staged relative to history
    NoChanges,
}

/// Trait for source control management operations.
///
/// Every path argument is an absolute path inside the working tree.
pub trait Scm: Send + Sync {
    /// Top level directory of the working tree
    fn workdir(&self) -> &Path;

    /// Whether the path has ever been committed
    fn is_tracked(&self, path: &Path) -> Result<bool>;

    /// Stage a file, or a folder recursively (additions and deletions).
    fn stage(&self, path: &Path) -> Result<()>;

    /// Commit what is staged for `path`
    fn commit(&self, message: &str, path: &Path) -> Result<CommitOutcome>;

    /// Revisions that modified `path`, oldest first
    fn list_revisions(&self, path: &Path) -> Result<Vec<Revision>>;

    /// Replace the live content of `path` with its content at `revision`.
    fn checkout(&self, revision: &str, path: &Path) -> Result<()>;

    /// Files under `path` recorded in the index, as absolute paths.
    ///
    /// Right after [`Scm::checkout`] these are exactly the files of that revision.
    fn tracked_files(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// The staged state of the file `path`, or `None` when the index matches HEAD
    fn staged_entry(&self, path: &Path) -> Result<Option<StagedEntry>>;

    /// Put a state read with [`Scm::staged_entry`] back into the index
    fn restore_staged_entry(&self, path: &Path, entry: &StagedEntry) -> Result<()>;

    /// Check if `path` has uncommitted changes (including untracked files)
    fn has_changes(&self, path: &Path) -> Result<bool>;

    /// Set aside uncommitted changes under `path`.
    ///
    /// Returns `None` when there was nothing to set aside.
    fn shelve(&self, path: &Path) -> Result<Option<ShelfHandle>>;

    /// Reapply changes set aside with [`Scm::shelve`]
    fn unshelve(&self, handle: &ShelfHandle) -> Result<()>;

    /// Get the current commit hash.
    fn current_commit_hash(&self) -> Result<String>;

    /// Add an ignore pattern local to this repository (idempotent).
    fn exclude(&self, pattern: &str) -> Result<()>;
}

/// Directory the VCS is driven from: the folder itself, or a file's parent
pub fn working_location(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Open the repository containing `location`.
///
/// Fails with [`MilestoneError::RepositoryMissing`] when there is none.
pub fn discover(location: &Path) -> Result<Box<dyn Scm>> {
    Ok(Box::new(GitScm::discover(location)?))
}

/// Check if `location` is inside a repository.
pub fn is_repo(location: &Path) -> bool {
    GitScm::discover(location).is_ok()
}

/// Initialize a new repository at `location`.
pub fn init(location: &Path) -> Result<Box<dyn Scm>> {
    Ok(Box::new(GitScm::init(location)?))
}

/// Open the repository containing `location`, creating one there if needed.
pub fn discover_or_init(location: &Path) -> Result<Box<dyn Scm>> {
    match GitScm::discover(location) {
        Ok(scm) => Ok(Box::new(scm)),
        Err(e) => match e.downcast_ref::<MilestoneError>() {
            Some(MilestoneError::RepositoryMissing { .. }) => {
                log::info!("No repository for {}, creating one", location.display());
                init(location)
            }
            _ => Err(e),
        },
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::process::Command;

    /// Stage `pathspec` and commit it with a fixed committer and date
    pub fn commit_as(dir: &Path, pathspec: &str, author: &str, epoch: i64, message: &str) {
        let date = format!("@{epoch} +0000");
        let email = format!("{}@example.com", author.to_lowercase());

        let status = Command::new("git")
            .args(["add", "-A", "--", pathspec])
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success());

        let status = Command::new("git")
            .args(["commit", "-q", "-m", message])
            .env("GIT_AUTHOR_NAME", author)
            .env("GIT_AUTHOR_EMAIL", &email)
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_NAME", author)
            .env("GIT_COMMITTER_EMAIL", &email)
            .env("GIT_COMMITTER_DATE", &date)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success());
    }
}
