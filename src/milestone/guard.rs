//! Suspension and restoration of the live working state.
//!
//! Materializing history checks old revisions out over the live path. The
//! guard sets whatever the user had there aside first and puts it back on
//! every exit path: [`WorkingStateGuard::release`] on normal completion, and
//! `Drop` when unwinding.
//!
//! Files and folders use different strategies. A folder is shelved with the
//! VCS stash, which keeps its staged state. A single file is copied verbatim
//! to a temporary location, because shelving drops per-file metadata (icons,
//! comments) on some platforms; its index entry is recorded separately.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::MilestoneError;
use crate::fsutil;
use crate::scm::{Scm, ShelfHandle, StagedEntry};

/// What a strategy needs to put the live path back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendToken {
    /// Verbatim copy of a file, plus its staged state when that differs from HEAD
    Backup {
        copy: PathBuf,
        staged: Option<StagedEntry>,
    },
    /// Stash entry of a folder, `None` when the folder had no uncommitted changes
    Shelf(Option<ShelfHandle>),
}

impl SuspendToken {
    /// Where the user's state survives if restoring fails
    fn recovery_hint(&self) -> String {
        match self {
            SuspendToken::Backup { copy, .. } => {
                format!("your previous content is kept at {}", copy.display())
            }
            SuspendToken::Shelf(Some(handle)) => {
                format!("your changes are kept in git stash entry {}", handle.id)
            }
            SuspendToken::Shelf(None) => "there were no uncommitted changes".to_string(),
        }
    }
}

trait SuspendStrategy {
    fn suspend(&self, scm: &dyn Scm, path: &Path) -> Result<SuspendToken>;
    fn restore(&self, scm: &dyn Scm, path: &Path, token: &SuspendToken) -> Result<()>;
}

fn strategy_for(path: &Path) -> Box<dyn SuspendStrategy> {
    if path.is_dir() {
        Box::new(DirectoryShelf)
    } else {
        Box::new(FileBackup)
    }
}

struct FileBackup;

impl SuspendStrategy for FileBackup {
    fn suspend(&self, scm: &dyn Scm, path: &Path) -> Result<SuspendToken> {
        let staged = scm.staged_entry(path)?;

        let backup_dir = std::env::temp_dir().join(format!("milestones-{}", Uuid::new_v4()));
        fs::create_dir_all(&backup_dir).with_context(|| {
            format!("Failed to create backup directory: {}", backup_dir.display())
        })?;

        let name = path
            .file_name()
            .with_context(|| format!("'{}' has no file name", path.display()))?;
        let backup = backup_dir.join(name);
        fsutil::copy_path(path, &backup)?;

        debug!("backed up {} to {}", path.display(), backup.display());
        Ok(SuspendToken::Backup {
            copy: backup,
            staged,
        })
    }

    fn restore(&self, scm: &dyn Scm, path: &Path, token: &SuspendToken) -> Result<()> {
        let SuspendToken::Backup {
            copy: backup,
            staged,
        } = token
        else {
            anyhow::bail!("File backup cannot restore {token:?}");
        };

        fsutil::remove_path(path)?;
        fsutil::copy_path(backup, path)?;

        // The checkouts reset the index entry to HEAD
        if let Some(entry) = staged {
            scm.restore_staged_entry(path, entry)?;
        }

        if let Some(backup_dir) = backup.parent() {
            if let Err(e) = fsutil::remove_path(backup_dir) {
                warn!("Could not delete backup {}: {e:#}", backup_dir.display());
            }
        }

        Ok(())
    }
}

struct DirectoryShelf;

impl SuspendStrategy for DirectoryShelf {
    fn suspend(&self, scm: &dyn Scm, path: &Path) -> Result<SuspendToken> {
        let handle = scm.shelve(path)?;
        match &handle {
            Some(h) => debug!("shelved changes of {} as {}", path.display(), h.id),
            None => debug!("{} has no uncommitted changes", path.display()),
        }
        Ok(SuspendToken::Shelf(handle))
    }

    fn restore(&self, scm: &dyn Scm, _path: &Path, token: &SuspendToken) -> Result<()> {
        match token {
            SuspendToken::Shelf(Some(handle)) => scm.unshelve(handle),
            SuspendToken::Shelf(None) => Ok(()),
            other => anyhow::bail!("Directory shelf cannot restore {other:?}"),
        }
    }
}

/// Scoped ownership of a live path whose state has been set aside
pub struct WorkingStateGuard<'a> {
    scm: &'a dyn Scm,
    path: PathBuf,
    strategy: Box<dyn SuspendStrategy>,
    token: Option<SuspendToken>,
}

impl<'a> WorkingStateGuard<'a> {
    /// Set the uncommitted state of `path` aside
    pub fn suspend(scm: &'a dyn Scm, path: &Path) -> Result<Self> {
        let strategy = strategy_for(path);
        let token = strategy.suspend(scm, path)?;

        Ok(Self {
            scm,
            path: path.to_path_buf(),
            strategy,
            token: Some(token),
        })
    }

    pub fn token(&self) -> Option<&SuspendToken> {
        self.token.as_ref()
    }

    /// Check the head content back out and reinstate the suspended state.
    ///
    /// Fails with [`MilestoneError::RestoreFailed`], which names where the
    /// user's state can still be found.
    pub fn release(mut self) -> Result<(), MilestoneError> {
        self.reinstate()
    }

    fn reinstate(&mut self) -> Result<(), MilestoneError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };

        if let Err(e) = self.scm.checkout("HEAD", &self.path) {
            warn!(
                "Could not check out the head content of {}: {e:#}",
                self.path.display()
            );
        }

        match self.strategy.restore(self.scm, &self.path, &token) {
            Ok(()) => {
                info!("restored live state of {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(MilestoneError::RestoreFailed {
                path: self.path.clone(),
                reason: format!("{e:#}; {}", token.recovery_hint()),
            }),
        }
    }
}

impl Drop for WorkingStateGuard<'_> {
    fn drop(&mut self) {
        if self.token.is_some() {
            if let Err(e) = self.reinstate() {
                error!("{e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm::{self, test_support::commit_as};
    use tempfile::TempDir;

    fn repo_with_file() -> (TempDir, Box<dyn Scm>, PathBuf) {
        let temp = TempDir::new().unwrap();
        let repo = scm::init(temp.path()).unwrap();
        let file = repo.workdir().join("report.docx");
        fs::write(&file, "committed").unwrap();
        commit_as(temp.path(), "report.docx", "Alice", 1_600_000_000, "draft");
        (temp, repo, file)
    }

    #[test]
    fn test_file_backup_round_trip() {
        let (_temp, repo, file) = repo_with_file();
        fs::write(&file, "uncommitted edits").unwrap();

        let guard = WorkingStateGuard::suspend(repo.as_ref(), &file).unwrap();
        let Some(SuspendToken::Backup { copy: backup, .. }) = guard.token().cloned() else {
            panic!("expected a file backup");
        };
        assert_eq!(fs::read_to_string(&backup).unwrap(), "uncommitted edits");

        fs::write(&file, "overwritten by a checkout").unwrap();
        guard.release().unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "uncommitted edits");
        assert!(!backup.exists());
    }

    #[test]
    fn test_file_backup_keeps_staged_change() {
        let (_temp, repo, file) = repo_with_file();
        fs::write(&file, "staged").unwrap();
        repo.stage(&file).unwrap();
        fs::write(&file, "staged, then edited").unwrap();
        let staged = repo.staged_entry(&file).unwrap();
        assert!(staged.is_some());

        let guard = WorkingStateGuard::suspend(repo.as_ref(), &file).unwrap();
        let revision = repo.list_revisions(&file).unwrap()[0].id.clone();
        repo.checkout(&revision, &file).unwrap();
        guard.release().unwrap();

        assert_eq!(repo.staged_entry(&file).unwrap(), staged);
        assert_eq!(fs::read_to_string(&file).unwrap(), "staged, then edited");
    }

    #[test]
    fn test_drop_restores_live_file() {
        let (_temp, repo, file) = repo_with_file();
        fs::write(&file, "uncommitted edits").unwrap();

        {
            let _guard = WorkingStateGuard::suspend(repo.as_ref(), &file).unwrap();
            fs::write(&file, "half way through history").unwrap();
        }

        assert_eq!(fs::read_to_string(&file).unwrap(), "uncommitted edits");
    }

    #[test]
    fn test_directory_shelf_round_trip() {
        let temp = TempDir::new().unwrap();
        let repo = scm::init(temp.path()).unwrap();
        let docs = repo.workdir().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), "committed").unwrap();
        commit_as(temp.path(), "docs", "Alice", 1_600_000_000, "one");

        fs::write(docs.join("a.txt"), "edited").unwrap();
        fs::write(docs.join("scratch.txt"), "untracked").unwrap();

        let guard = WorkingStateGuard::suspend(repo.as_ref(), &docs).unwrap();
        assert!(matches!(guard.token(), Some(SuspendToken::Shelf(Some(_)))));
        assert_eq!(fs::read_to_string(docs.join("a.txt")).unwrap(), "committed");

        guard.release().unwrap();

        assert_eq!(fs::read_to_string(docs.join("a.txt")).unwrap(), "edited");
        assert_eq!(fs::read_to_string(docs.join("scratch.txt")).unwrap(), "untracked");
    }

    #[test]
    fn test_clean_directory_has_empty_shelf() {
        let temp = TempDir::new().unwrap();
        let repo = scm::init(temp.path()).unwrap();
        let docs = repo.workdir().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), "committed").unwrap();
        commit_as(temp.path(), "docs", "Alice", 1_600_000_000, "one");

        let guard = WorkingStateGuard::suspend(repo.as_ref(), &docs).unwrap();
        assert_eq!(guard.token(), Some(&SuspendToken::Shelf(None)));
        guard.release().unwrap();
    }

    #[test]
    fn test_lost_backup_is_restore_failed() {
        let (_temp, repo, file) = repo_with_file();

        let guard = WorkingStateGuard::suspend(repo.as_ref(), &file).unwrap();
        let Some(SuspendToken::Backup { copy: backup, .. }) = guard.token().cloned() else {
            panic!("expected a file backup");
        };
        fsutil::remove_path(backup.parent().unwrap()).unwrap();

        let err = guard.release().unwrap_err();
        assert!(matches!(err, MilestoneError::RestoreFailed { .. }));
    }
}
