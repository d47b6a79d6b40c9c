//! The `return` algorithm: roll a path back to a materialized milestone.
//!
//! A rollback is itself committed, so history stays linear and every state
//! the user returned from can be returned to again.

use anyhow::Result;
use log::{debug, info};
use std::path::{Path, PathBuf};

use super::canonical_path;
use super::meta::MetaStore;
use super::naming::{self, Tag};
use super::record::MilestoneRecorder;
use super::source::RevisionSource;
use super::types::RestoreOutcome;
use crate::error::MilestoneError;
use crate::fsutil;
use crate::scm::{self, CommitOutcome, Revision, Scm};

/// Message prefix of the revision recording a return
pub const RETURN_PREFIX: &str = "Return to: ";

/// Message prefix of the revision saving uncommitted work before a return
pub const BEFORE_RETURN_PREFIX: &str = "Before returning to: ";

/// A milestone copy mapped back to the revision it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMilestone {
    pub milestone_path: PathBuf,
    pub output_dir: PathBuf,
    /// Live path the milestone belongs to
    pub original_path: PathBuf,
    pub index: usize,
    pub revision: Revision,
}

impl ResolvedMilestone {
    /// Map a materialized copy to its revision.
    ///
    /// Nothing on disk is modified, whatever the outcome.
    pub fn resolve(milestone_path: &Path) -> Result<Self> {
        let milestone_path = canonical_path(milestone_path)?;
        let not_a_milestone = || MilestoneError::NotAMilestone {
            path: milestone_path.clone(),
        };

        // The copy's name can only be parsed once the output folder is known
        let output_dir = milestone_path
            .parent()
            .ok_or_else(not_a_milestone)?
            .to_path_buf();
        let meta_path = MetaStore::locate(&output_dir)?;
        let stem = naming::stem_of_output_dir(&output_dir).ok_or_else(not_a_milestone)?;

        let file_name = milestone_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(not_a_milestone)?;
        let parsed = naming::parse_copy_name(&file_name, &stem, milestone_path.is_dir())?;

        let index = match parsed.tag {
            Tag::Index(index) => index,
            Tag::Current => {
                return Err(MilestoneError::MalformedMilestoneName { name: file_name }.into())
            }
        };

        let revisions = MetaStore::read(&meta_path)?;
        if index == 0 || index > revisions.len() {
            return Err(MilestoneError::IndexOutOfRange {
                index,
                count: revisions.len(),
            }
            .into());
        }
        let revision = revisions[index - 1].clone();

        let original_path = output_dir
            .parent()
            .ok_or_else(not_a_milestone)?
            .join(parsed.base.file_name());

        debug!(
            "{} is milestone {index} ({}) of {}",
            milestone_path.display(),
            revision.short_id(),
            original_path.display()
        );

        Ok(Self {
            milestone_path,
            output_dir,
            original_path,
            index,
            revision,
        })
    }
}

/// Checks revisions back out over the live path and commits the rollback
pub struct RestoreEngine<'a> {
    scm: &'a dyn Scm,
    mark_before_return: bool,
}

impl<'a> RestoreEngine<'a> {
    pub fn new(scm: &'a dyn Scm) -> Self {
        Self {
            scm,
            mark_before_return: true,
        }
    }

    /// Commit uncommitted work before overwriting it (default `true`)
    pub fn mark_before_return(mut self, enabled: bool) -> Self {
        self.mark_before_return = enabled;
        self
    }

    /// Return to a resolved milestone, then discard its output folder
    pub fn restore_milestone(&self, milestone: &ResolvedMilestone) -> Result<RestoreOutcome> {
        let outcome = self.return_to(&milestone.original_path, &milestone.revision)?;

        info!("removing {}", milestone.output_dir.display());
        fsutil::remove_path(&milestone.output_dir)?;

        Ok(outcome)
    }

    /// Return `path` to the revision whose id is, or starts with, `id`
    pub fn restore_revision(&self, path: &Path, id: &str) -> Result<(Revision, RestoreOutcome)> {
        let revision = self.find_revision(path, id)?;
        let outcome = self.return_to(path, &revision)?;

        // Copies materialized before the return no longer match the live history
        let output_dir = naming::output_dir_for(path)?;
        if MetaStore::record_path(&output_dir).is_file() {
            info!("removing stale {}", output_dir.display());
            fsutil::remove_path(&output_dir)?;
        }

        Ok((revision, outcome))
    }

    fn find_revision(&self, path: &Path, id: &str) -> Result<Revision> {
        let unknown = || MilestoneError::UnknownRevision {
            id: id.to_string(),
            path: path.to_path_buf(),
        };

        let id = id.trim();
        if id.is_empty() {
            return Err(unknown().into());
        }

        let revisions = RevisionSource::new(self.scm).list_revisions(path)?;
        let mut matches = revisions.into_iter().filter(|r| r.id.starts_with(id));

        match (matches.next(), matches.next()) {
            (Some(revision), None) => Ok(revision),
            _ => Err(unknown().into()),
        }
    }

    fn return_to(&self, path: &Path, revision: &Revision) -> Result<RestoreOutcome> {
        let safety_revision = if self.mark_before_return && self.scm.has_changes(path)? {
            let message = format!("{BEFORE_RETURN_PREFIX}{}", revision.message);
            match MilestoneRecorder::new(self.scm).record(path, &message)? {
                CommitOutcome::Committed(id) => Some(id),
                CommitOutcome::NoChanges => None,
            }
        } else {
            None
        };

        info!(
            "returning {} to {} ({})",
            path.display(),
            revision.short_id(),
            revision.message
        );
        self.scm.checkout(&revision.id, path)?;
        self.scm.stage(path)?;

        let message = format!("{RETURN_PREFIX}{}", revision.message);
        Ok(match self.scm.commit(&message, path)? {
            CommitOutcome::Committed(revision_id) => RestoreOutcome::Restored {
                revision_id,
                safety_revision,
            },
            CommitOutcome::NoChanges => RestoreOutcome::AlreadyCurrent { safety_revision },
        })
    }
}

/// Resolve `milestone_path` and return its original path to it
pub fn return_to_milestone(
    milestone_path: &Path,
    mark_before_return: bool,
) -> Result<(ResolvedMilestone, RestoreOutcome)> {
    let milestone = ResolvedMilestone::resolve(milestone_path)?;
    let scm = scm::discover(&scm::working_location(&milestone.original_path))?;

    let outcome = RestoreEngine::new(scm.as_ref())
        .mark_before_return(mark_before_return)
        .restore_milestone(&milestone)?;

    Ok((milestone, outcome))
}

/// Return `path` directly to one of its revisions
pub fn return_to_revision(
    path: &Path,
    id: &str,
    mark_before_return: bool,
) -> Result<(Revision, RestoreOutcome)> {
    let path = canonical_path(path)?;
    let scm = scm::discover(&scm::working_location(&path))?;

    RestoreEngine::new(scm.as_ref())
        .mark_before_return(mark_before_return)
        .restore_revision(&path, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestone::provenance::{FileNameAnnotator, RecordOnlyAnnotator};
    use crate::milestone::Materializer;
    use crate::scm::test_support::commit_as;
    use std::fs;
    use tempfile::TempDir;

    fn report_with_history(temp: &TempDir) -> (Box<dyn Scm>, PathBuf) {
        let repo = scm::init(temp.path()).unwrap();
        let file = repo.workdir().join("report.docx");

        fs::write(&file, "first draft").unwrap();
        commit_as(temp.path(), "report.docx", "Alice", 1_000_000_000, "draft");
        fs::write(&file, "second draft").unwrap();
        commit_as(temp.path(), "report.docx", "Bob", 1_000_000_500, "edits");

        (repo, file)
    }

    fn head_message(repo: &dyn Scm, path: &Path) -> String {
        repo.list_revisions(path).unwrap().pop().unwrap().message
    }

    #[test]
    fn test_restore_first_milestone() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let set = Materializer::new(repo.as_ref(), &RecordOnlyAnnotator)
            .materialize(&file)
            .unwrap();

        let milestone = ResolvedMilestone::resolve(&set.entries[0].path).unwrap();
        assert_eq!(milestone.index, 1);
        assert_eq!(milestone.original_path, file);

        let outcome = RestoreEngine::new(repo.as_ref())
            .restore_milestone(&milestone)
            .unwrap();

        assert!(matches!(outcome, RestoreOutcome::Restored { safety_revision: None, .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "first draft");
        assert_eq!(head_message(repo.as_ref(), &file), "Return to: draft");
        assert!(!set.output_dir.exists());
        assert!(!repo.has_changes(&file).unwrap());
    }

    #[test]
    fn test_restore_annotated_copy() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let set = Materializer::new(repo.as_ref(), &FileNameAnnotator)
            .materialize(&file)
            .unwrap();
        assert_eq!(
            set.entries[1].path.file_name().unwrap(),
            "report_2 - Bob - edits.docx"
        );

        let milestone = ResolvedMilestone::resolve(&set.entries[1].path).unwrap();
        assert_eq!(milestone.index, 2);
        assert_eq!(milestone.revision.author, "Bob");
    }

    #[test]
    fn test_uncommitted_work_is_marked_before_return() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let set = Materializer::new(repo.as_ref(), &RecordOnlyAnnotator)
            .materialize(&file)
            .unwrap();
        fs::write(&file, "unsaved thoughts").unwrap();

        let milestone = ResolvedMilestone::resolve(&set.entries[0].path).unwrap();
        let outcome = RestoreEngine::new(repo.as_ref())
            .restore_milestone(&milestone)
            .unwrap();

        assert!(outcome.safety_revision().is_some());
        let messages: Vec<_> = repo
            .list_revisions(&file)
            .unwrap()
            .into_iter()
            .map(|r| r.message)
            .collect();
        assert_eq!(
            messages,
            vec!["draft", "edits", "Before returning to: draft", "Return to: draft"]
        );
    }

    #[test]
    fn test_return_to_latest_is_already_current() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let set = Materializer::new(repo.as_ref(), &RecordOnlyAnnotator)
            .materialize(&file)
            .unwrap();

        let milestone = ResolvedMilestone::resolve(&set.entries[1].path).unwrap();
        let outcome = RestoreEngine::new(repo.as_ref())
            .restore_milestone(&milestone)
            .unwrap();

        assert_eq!(
            outcome,
            RestoreOutcome::AlreadyCurrent {
                safety_revision: None
            }
        );
        assert_eq!(head_message(repo.as_ref(), &file), "edits");
    }

    #[test]
    fn test_current_copy_is_not_a_numbered_milestone() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let set = Materializer::new(repo.as_ref(), &RecordOnlyAnnotator)
            .materialize(&file)
            .unwrap();

        let err = ResolvedMilestone::resolve(&set.current_path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MilestoneError>(),
            Some(MilestoneError::MalformedMilestoneName { .. })
        ));
    }

    #[test]
    fn test_restore_revision_by_prefix() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);
        let first = repo.list_revisions(&file).unwrap().remove(0);

        let (revision, outcome) = RestoreEngine::new(repo.as_ref())
            .restore_revision(&file, &first.id[..10])
            .unwrap();

        assert_eq!(revision, first);
        assert!(matches!(outcome, RestoreOutcome::Restored { .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "first draft");
    }

    #[test]
    fn test_restore_unknown_revision() {
        let temp = TempDir::new().unwrap();
        let (repo, file) = report_with_history(&temp);

        for id in ["", "zzzz"] {
            let err = RestoreEngine::new(repo.as_ref())
                .restore_revision(&file, id)
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<MilestoneError>(),
                Some(MilestoneError::UnknownRevision { .. })
            ));
        }
        assert_eq!(fs::read_to_string(&file).unwrap(), "second draft");
    }
}
