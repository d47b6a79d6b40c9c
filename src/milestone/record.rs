use anyhow::Result;
use log::info;
use std::path::Path;

use super::canonical_path;
use super::types::MarkOutcome;
use crate::scm::{self, CommitOutcome, Scm, MILESTONE_DIR_EXCLUDE};

/// Commits the current state of a path (`mark`)
pub struct MilestoneRecorder<'a> {
    scm: &'a dyn Scm,
}

impl<'a> MilestoneRecorder<'a> {
    pub fn new(scm: &'a dyn Scm) -> Self {
        Self { scm }
    }

    /// Stage `path` and commit it with `message`.
    ///
    /// An unchanged path yields [`CommitOutcome::NoChanges`], not an error.
    pub fn record(&self, path: &Path, message: &str) -> Result<MarkOutcome> {
        self.scm.exclude(MILESTONE_DIR_EXCLUDE)?;
        self.scm.stage(path)?;

        let outcome = self.scm.commit(message, path)?;
        match &outcome {
            CommitOutcome::Committed(id) => {
                info!("marked {} as {id}: {message}", path.display())
            }
            CommitOutcome::NoChanges => info!("{} is unchanged", path.display()),
        }

        Ok(outcome)
    }
}

/// Record a milestone of `path`, creating a repository at its working location on first use
pub fn record_milestone(path: &Path, message: &str) -> Result<MarkOutcome> {
    let path = canonical_path(path)?;
    let scm = scm::discover_or_init(&scm::working_location(&path))?;

    MilestoneRecorder::new(scm.as_ref()).record(&path, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MilestoneError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_first_mark_creates_repository() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();

        let outcome = record_milestone(&file, "draft").unwrap();

        assert!(matches!(outcome, CommitOutcome::Committed(_)));
        assert!(scm::is_repo(temp.path()));
    }

    #[test]
    fn test_mark_twice_is_no_changes() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();

        record_milestone(&file, "draft").unwrap();
        assert_eq!(record_milestone(&file, "again").unwrap(), CommitOutcome::NoChanges);
        assert_eq!(record_milestone(&file, "and again").unwrap(), CommitOutcome::NoChanges);
    }

    #[test]
    fn test_mark_folder_records_additions_and_deletions() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), "a").unwrap();
        fs::write(docs.join("b.txt"), "b").unwrap();
        record_milestone(&docs, "two files").unwrap();

        fs::remove_file(docs.join("b.txt")).unwrap();
        fs::write(docs.join("c.txt"), "c").unwrap();
        let outcome = record_milestone(&docs, "swap").unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));

        let repo = scm::discover(&docs).unwrap();
        assert!(!repo.has_changes(&docs).unwrap());
        assert_eq!(repo.list_revisions(&docs).unwrap().len(), 2);
    }

    #[test]
    fn test_mark_ignores_milestone_output() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();
        record_milestone(&file, "draft").unwrap();

        let output = temp.path().join("report_milestones");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("report_1.docx"), "draft").unwrap();

        let repo = scm::discover(temp.path()).unwrap();
        assert!(!repo.has_changes(repo.workdir()).unwrap());
    }

    #[test]
    fn test_mark_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = record_milestone(&temp.path().join("missing.txt"), "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MilestoneError>(),
            Some(MilestoneError::PathNotFound { .. })
        ));
    }
}
