use std::path::PathBuf;
use thiserror::Error;

/// Conditions raised by the milestone engine.
///
/// Values of this type travel inside `anyhow::Error` and are recovered at the
/// command layer with `downcast_ref`, which decides whether the user sees a
/// plain notification or the unexpected-failure flow.
#[derive(Debug, Error)]
pub enum MilestoneError {
    /// The path has never been committed
    #[error("'{}' has no milestones yet", path.display())]
    NotTracked { path: PathBuf },

    /// No repository exists for the working location
    #[error("No repository found for '{}'", path.display())]
    RepositoryMissing { path: PathBuf },

    /// The meta record is missing or cannot be decoded
    #[error("Milestone record '{}' is unreadable: {reason}", path.display())]
    CorruptMeta { path: PathBuf, reason: String },

    /// A milestone copy whose name does not carry an index
    #[error("'{name}' does not follow the milestone naming convention")]
    MalformedMilestoneName { name: String },

    /// The directory holding the copy has no meta record
    #[error("'{}' is not a milestone output", path.display())]
    NotAMilestone { path: PathBuf },

    #[error("Milestone {index} is out of range (1..={count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// The live path could not be put back after browsing history
    #[error("Failed to restore '{}': {reason}", path.display())]
    RestoreFailed { path: PathBuf, reason: String },

    #[error("'{command}' failed ({status}): {stderr}")]
    ExternalCommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{}' does not exist", path.display())]
    PathNotFound { path: PathBuf },

    #[error("Revision '{id}' is not part of the history of '{}'", path.display())]
    UnknownRevision { id: String, path: PathBuf },

    #[error("Operation interrupted")]
    Interrupted,
}

impl MilestoneError {
    /// Whether this condition is an ordinary outcome the user should simply be told about
    pub fn is_expected(&self) -> bool {
        !matches!(
            self,
            MilestoneError::RestoreFailed { .. } | MilestoneError::ExternalCommandFailed { .. }
        )
    }

    /// Text shown to the user for expected conditions
    pub fn user_message(&self) -> String {
        match self {
            MilestoneError::NotTracked { .. } | MilestoneError::RepositoryMissing { .. } => {
                "There are no milestones for this file".to_string()
            }
            MilestoneError::NotAMilestone { .. } => {
                "This is not a milestone of any file or folder".to_string()
            }
            MilestoneError::MalformedMilestoneName { name } => format!(
                "'{name}' is not a numbered milestone. Pick one of the numbered copies."
            ),
            MilestoneError::IndexOutOfRange { index, count } => format!(
                "Milestone {index} does not exist, there are only {count} milestones"
            ),
            MilestoneError::CorruptMeta { .. } => {
                "This is not a milestone output: its milestone record is damaged. \
                 Run 'show' again to rebuild it."
                    .to_string()
            }
            MilestoneError::RestoreFailed { path, reason } => format!(
                "Could not put '{}' back after browsing milestones: {reason}\n\
                 Your work may need to be recovered manually.",
                path.display()
            ),
            MilestoneError::Interrupted => {
                "Stopped. Your file was put back the way it was.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Look for a `MilestoneError` anywhere in an error chain
pub fn milestone_error(err: &anyhow::Error) -> Option<&MilestoneError> {
    err.downcast_ref::<MilestoneError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_restore_failed_is_not_expected() {
        let err = MilestoneError::RestoreFailed {
            path: PathBuf::from("/tmp/report.docx"),
            reason: "stash pop failed".to_string(),
        };
        assert!(!err.is_expected());
        assert!(err.user_message().contains("recovered manually"));
    }

    #[test]
    fn test_user_facing_conditions_are_expected() {
        assert!(MilestoneError::NotTracked { path: PathBuf::from("a") }.is_expected());
        assert!(MilestoneError::NotAMilestone { path: PathBuf::from("a") }.is_expected());
        assert!(MilestoneError::IndexOutOfRange { index: 4, count: 2 }.is_expected());
        assert!(!MilestoneError::ExternalCommandFailed {
            command: "git log".to_string(),
            status: "exit status: 128".to_string(),
            stderr: String::new(),
        }
        .is_expected());
    }

    #[test]
    fn test_corrupt_meta_reads_as_not_a_milestone() {
        let err = MilestoneError::CorruptMeta {
            path: PathBuf::from(".milestones.json"),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.is_expected());
        assert!(err.user_message().starts_with("This is not a milestone output"));
    }

    #[test]
    fn test_downcast_through_context() {
        let err: anyhow::Error = Err::<(), _>(MilestoneError::Interrupted)
            .context("while materializing")
            .unwrap_err();
        assert!(matches!(milestone_error(&err), Some(MilestoneError::Interrupted)));
    }
}
