use std::path::PathBuf;

use crate::scm::{CommitOutcome, Revision};

/// One materialized revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneEntry {
    /// 1-based position in revision order
    pub index: usize,
    pub revision: Revision,
    /// Final location of the copy, after any provenance rename
    pub path: PathBuf,
}

impl MilestoneEntry {
    pub fn provenance(&self) -> String {
        self.revision.provenance()
    }
}

/// A revision that could not be materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRevision {
    pub index: usize,
    pub revision: Revision,
    pub reason: String,
}

/// Output of one materialization run
#[derive(Debug, Clone)]
pub struct MilestoneSet {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    /// Copy of the live state taken before history was browsed
    pub current_path: PathBuf,
    pub meta_path: PathBuf,
    /// Materialized revisions, oldest first
    pub entries: Vec<MilestoneEntry>,
    pub skipped: Vec<SkippedRevision>,
}

impl MilestoneSet {
    /// Whether every revision was materialized
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Number of revisions recorded in the meta record
    pub fn revision_count(&self) -> usize {
        self.entries.len() + self.skipped.len()
    }
}

/// What `return` did to the live path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The revision's content was committed as a new revision
    Restored {
        revision_id: String,
        /// Revision recording uncommitted work from before the return
        safety_revision: Option<String>,
    },
    /// The live path already had the revision's content
    AlreadyCurrent { safety_revision: Option<String> },
}

impl RestoreOutcome {
    pub fn safety_revision(&self) -> Option<&str> {
        match self {
            RestoreOutcome::Restored {
                safety_revision, ..
            }
            | RestoreOutcome::AlreadyCurrent { safety_revision } => safety_revision.as_deref(),
        }
    }
}

/// Result of `mark`
pub type MarkOutcome = CommitOutcome;
