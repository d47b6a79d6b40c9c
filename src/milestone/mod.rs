//! Milestone materialization and restoration engine.
//!
//! A *milestone* is one committed revision of a single file or folder,
//! rebuilt as a standalone copy the user can open next to the original:
//!
//! ```text
//! report.docx
//! report_milestones/
//!     .milestones.json      revision list, oldest first
//!     report_current.docx   live state when `show` ran
//!     report_1.docx         oldest revision, modified time = commit time
//!     report_2.docx
//! ```
//!
//! - [`record_milestone`] commits the current state (`mark`)
//! - [`show_milestones`] rebuilds the output folder (`show`)
//! - [`return_to_milestone`] / [`return_to_revision`] roll the live path back
//!   and commit the rollback (`return`)

mod guard;
mod materialize;
mod meta;
mod naming;
mod provenance;
mod record;
mod restore;
mod source;
mod types;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::MilestoneError;

pub use guard::{SuspendToken, WorkingStateGuard};
pub use materialize::{show_milestones, Materializer};
pub use meta::{MetaStore, META_FILE_NAME};
pub use naming::{output_dir_for, BaseName, Tag};
pub use provenance::{annotator_for, read_comment, Annotator};
pub use record::{record_milestone, MilestoneRecorder};
pub use restore::{
    return_to_milestone, return_to_revision, ResolvedMilestone, RestoreEngine,
    BEFORE_RETURN_PREFIX, RETURN_PREFIX,
};
pub use source::RevisionSource;
pub use types::{MarkOutcome, MilestoneEntry, MilestoneSet, RestoreOutcome, SkippedRevision};

/// Absolute, symlink-free form of a user supplied path
pub(crate) fn canonical_path(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|_| {
        MilestoneError::PathNotFound {
            path: path.to_path_buf(),
        }
        .into()
    })
}
