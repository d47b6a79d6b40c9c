use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::error::MilestoneError;
use crate::scm::{Revision, Scm};

/// Ordered history of a single path
pub struct RevisionSource<'a> {
    scm: &'a dyn Scm,
}

impl<'a> RevisionSource<'a> {
    pub fn new(scm: &'a dyn Scm) -> Self {
        Self { scm }
    }

    /// Fail with [`MilestoneError::NotTracked`] unless `path` has history
    pub fn ensure_tracked(&self, path: &Path) -> Result<()> {
        if self.scm.is_tracked(path)? {
            Ok(())
        } else {
            Err(MilestoneError::NotTracked {
                path: path.to_path_buf(),
            }
            .into())
        }
    }

    /// Revisions that modified `path`, oldest first
    pub fn list_revisions(&self, path: &Path) -> Result<Vec<Revision>> {
        let revisions = self.scm.list_revisions(path)?;
        debug!("{} has {} revisions", path.display(), revisions.len());

        if revisions.is_empty() {
            return Err(MilestoneError::NotTracked {
                path: path.to_path_buf(),
            }
            .into());
        }

        Ok(revisions)
    }
}
