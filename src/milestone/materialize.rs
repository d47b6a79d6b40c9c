//! The `show` algorithm: rebuild every revision of a path as a browsable copy.
//!
//! The live path is the only place the VCS can check a revision out to, so
//! each revision is checked out over it, copied into the output folder and
//! stamped. The [`WorkingStateGuard`] owns the live path for the duration and
//! hands it back exactly as it was.

use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use super::guard::WorkingStateGuard;
use super::meta::MetaStore;
use super::naming::{self, BaseName, Tag};
use super::provenance::{self, Annotator};
use super::source::RevisionSource;
use super::types::{MilestoneEntry, MilestoneSet, SkippedRevision};
use super::canonical_path;
use crate::config::ProvenanceStyle;
use crate::fsutil;
use crate::interrupt;
use crate::scm::{self, Revision, Scm, MILESTONE_DIR_EXCLUDE};

pub struct Materializer<'a> {
    scm: &'a dyn Scm,
    annotator: &'a dyn Annotator,
}

struct History {
    meta_path: PathBuf,
    entries: Vec<MilestoneEntry>,
    skipped: Vec<SkippedRevision>,
}

impl<'a> Materializer<'a> {
    pub fn new(scm: &'a dyn Scm, annotator: &'a dyn Annotator) -> Self {
        Self { scm, annotator }
    }

    /// Materialize the history of `path` into its output folder.
    ///
    /// Fails with [`crate::error::MilestoneError::NotTracked`] before touching the disk
    /// when the path has no history. Revisions that cannot be materialized
    /// are listed in [`MilestoneSet::skipped`]; the run still succeeds.
    pub fn materialize(&self, path: &Path) -> Result<MilestoneSet> {
        let path = canonical_path(path)?;
        let source = RevisionSource::new(self.scm);
        source.ensure_tracked(&path)?;

        let base = BaseName::of(&path)?;
        let output_dir = naming::output_dir_for(&path)?;

        if let Err(e) = self.scm.exclude(MILESTONE_DIR_EXCLUDE) {
            debug!("Could not exclude milestone folders: {e:#}");
        }

        info!(
            "materializing milestones of {} into {}",
            path.display(),
            output_dir.display()
        );
        fsutil::recreate_dir(&output_dir)?;

        let current_path = output_dir.join(base.copy_name(Tag::Current, None));
        fsutil::copy_path(&path, &current_path)?;

        let _deferral = interrupt::defer_signals();
        let guard = WorkingStateGuard::suspend(self.scm, &path)?;

        let history = self.materialize_history(&source, &path, &base, &output_dir);
        let released = guard.release();

        let history = match (history, released) {
            (Ok(history), Ok(())) => history,
            (Err(e), Ok(())) => return Err(e),
            (result, Err(restore_err)) => {
                if let Err(e) = result {
                    warn!("Materialization also failed: {e:#}");
                }
                return Err(restore_err.into());
            }
        };

        if !history.skipped.is_empty() {
            warn!(
                "{} of {} revisions of {} could not be materialized",
                history.skipped.len(),
                history.entries.len() + history.skipped.len(),
                path.display()
            );
        }

        Ok(MilestoneSet {
            source_path: path,
            output_dir,
            current_path,
            meta_path: history.meta_path,
            entries: history.entries,
            skipped: history.skipped,
        })
    }

    fn materialize_history(
        &self,
        source: &RevisionSource<'_>,
        path: &Path,
        base: &BaseName,
        output_dir: &Path,
    ) -> Result<History> {
        let revisions = source.list_revisions(path)?;
        let meta_path = MetaStore::write(output_dir, &revisions)?;

        let mut entries = Vec::with_capacity(revisions.len());
        let mut skipped = Vec::new();

        // Strictly oldest to newest: each checkout overwrites the live path
        for (offset, revision) in revisions.into_iter().enumerate() {
            interrupt::check()?;
            let index = offset + 1;

            match self.materialize_revision(path, base, output_dir, index, &revision) {
                Ok(copy) => {
                    debug!("milestone {index} is {}", copy.display());
                    entries.push(MilestoneEntry {
                        index,
                        revision,
                        path: copy,
                    });
                }
                Err(e) => {
                    warn!(
                        "Skipping milestone {index} ({}) of {}: {e:#}",
                        revision.short_id(),
                        path.display()
                    );
                    let partial = output_dir.join(base.copy_name(Tag::Index(index), None));
                    if let Err(cleanup) = fsutil::remove_path(&partial) {
                        debug!("Could not remove partial copy: {cleanup:#}");
                    }
                    skipped.push(SkippedRevision {
                        index,
                        revision,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        interrupt::check()?;

        Ok(History {
            meta_path,
            entries,
            skipped,
        })
    }

    fn materialize_revision(
        &self,
        path: &Path,
        base: &BaseName,
        output_dir: &Path,
        index: usize,
        revision: &Revision,
    ) -> Result<PathBuf> {
        self.scm.checkout(&revision.id, path)?;

        // Ignored files survive both the shelf and the checkout; only what
        // the revision tracks belongs in its copy
        let copy = output_dir.join(base.copy_name(Tag::Index(index), None));
        if path.is_dir() {
            let files = self.scm.tracked_files(path)?;
            fsutil::copy_listed(path, &files, &copy)?;
        } else {
            fsutil::copy_path(path, &copy)?;
        }

        let copy = self.annotator.annotate(&copy, base, index, revision)?;
        fsutil::set_modified(&copy, revision.modified_time())?;

        Ok(copy)
    }
}

/// Open the repository of `path` and materialize its milestones
pub fn show_milestones(path: &Path, style: ProvenanceStyle) -> Result<MilestoneSet> {
    let path = canonical_path(path)?;
    let scm = scm::discover(&scm::working_location(&path))?;
    let annotator = provenance::annotator_for(style);

    Materializer::new(scm.as_ref(), annotator.as_ref()).materialize(&path)
}
