use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MilestoneError;
use crate::scm::Revision;

/// Reserved name of the meta record inside an output folder
pub const META_FILE_NAME: &str = ".milestones.json";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Persists the revision list next to the materialized copies
///
/// The record is a JSON array of `{id, author, timestamp, message}` in
/// revision order, so entry `i - 1` describes the copy tagged `i`.
pub struct MetaStore;

impl MetaStore {
    pub fn record_path(output_dir: &Path) -> PathBuf {
        output_dir.join(META_FILE_NAME)
    }

    /// Write the revision list into `output_dir` and return the record path
    pub fn write(output_dir: &Path, revisions: &[Revision]) -> Result<PathBuf> {
        if !output_dir.is_dir() {
            return Err(anyhow!("{} is not a directory", output_dir.display()));
        }

        let path = Self::record_path(output_dir);
        let json =
            serde_json::to_string_pretty(revisions).context("Failed to serialize milestones")?;

        debug!("writing meta record to: {}", path.display());
        fs::write(&path, json)
            .with_context(|| format!("Failed to write meta record: {}", path.display()))?;

        Ok(path)
    }

    /// Read a record written by [`MetaStore::write`].
    ///
    /// A leading byte-order mark is dropped and stray non-UTF-8 bytes are
    /// decoded lossily, so records touched by other tools still load.
    pub fn read(record_path: &Path) -> Result<Vec<Revision>> {
        let corrupt = |reason: String| MilestoneError::CorruptMeta {
            path: record_path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(record_path).map_err(|e| corrupt(e.to_string()))?;
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        };

        let revisions: Vec<Revision> =
            serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;

        Ok(revisions)
    }

    /// Find the record of the output folder `dir`.
    ///
    /// Fails with [`MilestoneError::NotAMilestone`] when there is none.
    pub fn locate(dir: &Path) -> Result<PathBuf> {
        let path = Self::record_path(dir);
        if path.is_file() {
            Ok(path)
        } else {
            Err(MilestoneError::NotAMilestone {
                path: dir.to_path_buf(),
            }
            .into())
        }
    }
}
