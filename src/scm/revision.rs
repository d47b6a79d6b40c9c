use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::fsutil;

/// Field separator used in `git log` output; cannot appear in names or subjects
pub(crate) const FIELD_SEPARATOR: char = '\u{1f}';

/// `git log --format` producing one revision per line
pub(crate) const LOG_FORMAT: &str = "--format=%H%x1f%cn%x1f%ct%x1f%s";

/// One historical change to a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Commit hash assigned by the VCS
    pub id: String,

    /// Display name of the committer
    pub author: String,

    /// Commit time in epoch seconds
    pub timestamp: i64,

    /// Short description (commit subject)
    pub message: String,
}

impl Revision {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            timestamp,
            message: message.into(),
        }
    }

    /// Parse one line produced with [`LOG_FORMAT`]
    pub(crate) fn parse_log_line(line: &str) -> Result<Self> {
        let mut fields = line.splitn(4, FIELD_SEPARATOR);
        let (Some(id), Some(author), Some(timestamp), Some(message)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(anyhow!("Unexpected git log line: {line:?}"));
        };

        let timestamp = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("Invalid commit time {timestamp:?}: {e}"))?;

        Ok(Self::new(id.trim(), author, timestamp, message))
    }

    /// First eight characters of the id
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Human readable provenance, e.g. `Alice: draft`
    pub fn provenance(&self) -> String {
        format!("{}: {}", self.author, self.message)
    }

    pub fn modified_time(&self) -> SystemTime {
        fsutil::epoch_to_system_time(self.timestamp)
    }

    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
