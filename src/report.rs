use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::{ConfigManager, Settings};
use crate::logger;
use crate::scm;
use crate::ui::Ui;

/// Subject line of every issue report
pub const REPORT_SUBJECT: &str = "Milestones: Issue report";

/// How much of the log file travels with a report
const LOG_TAIL_BYTES: u64 = 64 * 1024;

const UNKNOWN_SENDER: &str = "unknown";

/// Delivers issue reports
pub trait ReportSender {
    fn send_report(
        &self,
        sender: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<()>;
}

/// An issue report as handed to the outbox
///
/// Reports are stored one per file so a separate mail step can pick them up
/// and delete them once delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    /// Unique identifier, also used in the file name
    pub id: Uuid,

    /// When the report was written
    pub created_at: DateTime<Utc>,

    /// E-mail address from the VCS identity, or `unknown`
    pub sender: String,

    pub recipients: Vec<String>,

    pub subject: String,

    /// The user's description followed by the log tail
    pub body: String,
}

/// Writes reports as JSON files into a directory
pub struct OutboxSender {
    dir: PathBuf,
}

impl OutboxSender {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Outbox inside the configuration directory
    pub fn from_config() -> Result<Self> {
        Ok(Self::new(ConfigManager::outbox_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSender for OutboxSender {
    fn send_report(
        &self,
        sender: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create outbox: {}", self.dir.display()))?;

        let report = IssueReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sender: sender.to_string(),
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let path = self.dir.join(format!(
            "report-{}-{}.json",
            report.created_at.format("%Y%m%d%H%M%S"),
            report.id
        ));
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        info!("issue report written to {}", path.display());
        Ok(())
    }
}

/// Report body: the description, then the recent log
pub fn compose_body(description: &str, log_tail: &str) -> String {
    format!("{}\n\n--- Recent log ---\n{}", description.trim(), log_tail)
}

/// Ask for a description and send an issue report.
///
/// Returns `false` when the user gave no description.
pub fn report_issue(ui: &dyn Ui, sender: &dyn ReportSender, settings: &Settings) -> Result<bool> {
    let description = match ui.prompt_for_text("Please describe the problem:")? {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            ui.notify("No report was sent.");
            return Ok(false);
        }
    };

    let from = scm::read_identity()?
        .email
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let log_tail = logger::read_log_tail(LOG_TAIL_BYTES)
        .unwrap_or_else(|e| format!("(log unavailable: {e:#})"));

    sender.send_report(
        &from,
        &settings.report_recipients,
        REPORT_SUBJECT,
        &compose_body(&description, &log_tail),
    )?;

    ui.notify("Thank you! Your report will help us improve Milestones.");
    Ok(true)
}
