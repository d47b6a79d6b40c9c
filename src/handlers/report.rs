//! Report command handler

use anyhow::Result;

use crate::config::Settings;
use crate::report::{self, OutboxSender};
use crate::ui::Ui;

/// Handle report command
pub fn handle_report(ui: &dyn Ui, settings: &Settings) -> Result<()> {
    let outbox = OutboxSender::from_config()?;
    report::report_issue(ui, &outbox, settings)?;
    Ok(())
}
