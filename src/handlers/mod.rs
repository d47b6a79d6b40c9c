//! Command handler modules
//!
//! One module per command, plus the failure policy every command shares:
//! expected conditions become a plain notification, a failed restore is
//! reported as fatal, and anything else is logged in full with an offer to
//! send an issue report.

pub mod mark;
pub mod report;
pub mod restore;
pub mod share;
pub mod show;

use log::{error, info};

use crate::config::Settings;
use crate::error::{milestone_error, MilestoneError};
use crate::report::{report_issue, ReportSender};
use crate::ui::Ui;

pub use mark::handle_mark;
pub use report::handle_report;
pub use restore::handle_return;
pub use share::handle_share;
pub use show::handle_show;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_UNEXPECTED: u8 = 1;
pub const EXIT_RESTORE_FAILED: u8 = 2;

/// Tell the user about a failed command and pick the exit code
pub fn report_failure(
    ui: &dyn Ui,
    settings: &Settings,
    sender: &dyn ReportSender,
    err: &anyhow::Error,
) -> u8 {
    match milestone_error(err) {
        Some(condition) if condition.is_expected() => {
            info!("{err:#}");
            ui.notify(&condition.user_message());
            EXIT_SUCCESS
        }
        Some(condition) if matches!(condition, MilestoneError::RestoreFailed { .. }) => {
            error!("{err:?}");
            ui.alert(&condition.user_message());
            EXIT_RESTORE_FAILED
        }
        _ => {
            error!("{err:?}");
            ui.alert(&format!("Sorry, something went wrong: {err:#}"));
            offer_report(ui, settings, sender);
            EXIT_UNEXPECTED
        }
    }
}

fn offer_report(ui: &dyn Ui, settings: &Settings, sender: &dyn ReportSender) {
    if !ui.is_interactive() {
        return;
    }

    match ui.confirm("Would you like to send us a report about this problem?", true) {
        Ok(true) => {
            if let Err(e) = report_issue(ui, sender, settings) {
                error!("Failed to send issue report: {e:?}");
                ui.alert("The report could not be sent either. Details are in the log file.");
            }
        }
        Ok(false) => {}
        Err(e) => error!("Failed to ask about an issue report: {e:?}"),
    }
}
