//! Return command handler

use anyhow::Result;
use std::path::Path;

use crate::config::Settings;
use crate::milestone::{self, RestoreOutcome, BEFORE_RETURN_PREFIX};
use crate::ui::Ui;

/// Handle return command.
///
/// Without `revision`, `path` is a milestone copy inside an output folder.
/// With it, `path` is the live file or folder.
pub fn handle_return(
    ui: &dyn Ui,
    settings: &Settings,
    path: &Path,
    revision: Option<&str>,
) -> Result<()> {
    let (message, outcome) = match revision {
        Some(id) => {
            let (revision, outcome) =
                milestone::return_to_revision(path, id, settings.mark_before_return)?;
            (revision.message, outcome)
        }
        None => {
            let (milestone, outcome) =
                milestone::return_to_milestone(path, settings.mark_before_return)?;
            (milestone.revision.message, outcome)
        }
    };

    if outcome.safety_revision().is_some() {
        ui.notify(&format!(
            "Your unsaved changes were marked first as \"{BEFORE_RETURN_PREFIX}{message}\"."
        ));
    }

    match outcome {
        RestoreOutcome::Restored { .. } => ui.notify(&format!("Returned to: {message}")),
        RestoreOutcome::AlreadyCurrent { .. } => {
            ui.notify(&format!("Already at this milestone: {message}"))
        }
    }

    Ok(())
}
