//! Mark command handler

use anyhow::Result;
use std::path::Path;

use crate::error::MilestoneError;
use crate::milestone::{self, MarkOutcome};
use crate::ui::Ui;

/// Shown when `mark` gets no comment
pub const MISSING_COMMENT: &str = "You must write some comment. No changes were made.";

/// Handle mark command, asking for a comment when none was given
pub fn handle_mark(ui: &dyn Ui, path: &Path, message: Option<&str>) -> Result<()> {
    if !path.exists() {
        return Err(MilestoneError::PathNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let given = message.map(str::trim).filter(|m| !m.is_empty());
    let message = match given {
        Some(message) => message.to_string(),
        None => {
            let answer = ui.prompt_for_text("Describe this milestone:")?;
            match answer.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) {
                Some(message) => message,
                None => {
                    ui.notify(MISSING_COMMENT);
                    return Ok(());
                }
            }
        }
    };

    match milestone::record_milestone(path, &message)? {
        MarkOutcome::Committed(_) => ui.notify(&format!("Milestone marked: {message}")),
        MarkOutcome::NoChanges => {
            ui.notify("Nothing has changed since the last milestone, so no new one was marked.")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm;
    use crate::ui::testing::ScriptedUi;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_mark_with_message() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();
        let ui = ScriptedUi::default();

        handle_mark(&ui, &file, Some("first draft")).unwrap();

        assert_eq!(
            ui.last_message().as_deref(),
            Some("Milestone marked: first draft")
        );
        assert!(scm::is_repo(temp.path()));
    }

    #[test]
    fn test_mark_prompts_for_message() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();
        let ui = ScriptedUi::with_answers([Some("typed comment")]);

        handle_mark(&ui, &file, None).unwrap();

        assert_eq!(
            ui.last_message().as_deref(),
            Some("Milestone marked: typed comment")
        );
    }

    #[test]
    fn test_mark_without_comment_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();
        let ui = ScriptedUi::with_answers([Some("  ")]);

        handle_mark(&ui, &file, Some("")).unwrap();

        assert_eq!(ui.last_message().as_deref(), Some(MISSING_COMMENT));
        assert!(!scm::is_repo(temp.path()));
    }

    #[test]
    fn test_mark_unchanged_is_notified() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "draft").unwrap();
        let ui = ScriptedUi::default();

        handle_mark(&ui, &file, Some("one")).unwrap();
        handle_mark(&ui, &file, Some("two")).unwrap();

        assert!(ui.last_message().unwrap().starts_with("Nothing has changed"));
    }
}
