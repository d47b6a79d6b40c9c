//! Share command handler

use anyhow::Result;
use std::path::Path;

use crate::config::{ConfigManager, Settings};
use crate::share;
use crate::ui::Ui;

/// Handle share command
pub fn handle_share(ui: &dyn Ui, settings: &Settings, path: &Path) -> Result<()> {
    let Some(share_dir) = settings.share_dir.as_deref() else {
        ui.notify(&format!(
            "No share folder is set up yet. Add share_dir = \"<folder>\" to {}",
            ConfigManager::settings_path()?.display()
        ));
        return Ok(());
    };

    let target = share::share_path(path, share_dir)?;
    ui.notify(&format!("Shared as {}", target.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::ScriptedUi;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_share_into_configured_folder() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "v1").unwrap();
        let settings = Settings {
            share_dir: Some(temp.path().join("shared")),
            ..Settings::default()
        };
        let ui = ScriptedUi::default();

        handle_share(&ui, &settings, &file).unwrap();

        assert!(temp.path().join("shared").join("report.docx").exists());
        assert!(ui.last_message().unwrap().starts_with("Shared as"));
    }

    #[test]
    fn test_share_without_folder_explains_setup() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.docx");
        fs::write(&file, "v1").unwrap();
        let ui = ScriptedUi::default();

        handle_share(&ui, &Settings::default(), &file).unwrap();

        assert!(ui.last_message().unwrap().contains("share_dir"));
    }
}
