//! Show command handler

use anyhow::Result;
use std::path::Path;

use crate::config::Settings;
use crate::milestone::{self, MilestoneSet};
use crate::ui::Ui;

/// Handle show command
pub fn handle_show(ui: &dyn Ui, settings: &Settings, path: &Path) -> Result<()> {
    let set = milestone::show_milestones(path, settings.provenance)?;
    ui.notify(&summary(&set));
    Ok(())
}

fn summary(set: &MilestoneSet) -> String {
    let mut text = format!(
        "{} milestones of {} are in {}",
        set.entries.len(),
        set.source_path.display(),
        set.output_dir.display()
    );

    for entry in &set.entries {
        let when = entry
            .revision
            .committed_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        text.push_str(&format!(
            "\n  {:>3}  {}  {}",
            entry.index,
            when,
            entry.provenance()
        ));
    }

    if !set.is_complete() {
        let skipped: Vec<String> = set.skipped.iter().map(|s| s.index.to_string()).collect();
        text.push_str(&format!(
            "\nSome milestones could not be recreated: {}",
            skipped.join(", ")
        ));
    }

    text
}
