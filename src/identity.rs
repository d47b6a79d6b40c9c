//! First-run identity check.
//!
//! Every milestone is a commit and commits carry a name and e-mail. When
//! neither the global nor the system VCS configuration provides them, the
//! user is asked once and the answers are stored globally.

use anyhow::Result;
use log::info;

use crate::scm::{self, Identity};
use crate::ui::Ui;

/// Where the committer identity is read from and saved to
pub trait IdentityStore {
    fn read(&self) -> Result<Identity>;
    fn write(&self, name: &str, email: &str) -> Result<()>;
}

/// The user's global git configuration
pub struct GlobalGitIdentity;

impl IdentityStore for GlobalGitIdentity {
    fn read(&self) -> Result<Identity> {
        scm::read_identity()
    }

    fn write(&self, name: &str, email: &str) -> Result<()> {
        scm::write_global_identity(name, email)
    }
}

/// Make sure commits can be attributed, asking the user if needed.
///
/// Returns `true` when a new identity was written.
pub fn ensure_identity(ui: &dyn Ui, store: &dyn IdentityStore) -> Result<bool> {
    let current = store.read()?;
    if current.is_complete() {
        return Ok(false);
    }

    if !ui.is_interactive() {
        log::debug!("No identity configured and nobody to ask");
        return Ok(false);
    }

    ui.notify("Before your first milestone, please tell us who you are. This is a one-time step.");

    let Some((name, email)) = ask_identity(ui, &current)? else {
        ui.notify("Nothing was saved. You will be asked again next time.");
        return Ok(false);
    };

    store.write(&name, &email)?;
    info!("saved identity {name} <{email}>");
    ui.notify(&format!("Thanks, {name}! Your milestones will be signed with this name."));

    Ok(true)
}

fn ask_identity(ui: &dyn Ui, current: &Identity) -> Result<Option<(String, String)>> {
    let name = match &current.name {
        Some(name) => name.clone(),
        None => match non_empty(ui.prompt_for_text("Your name:")?) {
            Some(name) => name,
            None => return Ok(None),
        },
    };

    let email = match &current.email {
        Some(email) => email.clone(),
        None => match non_empty(ui.prompt_for_text("Your e-mail address:")?) {
            Some(email) => email,
            None => return Ok(None),
        },
    };

    Ok(Some((name, email)))
}

fn non_empty(answer: Option<String>) -> Option<String> {
    answer
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}
