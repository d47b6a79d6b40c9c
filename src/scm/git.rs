//! Git SCM backend using CLI commands.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::revision::{Revision, LOG_FORMAT};
use super::{CommitOutcome, Scm, ShelfHandle, StagedEntry};
use crate::error::MilestoneError;

const FALLBACK_NAME: &str = "Milestones";
const FALLBACK_EMAIL: &str = "milestones@localhost";

/// Git SCM implementation using the git CLI.
pub struct GitScm {
    workdir: PathBuf,
}

/// Committer identity from the git configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.email.is_some()
    }
}

fn git_command(cwd: Option<&Path>, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("--literal-pathspecs").args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Run git and hand back the raw output, whatever the exit status.
fn run_raw(cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
    debug!("git {}", args.join(" "));
    let output = git_command(cwd, args)
        .output()
        .with_context(|| format!("Failed to run 'git {}'", args.join(" ")))?;

    if !output.stdout.is_empty() {
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
    }

    Ok(output)
}

/// Run git and return stdout, failing on a non-zero exit.
fn run(cwd: Option<&Path>, args: &[&str]) -> Result<String> {
    let stdout = run_checked(cwd, args)?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

/// Like [`run`], but stdout is returned byte for byte
fn run_checked(cwd: Option<&Path>, args: &[&str]) -> Result<Vec<u8>> {
    let output = run_raw(cwd, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("git {} failed: {}", args.join(" "), stderr);
        return Err(MilestoneError::ExternalCommandFailed {
            command: format!("git {}", args.join(" ")),
            status: output.status.to_string(),
            stderr,
        }
        .into());
    }

    Ok(output.stdout)
}

fn config_get(cwd: Option<&Path>, key: &str) -> Result<Option<String>> {
    let output = run_raw(cwd, &["config", "--get", key])?;
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if output.status.success() && !value.is_empty() {
        Ok(Some(value))
    } else {
        Ok(None)
    }
}

/// Read the effective committer identity
pub fn read_identity() -> Result<Identity> {
    Ok(Identity {
        name: config_get(None, "user.name")?,
        email: config_get(None, "user.email")?,
    })
}

/// Write the committer identity to the global git configuration
pub fn write_global_identity(name: &str, email: &str) -> Result<()> {
    run(None, &["config", "--global", "user.name", name])?;
    run(None, &["config", "--global", "user.email", email])?;
    Ok(())
}

impl GitScm {
    /// Open the repository containing `location`.
    pub fn discover(location: &Path) -> Result<Self> {
        if !location.is_dir() {
            return Err(MilestoneError::PathNotFound {
                path: location.to_path_buf(),
            }
            .into());
        }

        let output = run_raw(Some(location), &["rev-parse", "--show-toplevel"])?;
        let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !output.status.success() || toplevel.is_empty() {
            return Err(MilestoneError::RepositoryMissing {
                path: location.to_path_buf(),
            }
            .into());
        }

        let toplevel = PathBuf::from(toplevel);
        let workdir = toplevel.canonicalize().unwrap_or(toplevel);

        Ok(Self { workdir })
    }

    /// Initialize a new Git repository.
    pub fn init(location: &Path) -> Result<Self> {
        fs::create_dir_all(location)
            .with_context(|| format!("Failed to create directory '{}'", location.display()))?;

        run(Some(location), &["init", "-q"])?;

        // Commits need an identity; fall back to a local one if none is configured
        if config_get(Some(location), "user.name")?.is_none() {
            run(Some(location), &["config", "user.name", FALLBACK_NAME])?;
        }
        if config_get(Some(location), "user.email")?.is_none() {
            run(Some(location), &["config", "user.email", FALLBACK_EMAIL])?;
        }

        Self::discover(location)
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        run(Some(&self.workdir), args)
    }

    /// Check if a git command succeeds (exit code 0).
    fn git_succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(run_raw(Some(&self.workdir), args)?.status.success())
    }

    /// Repository-relative pathspec for an absolute path
    fn pathspec(&self, path: &Path) -> String {
        let canonical = path.canonicalize().unwrap_or_else(|_| {
            // The live path may be gone; its parent still anchors it in the tree
            match (path.parent().and_then(|p| p.canonicalize().ok()), path.file_name()) {
                (Some(parent), Some(name)) => parent.join(name),
                _ => path.to_path_buf(),
            }
        });
        match canonical.strip_prefix(&self.workdir) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }

    fn stash_head(&self) -> Result<Option<String>> {
        let output = run_raw(
            Some(&self.workdir),
            &["rev-parse", "-q", "--verify", "refs/stash"],
        )?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((output.status.success() && !id.is_empty()).then_some(id))
    }

    fn has_head(&self) -> Result<bool> {
        self.git_succeeds(&["rev-parse", "-q", "--verify", "HEAD"])
    }

    fn has_staged_changes(&self, spec: &str) -> Result<bool> {
        let output = run_raw(
            Some(&self.workdir),
            &["diff", "--cached", "--quiet", "--", spec],
        )?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(MilestoneError::ExternalCommandFailed {
                command: format!("git diff --cached --quiet -- {spec}"),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into()),
        }
    }
}

impl Scm for GitScm {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_tracked(&self, path: &Path) -> Result<bool> {
        if !self.has_head()? {
            return Ok(false);
        }
        let spec = self.pathspec(path);
        let last = self.run_git(&["log", "-1", "--format=%H", "--", &spec])?;
        Ok(!last.is_empty())
    }

    fn stage(&self, path: &Path) -> Result<()> {
        let spec = self.pathspec(path);
        self.run_git(&["add", "-A", "--", &spec])?;
        Ok(())
    }

    fn commit(&self, message: &str, path: &Path) -> Result<CommitOutcome> {
        let spec = self.pathspec(path);

        if !self.has_staged_changes(&spec)? {
            return Ok(CommitOutcome::NoChanges);
        }

        if self.has_head()? {
            self.run_git(&["commit", "-q", "-m", message, "--", &spec])?;
        } else {
            self.run_git(&["commit", "-q", "-m", message])?;
        }

        Ok(CommitOutcome::Committed(self.current_commit_hash()?))
    }

    fn list_revisions(&self, path: &Path) -> Result<Vec<Revision>> {
        let spec = self.pathspec(path);
        let output = self.run_git(&["log", "--reverse", LOG_FORMAT, "--", &spec])?;

        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Revision::parse_log_line)
            .collect()
    }

    fn checkout(&self, revision: &str, path: &Path) -> Result<()> {
        let spec = self.pathspec(path);
        self.run_git(&["checkout", "-q", "--no-overlay", revision, "--", &spec])?;
        Ok(())
    }

    fn has_changes(&self, path: &Path) -> Result<bool> {
        let spec = self.pathspec(path);
        let output = self.run_git(&["status", "--porcelain", "--", &spec])?;
        Ok(!output.is_empty())
    }

    fn tracked_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let spec = self.pathspec(path);
        let output = run_checked(Some(&self.workdir), &["ls-files", "-z", "--", &spec])?;

        Ok(output
            .split(|&b| b == 0)
            .filter(|name| !name.is_empty())
            .map(|name| self.workdir.join(String::from_utf8_lossy(name).as_ref()))
            .collect())
    }

    fn staged_entry(&self, path: &Path) -> Result<Option<StagedEntry>> {
        let spec = self.pathspec(path);
        if !self.has_head()? || !self.has_staged_changes(&spec)? {
            return Ok(None);
        }

        // "<mode> <object> <stage>\t<path>"
        let listing = self.run_git(&["ls-files", "-s", "--", &spec])?;
        let Some(line) = listing.lines().next() else {
            return Ok(Some(StagedEntry::Removed));
        };

        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(mode), Some(object)) => Ok(Some(StagedEntry::Blob {
                mode: mode.to_string(),
                object: object.to_string(),
            })),
            _ => Err(anyhow!("Unexpected index entry for {spec}: {line}")),
        }
    }

    fn restore_staged_entry(&self, path: &Path, entry: &StagedEntry) -> Result<()> {
        let spec = self.pathspec(path);
        match entry {
            StagedEntry::Blob { mode, object } => {
                let cacheinfo = format!("{mode},{object},{spec}");
                self.run_git(&["update-index", "--add", "--cacheinfo", &cacheinfo])?;
            }
            StagedEntry::Removed => {
                self.run_git(&["update-index", "--force-remove", "--", &spec])?;
            }
        }
        Ok(())
    }

    fn shelve(&self, path: &Path) -> Result<Option<ShelfHandle>> {
        let spec = self.pathspec(path);
        let before = self.stash_head()?;
        let label = format!("milestones: {spec}");

        self.run_git(&[
            "stash",
            "push",
            "--include-untracked",
            "-m",
            &label,
            "--",
            &spec,
        ])?;

        let after = self.stash_head()?;
        if after.is_some() && after != before {
            Ok(after.map(|id| ShelfHandle { id }))
        } else {
            Ok(None)
        }
    }

    fn unshelve(&self, handle: &ShelfHandle) -> Result<()> {
        let list = self.run_git(&["stash", "list", "--format=%H"])?;
        let position = list
            .lines()
            .position(|line| line.trim() == handle.id)
            .ok_or_else(|| anyhow!("Shelved changes {} are no longer in the stash", handle.id))?;
        let entry = format!("stash@{{{position}}}");

        if let Err(e) = self.run_git(&["stash", "pop", "-q", "--index", &entry]) {
            warn!("Could not reinstate the index from {entry} ({e}), retrying without it");
            self.run_git(&["stash", "pop", "-q", &entry])?;
        }

        Ok(())
    }

    fn current_commit_hash(&self) -> Result<String> {
        self.run_git(&["rev-parse", "HEAD"])
    }

    fn exclude(&self, pattern: &str) -> Result<()> {
        let relative = self.run_git(&["rev-parse", "--git-path", "info/exclude"])?;
        let exclude_path = self.workdir.join(relative);

        let existing = match fs::read_to_string(&exclude_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", exclude_path.display()))
            }
        };

        if existing.lines().any(|line| line.trim() == pattern) {
            return Ok(());
        }

        if let Some(parent) = exclude_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(pattern);
        content.push('\n');

        fs::write(&exclude_path, content)
            .with_context(|| format!("Failed to write {}", exclude_path.display()))
    }
}
