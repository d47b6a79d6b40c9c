//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use milestones::scm::{self, Scm};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Whether a test runs against a single file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    File,
    Folder,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::File => "report.docx",
            Kind::Folder => "report",
        }
    }
}

/// A repository holding one tracked path
pub struct Workspace {
    pub temp: TempDir,
    pub repo: Box<dyn Scm>,
    pub path: PathBuf,
    pub kind: Kind,
}

impl Workspace {
    pub fn new(kind: Kind) -> Self {
        let temp = TempDir::new().unwrap();
        let repo = scm::init(temp.path()).unwrap();
        let path = repo.workdir().join(kind.name());
        Self {
            temp,
            repo,
            path,
            kind,
        }
    }

    /// Commit `content` as a new revision with a fixed author and time
    pub fn commit(&self, author: &str, epoch: i64, message: &str, content: &str) {
        write_state(self.kind, &self.path, content);
        commit_as(self.repo.workdir(), self.kind.name(), author, epoch, message);
    }

    pub fn output_dir(&self) -> PathBuf {
        self.repo.workdir().join("report_milestones")
    }
}

/// Put `content` into the path; a folder gets a main document plus one file per revision
pub fn write_state(kind: Kind, path: &Path, content: &str) {
    match kind {
        Kind::File => fs::write(path, content).unwrap(),
        Kind::Folder => {
            if path.exists() {
                fs::remove_dir_all(path).unwrap();
            }
            fs::create_dir_all(path.join("chapters")).unwrap();
            fs::write(path.join("main.txt"), content).unwrap();
            fs::write(path.join("chapters").join(format!("{content}.txt")), content).unwrap();
        }
    }
}

/// Every file under `path` (or `path` itself) with its content
pub fn snapshot(path: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(path).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Stage `pathspec` and commit it with a fixed committer and date
pub fn commit_as(dir: &Path, pathspec: &str, author: &str, epoch: i64, message: &str) {
    let date = format!("@{epoch} +0000");
    let email = format!("{}@example.com", author.to_lowercase());

    let status = Command::new("git")
        .args(["add", "-A", "--", pathspec])
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success());

    let status = Command::new("git")
        .args(["commit", "-q", "-m", message])
        .env("GIT_AUTHOR_NAME", author)
        .env("GIT_AUTHOR_EMAIL", &email)
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_NAME", author)
        .env("GIT_COMMITTER_EMAIL", &email)
        .env("GIT_COMMITTER_DATE", &date)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success());
}
