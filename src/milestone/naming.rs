//! Deterministic names for milestone copies.
//!
//! A path `report.docx` gets the output folder `report_milestones`, holding
//! `report_current.docx`, `report_1.docx`, `report_2.docx`, ... Folders keep
//! their whole name as the stem. When provenance goes into the visible name
//! the copy becomes `report_1 - Alice - draft.docx`.

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::MilestoneError;
use crate::scm::Revision;

pub const OUTPUT_DIR_SUFFIX: &str = "_milestones";
pub const CURRENT_TAG: &str = "current";

const PROVENANCE_SEPARATOR: &str = " - ";
const MAX_PROVENANCE_CHARS: usize = 80;

/// Which copy a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// 1-based position in the revision list
    Index(usize),
    /// The live state at the time of the run
    Current,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Index(index) => write!(f, "{index}"),
            Tag::Current => f.write_str(CURRENT_TAG),
        }
    }
}

/// A file or folder name split into stem and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseName {
    pub stem: String,
    /// Extension including the leading dot, empty for folders
    pub ext: String,
}

impl BaseName {
    pub fn from_name(name: &str, is_dir: bool) -> Self {
        if is_dir {
            return Self {
                stem: name.to_string(),
                ext: String::new(),
            };
        }

        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());
        let ext = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Self { stem, ext }
    }

    pub fn of(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .ok_or_else(|| anyhow!("'{}' has no file name", path.display()))?;
        Ok(Self::from_name(&name.to_string_lossy(), path.is_dir()))
    }

    /// Name of the original file or folder
    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem, self.ext)
    }

    pub fn output_dir_name(&self) -> String {
        format!("{}{}", self.stem, OUTPUT_DIR_SUFFIX)
    }

    /// Name of the copy tagged `tag`, optionally carrying provenance text
    pub fn copy_name(&self, tag: Tag, provenance: Option<&str>) -> String {
        match provenance.filter(|p| !p.is_empty()) {
            Some(text) => format!(
                "{}_{}{}{}{}",
                self.stem, tag, PROVENANCE_SEPARATOR, text, self.ext
            ),
            None => format!("{}_{}{}", self.stem, tag, self.ext),
        }
    }
}

/// Sibling folder that receives the copies of `path`
pub fn output_dir_for(path: &Path) -> Result<PathBuf> {
    let base = BaseName::of(path)?;
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("'{}' has no parent folder", path.display()))?;
    Ok(parent.join(base.output_dir_name()))
}

/// Stem encoded in an output folder name, if it is one
pub fn stem_of_output_dir(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_string_lossy().to_string();
    name.strip_suffix(OUTPUT_DIR_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// A copy name taken apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub base: BaseName,
    pub tag: Tag,
}

/// Recover the original name and tag from a copy name.
///
/// `stem` comes from the output folder, which keeps stems containing `_` or
/// ` - ` unambiguous.
pub fn parse_copy_name(
    file_name: &str,
    stem: &str,
    is_dir: bool,
) -> std::result::Result<ParsedName, MilestoneError> {
    let malformed = || MilestoneError::MalformedMilestoneName {
        name: file_name.to_string(),
    };

    let rest = file_name
        .strip_prefix(stem)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or_else(malformed)?;

    let ext = if is_dir {
        String::new()
    } else {
        Path::new(file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    };

    let body = rest.strip_suffix(ext.as_str()).ok_or_else(malformed)?;
    let tag_text = body
        .split_once(PROVENANCE_SEPARATOR)
        .map(|(tag, _)| tag)
        .unwrap_or(body);

    let tag = if tag_text == CURRENT_TAG {
        Tag::Current
    } else if !tag_text.is_empty() && tag_text.chars().all(|c| c.is_ascii_digit()) {
        Tag::Index(tag_text.parse().map_err(|_| malformed())?)
    } else {
        return Err(malformed());
    };

    Ok(ParsedName {
        base: BaseName {
            stem: stem.to_string(),
            ext,
        },
        tag,
    })
}

/// Provenance text fit for a file name, e.g. `Alice - draft`
pub fn name_provenance(revision: &Revision) -> String {
    sanitize(&format!(
        "{}{}{}",
        revision.author, PROVENANCE_SEPARATOR, revision.message
    ))
}

/// Replace characters that are invalid in file names (and dots, which would
/// be taken for an extension), collapse whitespace and cap the length
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_PROVENANCE_CHARS).collect();
    truncated.trim_end().to_string()
}
