//! Provenance annotation of materialized copies.
//!
//! The meta record always carries author and message. Annotators mirror that
//! into something the user sees while browsing: a file comment where the
//! platform has one, or the visible file name.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::naming::{self, BaseName, Tag};
use crate::config::ProvenanceStyle;
use crate::scm::Revision;

/// Extended attribute read by file managers as the file comment
#[cfg(target_os = "linux")]
const COMMENT_ATTRIBUTE: &str = "user.xdg.comment";

/// Attach provenance to the copy tagged `index`, returning the copy's final path.
pub trait Annotator {
    fn annotate(
        &self,
        copy: &Path,
        base: &BaseName,
        index: usize,
        revision: &Revision,
    ) -> Result<PathBuf>;
}

/// Build the annotator for the configured style
pub fn annotator_for(style: ProvenanceStyle) -> Box<dyn Annotator> {
    match style {
        ProvenanceStyle::Auto => Box::new(AutoAnnotator),
        ProvenanceStyle::FileName => Box::new(FileNameAnnotator),
        ProvenanceStyle::Metadata => Box::new(CommentAnnotator),
        ProvenanceStyle::RecordOnly => Box::new(RecordOnlyAnnotator),
    }
}

/// Appends `- author - message` to the copy's name
pub struct FileNameAnnotator;

impl Annotator for FileNameAnnotator {
    fn annotate(
        &self,
        copy: &Path,
        base: &BaseName,
        index: usize,
        revision: &Revision,
    ) -> Result<PathBuf> {
        let provenance = naming::name_provenance(revision);
        let renamed = copy.with_file_name(base.copy_name(Tag::Index(index), Some(&provenance)));

        debug!("renaming {} to {}", copy.display(), renamed.display());
        fs::rename(copy, &renamed).with_context(|| {
            format!("Failed to rename {} to {}", copy.display(), renamed.display())
        })?;

        Ok(renamed)
    }
}

/// Writes `author: message` as the file comment; copies keep plain names
pub struct CommentAnnotator;

impl Annotator for CommentAnnotator {
    fn annotate(
        &self,
        copy: &Path,
        _base: &BaseName,
        _index: usize,
        revision: &Revision,
    ) -> Result<PathBuf> {
        if let Err(e) = write_comment(copy, &revision.provenance()) {
            warn!("Could not set the comment of {}: {e:#}", copy.display());
        }
        Ok(copy.to_path_buf())
    }
}

/// File comment when supported, file name otherwise
pub struct AutoAnnotator;

impl Annotator for AutoAnnotator {
    fn annotate(
        &self,
        copy: &Path,
        base: &BaseName,
        index: usize,
        revision: &Revision,
    ) -> Result<PathBuf> {
        match write_comment(copy, &revision.provenance()) {
            Ok(()) => Ok(copy.to_path_buf()),
            Err(e) => {
                debug!("No file comments for {} ({e:#}), using the name", copy.display());
                FileNameAnnotator.annotate(copy, base, index, revision)
            }
        }
    }
}

/// Leaves copies untouched
pub struct RecordOnlyAnnotator;

impl Annotator for RecordOnlyAnnotator {
    fn annotate(&self, copy: &Path, _: &BaseName, _: usize, _: &Revision) -> Result<PathBuf> {
        Ok(copy.to_path_buf())
    }
}

#[cfg(target_os = "linux")]
fn write_comment(path: &Path, comment: &str) -> Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())?;
    let c_name = CString::new(COMMENT_ATTRIBUTE)?;

    // SAFETY: both strings are NUL terminated and the value slice outlives the call
    let rc = unsafe {
        libc::setxattr(
            c_path.as_ptr(),
            c_name.as_ptr(),
            comment.as_ptr().cast(),
            comment.len(),
            0,
        )
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error()).context("setxattr failed")
    }
}

#[cfg(not(target_os = "linux"))]
fn write_comment(_path: &Path, _comment: &str) -> Result<()> {
    Err(anyhow!("file comments are not supported on this platform"))
}

/// Read back a comment written by [`CommentAnnotator`]
#[cfg(target_os = "linux")]
pub fn read_comment(path: &Path) -> Result<Option<String>> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())?;
    let c_name = CString::new(COMMENT_ATTRIBUTE)?;
    let mut buffer = vec![0u8; 4096];

    // SAFETY: the buffer is valid for `buffer.len()` bytes
    let len = unsafe {
        libc::getxattr(
            c_path.as_ptr(),
            c_name.as_ptr(),
            buffer.as_mut_ptr().cast(),
            buffer.len(),
        )
    };

    if len < 0 {
        let err = std::io::Error::last_os_error();
        return if err.raw_os_error() == Some(libc::ENODATA) {
            Ok(None)
        } else {
            Err(anyhow!(err))
        };
    }

    buffer.truncate(len as usize);
    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

#[cfg(not(target_os = "linux"))]
pub fn read_comment(_path: &Path) -> Result<Option<String>> {
    Ok(None)
}
