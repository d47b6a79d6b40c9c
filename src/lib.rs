//! # milestones
//!
//! Snapshot, browse and roll back the history of a single file or folder
//! without learning version control.
//!
//! ## Overview
//!
//! `milestones` layers three verbs over git:
//!
//! - **mark**: commit the current state of a path as a milestone
//! - **show**: rebuild every milestone as a standalone copy in a sibling
//!   `<name>_milestones` folder, stamped with the commit time and annotated
//!   with author and message
//! - **return**: pick one of those copies and roll the original back to it,
//!   recording the rollback as a new milestone
//!
//! The user's uncommitted work is set aside while history is browsed and is
//! always put back, even when a step fails or the process is interrupted.
//!
//! ## Architecture
//!
//! - Version control primitives ([`scm`])
//! - The milestone engine ([`milestone`]), with signal deferral ([`interrupt`])
//!   and filesystem helpers ([`fsutil`])
//! - Typed failure conditions ([`error`])
//! - Configuration and logging ([`config`], [`logger`])
//! - User interaction and the outer commands ([`ui`], [`identity`], [`report`],
//!   [`share`], [`handlers`])

/// Platform-agnostic configuration directory and user settings.
///
/// Resolves the configuration directory following platform conventions (XDG on
/// Linux, Application Support on macOS, AppData on Windows) and loads
/// `config.toml`.
pub mod config;

/// Failure conditions of the milestone engine.
pub mod error;

/// Copy, remove and timestamp helpers for files and folders.
pub mod fsutil;

/// Command handlers and the shared failure policy.
pub mod handlers;

/// First-run check of the committer identity.
pub mod identity;

/// Deferral of termination signals while the live path is suspended.
pub mod interrupt;

/// Logging configuration and utilities.
///
/// Logs to stderr with `--debug`, otherwise to a persistent log file in the
/// config directory. Includes automatic log rotation when the file exceeds its
/// size limit.
pub mod logger;

/// Materialization and restoration of milestones.
///
/// Enumerates the revisions of a path, rebuilds each one as a browsable copy,
/// suspends and restores the live working state around that process, and maps
/// a chosen copy back to its revision for a committed rollback.
pub mod milestone;

/// Issue reports with the recent log attached.
pub mod report;

/// Version control backend.
///
/// Defines the [`scm::Scm`] trait consumed by the milestone engine and its
/// implementation on top of the git command line.
pub mod scm;

/// Copying a file or folder into the configured share folder.
pub mod share;

/// Prompt and notification capabilities with a terminal implementation.
pub mod ui;
