//! User interaction capabilities.
//!
//! The engine never talks to a terminal directly. Handlers receive a [`Ui`]
//! and go through [`Prompter`] for questions and [`Notifier`] for messages,
//! so tests can script answers and capture output.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::error::InquireError;
use inquire::{Confirm, Text};

/// Asks the user for input
pub trait Prompter {
    /// Ask for a line of text. `None` when the user cancelled or nobody can answer.
    fn prompt_for_text(&self, title: &str) -> Result<Option<String>>;

    /// Ask a yes/no question, answering `default` when nobody can answer
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Whether a person is there to answer prompts
    fn is_interactive(&self) -> bool;
}

/// Tells the user what happened
pub trait Notifier {
    fn notify(&self, message: &str);

    /// Report a failure; defaults to a plain notification
    fn alert(&self, message: &str) {
        self.notify(message);
    }
}

pub trait Ui: Prompter + Notifier {}

impl<T: Prompter + Notifier> Ui for T {}

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Terminal implementation built on `inquire`
pub struct ConsoleUi {
    interactive: bool,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self {
            interactive: is_interactive(),
        }
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

fn cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

impl Prompter for ConsoleUi {
    fn prompt_for_text(&self, title: &str) -> Result<Option<String>> {
        if !self.interactive {
            log::debug!("Not interactive, skipping prompt: {title}");
            return Ok(None);
        }

        match Text::new(title).prompt() {
            Ok(answer) => Ok(Some(answer.trim().to_string())),
            Err(e) if cancelled(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to read input"),
        }
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if !self.interactive {
            return Ok(default);
        }

        match Confirm::new(question).with_default(default).prompt() {
            Ok(answer) => Ok(answer),
            Err(e) if cancelled(&e) => Ok(false),
            Err(e) => Err(e).context("Failed to get confirmation"),
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl Notifier for ConsoleUi {
    fn notify(&self, message: &str) {
        println!("{}", message.cyan());
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message.red().bold());
    }
}
