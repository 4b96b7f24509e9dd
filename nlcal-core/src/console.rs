//! The user-facing side of the interaction loop.
//!
//! The core never prints. Everything the user should see is a [`Report`],
//! and the binary decides how to render it.

use crate::confirm::ConfirmationState;
use crate::error::{
    ConsoleError, ExtractionFailure, FormatError, ResolutionFailure, SubmissionFailure,
    ValidationError,
};
use crate::event::{CreatedEvent, Field};

pub const INPUT_PROMPT: &str = "> ";

pub const CONFIRM_PROMPT: &str = "Shall I schedule this event in your calendar? (yes/no): ";

/// Commands that end the session when typed at the main prompt.
pub const EXIT_COMMANDS: [&str; 4] = ["quit", "exit", "bye", "q"];

/// Result of reading one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D or closed stdin
    Eof,
}

/// Something the user should be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Welcome,
    Goodbye,
    /// The request could not be turned into a complete set of event fields.
    Incomplete {
        recovered: Vec<(Field, String)>,
        missing: Vec<Field>,
        failure: Option<ExtractionFailure>,
    },
    /// Dates or times could not be resolved.
    Unresolved {
        date: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
        failure: ResolutionFailure,
    },
    FormatFailed(FormatError),
    Confirmation(ConfirmationState),
    InvalidAnswer,
    Declined,
    Cancelled,
    Submitting,
    Invalid(ValidationError),
    Created(CreatedEvent),
    SubmitFailed(SubmissionFailure),
}

/// Line input plus report output.
pub trait Console {
    fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput, ConsoleError>;

    fn report(&mut self, report: &Report);
}

/// Whether a line typed at the main prompt ends the session.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    EXIT_COMMANDS.contains(&line.as_str())
}
