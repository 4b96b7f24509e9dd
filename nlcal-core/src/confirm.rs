//! Confirmation summary shown before anything is sent to the calendar.

use std::fmt::Write;

use crate::error::FormatError;
use crate::event::{Endpoint, EventInstant, RawExtraction, ResolvedEvent};

/// Long human-readable form, e.g. "Tuesday, May 06, 2025 at 03:00 PM".
pub const LONG_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

/// Shown instead of a zone name when instants are floating.
pub const UNKNOWN_TIMEZONE_LABEL: &str = "Local Timezone";

/// Everything needed to ask the user for confirmation and then submit.
///
/// Lives for a single loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationState {
    /// The model's original strings
    pub extraction: RawExtraction,
    pub event: ResolvedEvent,
    pub start_display: String,
    pub end_display: String,
    pub timezone_label: String,
}

impl ConfirmationState {
    pub fn new(extraction: RawExtraction, event: ResolvedEvent) -> Result<Self, FormatError> {
        let start_display = format_long(&event.start).map_err(|_| FormatError(Endpoint::Start))?;
        let end_display = format_long(&event.end).map_err(|_| FormatError(Endpoint::End))?;
        let timezone_label = event
            .start
            .timezone()
            .map(|tz| tz.name().to_string())
            .unwrap_or_else(|| UNKNOWN_TIMEZONE_LABEL.to_string());

        Ok(Self {
            extraction,
            event,
            start_display,
            end_display,
            timezone_label,
        })
    }
}

/// Render an instant in [`LONG_FORMAT`]. Fails if the formatter rejects it.
pub fn format_long(instant: &EventInstant) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write!(out, "{}", instant.naive_local().format(LONG_FORMAT))?;
    Ok(out)
}

/// The user's answer to the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// `yes`/`y`/`no`/`n`, case-insensitive. Anything else is `None`.
    pub fn parse(input: &str) -> Option<Answer> {
        match input.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(Answer::Yes),
            "no" | "n" => Some(Answer::No),
            _ => None,
        }
    }
}
