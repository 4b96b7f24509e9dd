//! Error types for each stage of a scheduling turn.
//!
//! Every error here is non-fatal: the pipeline turns it into a report and
//! the interaction loop carries on with the next request.

use thiserror::Error;

use crate::event::{Endpoint, Field};

/// Errors produced while turning a request into a [`RawExtraction`](crate::RawExtraction).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("could not read event details from the model output: {0}")]
    Unparseable(String),

    #[error("language model request failed: {0}")]
    Model(String),
}

/// Errors produced by the [`DateTimeResolver`](crate::DateTimeResolver).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("missing required field: {0}")]
    MissingRequired(Field),

    #[error("could not parse start date/time: \"{input}\"")]
    UnparseableStart { input: String },
}

/// An instant could not be rendered for the confirmation summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not format the {0} date/time")]
pub struct FormatError(pub Endpoint);

/// Pre-submission checks on a resolved event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event title is empty")]
    EmptyTitle,

    #[error("{0} time has no timezone information")]
    MissingTimezone(Endpoint),

    #[error("event end is not after its start")]
    NotAfterStart,
}

/// Failures reported by the calendar collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    #[error("calendar authorization failed: {0}")]
    Unauthorized(String),

    #[error("calendar request failed: {0}")]
    Request(String),
}

/// The terminal could not be read.
#[derive(Error, Debug)]
#[error("failed to read input: {0}")]
pub struct ConsoleError(pub String);
