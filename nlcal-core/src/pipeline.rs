//! One scheduling turn: extract, resolve, confirm, submit.
//!
//! The pipeline talks to two collaborators through capability traits so
//! the language model and the calendar can be swapped (or faked in tests)
//! without touching the turn logic. Nothing is retried: every failure is
//! reported and the turn ends.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::confirm::ConfirmationState;
use crate::console::{Console, Report};
use crate::error::{ExtractionFailure, SubmissionFailure, ValidationError};
use crate::event::{CreatedEvent, EventSubmission, RawExtraction, ResolvedEvent};
use crate::resolve::DateTimeResolver;

/// Turns a free-text request into event fields.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<RawExtraction, ExtractionFailure>;
}

/// Creates a single timed event on the user's calendar.
#[async_trait]
pub trait CalendarSubmitter: Send + Sync {
    async fn submit(&self, event: &EventSubmission) -> Result<CreatedEvent, SubmissionFailure>;
}

/// Why a turn ended before reaching the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAbort {
    Incomplete,
    Unresolved,
    FormatFailed,
}

/// What happened after the user confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Created(CreatedEvent),
    Invalid(ValidationError),
    SubmitFailed(SubmissionFailure),
}

pub struct SchedulingPipeline<E, S> {
    extractor: E,
    submitter: S,
    resolver: DateTimeResolver,
}

impl<E: Extractor, S: CalendarSubmitter> SchedulingPipeline<E, S> {
    pub fn new(extractor: E, submitter: S, resolver: DateTimeResolver) -> Self {
        Self {
            extractor,
            submitter,
            resolver,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Steps 1 to 3 of a turn: extraction, resolution and the confirmation
    /// summary. On success the summary has already been reported.
    pub async fn prepare(
        &self,
        line: &str,
        console: &mut impl Console,
    ) -> Result<ConfirmationState, TurnAbort> {
        debug!(request = line, "Extracting event details");

        let extraction = match self.extractor.extract(line).await {
            Ok(extraction) => extraction,
            Err(failure) => {
                warn!(error = %failure, "Extraction failed");
                console.report(&Report::Incomplete {
                    recovered: Vec::new(),
                    missing: Vec::new(),
                    failure: Some(failure),
                });
                return Err(TurnAbort::Incomplete);
            }
        };

        let missing = extraction.missing_required();
        if !missing.is_empty() {
            debug!(?missing, "Extraction is missing required fields");
            console.report(&Report::Incomplete {
                recovered: extraction.recovered(),
                missing,
                failure: None,
            });
            return Err(TurnAbort::Incomplete);
        }

        let (start, end) = match self.resolver.resolve(&extraction) {
            Ok(pair) => pair,
            Err(failure) => {
                console.report(&Report::Unresolved {
                    date: extraction.date().map(str::to_string),
                    start_time: extraction.start_time().map(str::to_string),
                    end_time: extraction.end_time().map(str::to_string),
                    failure,
                });
                return Err(TurnAbort::Unresolved);
            }
        };

        let event = ResolvedEvent {
            title: extraction.title().unwrap_or_default().trim().to_string(),
            start,
            end,
        };

        match ConfirmationState::new(extraction, event) {
            Ok(state) => {
                console.report(&Report::Confirmation(state.clone()));
                Ok(state)
            }
            Err(e) => {
                console.report(&Report::FormatFailed(e));
                Err(TurnAbort::FormatFailed)
            }
        }
    }

    /// Step 5 of a turn: validate and submit a confirmed event, once.
    pub async fn commit(
        &self,
        state: &ConfirmationState,
        console: &mut impl Console,
    ) -> CommitOutcome {
        let submission = match state.event.to_submission() {
            Ok(submission) => submission,
            Err(e) => {
                warn!(error = %e, "Refusing to submit invalid event");
                console.report(&Report::Invalid(e.clone()));
                return CommitOutcome::Invalid(e);
            }
        };

        console.report(&Report::Submitting);
        info!(
            title = %submission.title,
            start = %submission.start.to_rfc3339(),
            end = %submission.end.to_rfc3339(),
            "Creating event"
        );

        match self.submitter.submit(&submission).await {
            Ok(created) => {
                console.report(&Report::Created(created.clone()));
                CommitOutcome::Created(created)
            }
            Err(failure) => {
                warn!(error = %failure, "Event creation failed");
                console.report(&Report::SubmitFailed(failure.clone()));
                CommitOutcome::SubmitFailed(failure)
            }
        }
    }
}
