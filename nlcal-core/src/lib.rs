//! Core of nlcal: turning a free-text request into a confirmed calendar event.
//!
//! This crate has no I/O of its own. It provides:
//! - `extraction`: locating and parsing the model's JSON answer
//! - `resolve`: turning date/time strings into zoned instants
//! - `pipeline` and `interaction`: the scheduling turn and the REPL state machine
//! - the `Extractor`, `CalendarSubmitter` and `Console` seams the binary plugs into

pub mod config;
pub mod confirm;
pub mod console;
pub mod error;
pub mod event;
pub mod extraction;
pub mod interaction;
pub mod pipeline;
pub mod resolve;

pub use config::Config;
pub use confirm::{Answer, ConfirmationState};
pub use console::{Console, ConsoleInput, Report};
pub use error::*;
pub use event::*;
pub use interaction::{InteractionLoop, LoopState};
pub use pipeline::{CalendarSubmitter, CommitOutcome, Extractor, SchedulingPipeline, TurnAbort};
pub use resolve::DateTimeResolver;
