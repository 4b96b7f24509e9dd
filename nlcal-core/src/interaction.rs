//! The read-confirm-submit loop driving a session.

use tracing::{debug, error};

use crate::confirm::{Answer, ConfirmationState};
use crate::console::{CONFIRM_PROMPT, Console, ConsoleInput, INPUT_PROMPT, Report, is_exit_command};
use crate::pipeline::{CalendarSubmitter, Extractor, SchedulingPipeline};

#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingInput,
    /// A summary has been shown and the user has not answered yet.
    AwaitingConfirmation(Box<ConfirmationState>),
    Stopped,
}

pub struct InteractionLoop<E, S, C> {
    pipeline: SchedulingPipeline<E, S>,
    console: C,
    state: LoopState,
}

impl<E, S, C> InteractionLoop<E, S, C>
where
    E: Extractor,
    S: CalendarSubmitter,
    C: Console,
{
    pub fn new(pipeline: SchedulingPipeline<E, S>, console: C) -> Self {
        Self {
            pipeline,
            console,
            state: LoopState::AwaitingInput,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn into_parts(self) -> (SchedulingPipeline<E, S>, C) {
        (self.pipeline, self.console)
    }

    /// Run until the user exits. Per-request failures never end the session.
    pub async fn run(&mut self) {
        self.console.report(&Report::Welcome);

        while self.state != LoopState::Stopped {
            self.step().await;
        }

        self.console.report(&Report::Goodbye);
    }

    /// Read one line and advance the state machine by one transition.
    pub async fn step(&mut self) {
        let state = std::mem::replace(&mut self.state, LoopState::Stopped);

        self.state = match state {
            LoopState::AwaitingInput => self.on_input().await,
            LoopState::AwaitingConfirmation(pending) => self.on_confirmation(*pending).await,
            LoopState::Stopped => LoopState::Stopped,
        };
    }

    async fn on_input(&mut self) -> LoopState {
        let line = match self.console.read_line(INPUT_PROMPT) {
            Ok(ConsoleInput::Line(line)) => line,
            Ok(ConsoleInput::Interrupted | ConsoleInput::Eof) => return LoopState::Stopped,
            Err(e) => {
                error!(error = %e, "Stopping session");
                return LoopState::Stopped;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            return LoopState::AwaitingInput;
        }
        if is_exit_command(line) {
            debug!(command = line, "Exit requested");
            return LoopState::Stopped;
        }

        match self.pipeline.prepare(line, &mut self.console).await {
            Ok(pending) => LoopState::AwaitingConfirmation(Box::new(pending)),
            Err(abort) => {
                debug!(?abort, "Turn ended before confirmation");
                LoopState::AwaitingInput
            }
        }
    }

    async fn on_confirmation(&mut self, pending: ConfirmationState) -> LoopState {
        let answer = match self.console.read_line(CONFIRM_PROMPT) {
            Ok(ConsoleInput::Line(answer)) => answer,
            Ok(ConsoleInput::Interrupted) => {
                self.console.report(&Report::Cancelled);
                return LoopState::AwaitingInput;
            }
            Ok(ConsoleInput::Eof) => return LoopState::Stopped,
            Err(e) => {
                error!(error = %e, "Stopping session");
                return LoopState::Stopped;
            }
        };

        match Answer::parse(&answer) {
            Some(Answer::Yes) => {
                let outcome = self.pipeline.commit(&pending, &mut self.console).await;
                debug!(?outcome, "Turn finished");
                LoopState::AwaitingInput
            }
            Some(Answer::No) => {
                self.console.report(&Report::Declined);
                LoopState::AwaitingInput
            }
            None => {
                self.console.report(&Report::InvalidAnswer);
                LoopState::AwaitingConfirmation(Box::new(pending))
            }
        }
    }
}
