//! Terminal implementation of the core `Console`.

use nlcal_core::{Console, ConsoleError, ConsoleInput, Report};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::render::Render;

pub struct TerminalConsole {
    editor: DefaultEditor,
}

impl TerminalConsole {
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput, ConsoleError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ConsoleInput::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ConsoleInput::Interrupted),
            Err(ReadlineError::Eof) => Ok(ConsoleInput::Eof),
            Err(e) => Err(ConsoleError(e.to_string())),
        }
    }

    fn report(&mut self, report: &Report) {
        println!("{}", report.render());
    }
}
