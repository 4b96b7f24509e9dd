//! Colored terminal rendering of reports.

use nlcal_core::{ConfirmationState, ExtractionFailure, Field, Report};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

const REPHRASE: &str = "Could you please rephrase or provide more specific info?";

impl Render for Report {
    fn render(&self) -> String {
        match self {
            Report::Welcome => [
                "--- Welcome to nlcal! ---".bold().to_string(),
                "You can ask me to schedule meetings, appointments, etc.".to_string(),
                format!(
                    "Example: {}",
                    "'Schedule a team meeting next Tuesday from 3 PM to 4 PM'".cyan()
                ),
                format!("Type {} or {} to stop.", "quit".bold(), "exit".bold()),
            ]
            .join("\n"),

            Report::Goodbye => "\nGoodbye!".to_string(),

            Report::Incomplete {
                recovered,
                missing,
                failure,
            } => render_incomplete(recovered, missing, failure.as_ref()),

            Report::Unresolved {
                date,
                start_time,
                end_time,
                failure,
            } => format!(
                "\n{}\n  Date='{}', Start='{}', End='{}'\n{}\nCould you please write the date and time more clearly?",
                "Sorry, I could not work out the date and time.".yellow(),
                date.as_deref().unwrap_or(""),
                start_time.as_deref().unwrap_or(""),
                end_time.as_deref().unwrap_or(""),
                failure.to_string().dimmed(),
            ),

            Report::FormatFailed(e) => format!(
                "{} Please try rephrasing.",
                format!("Error displaying the parsed dates: {e}.").red()
            ),

            Report::Confirmation(state) => state.render(),

            Report::InvalidAnswer => "Please answer y/n.".yellow().to_string(),

            Report::Declined => {
                "Okay, I won't schedule this event. Please provide the correct details or a new request."
                    .to_string()
            }

            Report::Cancelled => "\nOperation cancelled.".dimmed().to_string(),

            Report::Submitting => "Proceeding with event creation...".dimmed().to_string(),

            Report::Invalid(e) => format!("{} {e}", "Not scheduling this event:".red()),

            Report::Created(created) => match &created.html_link {
                Some(link) => format!("{} {}", "Event created:".green(), link.underline()),
                None => format!("{} (id {})", "Event created".green(), created.id),
            },

            Report::SubmitFailed(e) => format!(
                "{}\n{}",
                "An error occurred creating the calendar event.".red(),
                e
            ),
        }
    }
}

fn render_incomplete(
    recovered: &[(Field, String)],
    missing: &[Field],
    failure: Option<&ExtractionFailure>,
) -> String {
    let mut lines = Vec::new();

    if recovered.is_empty() {
        lines.push(format!(
            "\n{}",
            "Sorry, I couldn't understand the scheduling details from that.".yellow()
        ));
    } else {
        lines.push("\nI understood some details:".to_string());
        lines.extend(
            recovered
                .iter()
                .map(|(field, value)| format!("- {}: {}", field.label(), value)),
        );
        let missing = missing
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "\nbut the key information is missing: {}",
            missing.yellow()
        ));
    }

    if let Some(failure) = failure {
        lines.push(failure.to_string().dimmed().to_string());
    }

    lines.push(REPHRASE.to_string());
    lines.join("\n")
}

impl Render for ConfirmationState {
    fn render(&self) -> String {
        let tz = format!("({})", self.timezone_label);
        [
            "\nOkay, I understood the following event details:".to_string(),
            format!("- Title: {}", self.event.title.bold()),
            format!("- Start: {} {}", self.start_display, tz.dimmed()),
            format!("- End:   {} {}", self.end_display, tz.dimmed()),
        ]
        .join("\n")
    }
}
