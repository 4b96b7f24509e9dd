//! Event insertion into the user's primary Google calendar.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use google_calendar::types::{Event, EventDateTime, SendUpdates};
use nlcal_core::{CalendarSubmitter, Config, CreatedEvent, EventSubmission, SubmissionFailure};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth;
use crate::credentials::ClientSecrets;
use crate::session::Tokens;

const PRIMARY_CALENDAR: &str = "primary";

/// Authorized access to the primary calendar.
pub struct GoogleCalendar {
    secrets: ClientSecrets,
    token_file: PathBuf,
    tokens: Mutex<Tokens>,
}

impl GoogleCalendar {
    pub fn new(secrets: ClientSecrets, tokens: Tokens, token_file: PathBuf) -> Self {
        Self {
            secrets,
            token_file,
            tokens: Mutex::new(tokens),
        }
    }

    /// Load client secrets and authorize, running the consent flow if needed.
    pub async fn connect(config: &Config) -> Result<Self> {
        let secrets = ClientSecrets::load(&config.credentials_file)?;
        let tokens = auth::authorize(&secrets, &config.token_file, &config.scopes).await?;
        Ok(Self::new(secrets, tokens, config.token_file.clone()))
    }

    /// Current tokens, refreshed and saved first if they expired.
    async fn valid_tokens(&self) -> Result<Tokens, SubmissionFailure> {
        let mut tokens = self.tokens.lock().await;

        if tokens.is_expired() && tokens.can_refresh() {
            warn!("Refreshing expired Google API token");
            let refreshed = tokens
                .refresh(&self.secrets)
                .await
                .map_err(|e| SubmissionFailure::Unauthorized(format!("{e:#}")))?;
            if let Err(e) = refreshed.save(&self.token_file) {
                warn!(error = %e, "Could not save refreshed token");
            }
            *tokens = refreshed;
        }

        Ok(tokens.clone())
    }
}

#[async_trait]
impl CalendarSubmitter for GoogleCalendar {
    async fn submit(&self, event: &EventSubmission) -> Result<CreatedEvent, SubmissionFailure> {
        let client = self.valid_tokens().await?.client(&self.secrets);
        let google_event = to_google_event(event);

        debug!(summary = %google_event.summary, "Inserting event");

        let response = client
            .events()
            .insert(
                PRIMARY_CALENDAR,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .map_err(|e| submission_failure(&e.to_string()))?;

        Ok(created_event(response.body))
    }
}

fn event_time(dt: &chrono::DateTime<chrono::FixedOffset>, time_zone: &str) -> EventDateTime {
    EventDateTime {
        date: None,
        date_time: Some(dt.with_timezone(&Utc)),
        time_zone: time_zone.to_string(),
    }
}

fn to_google_event(event: &EventSubmission) -> Event {
    Event {
        summary: event.title.clone(),
        start: Some(event_time(&event.start, &event.time_zone)),
        end: Some(event_time(&event.end, &event.time_zone)),
        ..Default::default()
    }
}

fn created_event(inserted: Event) -> CreatedEvent {
    CreatedEvent {
        id: inserted.id,
        html_link: Some(inserted.html_link).filter(|link| !link.is_empty()),
    }
}

/// Classify a client error. The client reports HTTP failures with the
/// status code and response body in its message.
fn submission_failure(message: &str) -> SubmissionFailure {
    let detail = provider_message(message).unwrap_or_else(|| message.to_string());

    let unauthorized = ["401", "403", "Unauthorized", "Forbidden"]
        .iter()
        .any(|marker| message.contains(marker));

    if unauthorized {
        SubmissionFailure::Unauthorized(detail)
    } else {
        SubmissionFailure::Request(detail)
    }
}

/// `error.message` from a Google API error body embedded in `message`.
fn provider_message(message: &str) -> Option<String> {
    let body = &message[message.find('{')?..];
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
