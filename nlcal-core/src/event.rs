//! Records that flow through one scheduling turn.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// One of the four fields the language model is asked to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Date,
    StartTime,
    EndTime,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Date, Field::StartTime, Field::EndTime];

    /// Fields a turn cannot proceed without.
    pub const REQUIRED: [Field; 3] = [Field::Title, Field::Date, Field::StartTime];

    /// JSON key used in the model's answer.
    pub fn key(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Date => "date",
            Field::StartTime => "start_time",
            Field::EndTime => "end_time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Date => "Date",
            Field::StartTime => "Start Time",
            Field::EndTime => "End Time",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which end of an event a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => f.write_str("start"),
            Endpoint::End => f.write_str("end"),
        }
    }
}

/// Event fields as the language model reported them.
///
/// `None` means the model did not provide the field. An empty string is kept
/// as `Some("")`; only [`RawExtraction::has`] treats blank values as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    title: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl RawExtraction {
    pub fn new(
        title: Option<String>,
        date: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Self {
        Self {
            title,
            date,
            start_time,
            end_time,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Date => self.date.as_deref(),
            Field::StartTime => self.start_time.as_deref(),
            Field::EndTime => self.end_time.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Whether the field carries a non-blank value.
    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// Required fields that are absent or blank, in display order.
    pub fn missing_required(&self) -> Vec<Field> {
        Field::REQUIRED
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// Fields with a usable value, in display order.
    pub fn recovered(&self) -> Vec<(Field, String)> {
        Field::ALL
            .into_iter()
            .filter(|f| self.has(*f))
            .filter_map(|f| self.get(f).map(|v| (f, v.to_string())))
            .collect()
    }
}

/// A resolved point in time.
///
/// `Floating` only exists when the local timezone could not be determined;
/// it never passes [`ResolvedEvent::to_submission`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventInstant {
    Zoned(DateTime<Tz>),
    Floating(NaiveDateTime),
}

impl EventInstant {
    /// Wall-clock time, whatever the zone.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            EventInstant::Zoned(dt) => dt.naive_local(),
            EventInstant::Floating(dt) => *dt,
        }
    }

    pub fn timezone(&self) -> Option<Tz> {
        match self {
            EventInstant::Zoned(dt) => Some(dt.timezone()),
            EventInstant::Floating(_) => None,
        }
    }

    /// Elapsed-time shift. For zoned instants this crosses DST changes
    /// exactly, so the wall clock may move by more or less than `by`.
    pub fn shifted(&self, by: Duration) -> EventInstant {
        match self {
            EventInstant::Zoned(dt) => EventInstant::Zoned(*dt + by),
            EventInstant::Floating(dt) => EventInstant::Floating(*dt + by),
        }
    }

    /// Strictly later than `other`. Zoned pairs compare as instants,
    /// anything else by wall clock.
    pub fn is_after(&self, other: &EventInstant) -> bool {
        match (self, other) {
            (EventInstant::Zoned(a), EventInstant::Zoned(b)) => a > b,
            _ => self.naive_local() > other.naive_local(),
        }
    }

    /// The instant with an explicit UTC offset, if it has a zone.
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            EventInstant::Zoned(dt) => Some(dt.with_timezone(&dt.offset().fix())),
            EventInstant::Floating(_) => None,
        }
    }
}

/// An event whose start and end have been resolved to instants.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub title: String,
    pub start: EventInstant,
    pub end: EventInstant,
}

impl ResolvedEvent {
    /// Check the invariants the calendar relies on and produce the value
    /// handed to the submitter.
    pub fn to_submission(&self) -> Result<EventSubmission, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let start = self
            .start
            .to_fixed()
            .ok_or(ValidationError::MissingTimezone(Endpoint::Start))?;
        let end = self
            .end
            .to_fixed()
            .ok_or(ValidationError::MissingTimezone(Endpoint::End))?;

        if end <= start {
            return Err(ValidationError::NotAfterStart);
        }

        // Both instants are zoned at this point.
        let time_zone = self
            .start
            .timezone()
            .map(|tz| tz.name().to_string())
            .unwrap_or_default();

        Ok(EventSubmission {
            title: title.to_string(),
            start,
            end,
            time_zone,
        })
    }
}

/// What the calendar collaborator receives. Timestamps always carry an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubmission {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA name of the zone the instants were resolved in
    pub time_zone: String,
}

/// Reference to an event the calendar accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}
