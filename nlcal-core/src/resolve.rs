//! Turning extracted date/time strings into a start/end instant pair.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::ResolutionFailure;
use crate::event::{EventInstant, Field, RawExtraction};

/// Length of an event whose end is unknown or unusable.
pub const DEFAULT_DURATION_HOURS: i64 = 1;

/// Date formats tried before falling back to the fuzzy parser.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%B %d %Y"];

/// Resolves a [`RawExtraction`] into start and end instants.
///
/// Stateless apart from the timezone it stamps onto results.
#[derive(Debug, Clone)]
pub struct DateTimeResolver {
    timezone: Option<Tz>,
}

impl DateTimeResolver {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }

    /// Resolver for the system's local timezone. Falls back to floating
    /// instants when the zone cannot be determined.
    pub fn with_local_timezone() -> Self {
        Self::new(local_timezone())
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    pub fn resolve(
        &self,
        extraction: &RawExtraction,
    ) -> Result<(EventInstant, EventInstant), ResolutionFailure> {
        let date = required(extraction, Field::Date)?;
        let start_time = required(extraction, Field::StartTime)?;

        let start = parse_start(date, start_time).ok_or_else(|| {
            ResolutionFailure::UnparseableStart {
                input: format!("{date} {start_time}"),
            }
        })?;
        debug!(%start, "Parsed start datetime");

        let start_instant = self.attach(start);
        let end = self.resolve_end(start, &start_instant, extraction.end_time());
        debug!(?end, "Resolved end");

        Ok((start_instant, end))
    }

    /// Apply the end-time policy to a zoned start.
    ///
    /// The default length is added to the zoned start, so it is exact across
    /// DST changes. An explicit end is placed on the start's calendar date
    /// and zoned on its own.
    fn resolve_end(
        &self,
        start_wall: NaiveDateTime,
        start: &EventInstant,
        end_time: Option<&str>,
    ) -> EventInstant {
        let fallback = start.shifted(Duration::hours(DEFAULT_DURATION_HOURS));

        let Some(raw) = end_time.map(str::trim).filter(|s| !s.is_empty()) else {
            debug!("End time not specified");
            return fallback;
        };

        let Some(clock) = parse_time_of_day(raw) else {
            debug!(end_time = raw, "Could not parse end time; using default duration");
            return fallback;
        };

        // Only the time of day is used; any date in the end string is ignored.
        let mut end_wall = start_wall.date().and_time(clock);

        match end_wall.cmp(&start_wall) {
            Ordering::Less => {
                debug!(%end_wall, %start_wall, "End time is earlier than start; assuming it is past midnight");
                end_wall += Duration::hours(24);
            }
            Ordering::Equal => {
                debug!(%end_wall, "End time equals start time; using default duration");
                return fallback;
            }
            Ordering::Greater => {}
        }

        let end = self.attach(end_wall);
        if end.is_after(start) {
            end
        } else {
            // The start moved out of a DST gap past the requested end.
            debug!(%end_wall, "End is not after the zoned start; keeping the requested length");
            start.shifted(end_wall - start_wall)
        }
    }

    /// Stamp a wall-clock time with the configured zone.
    ///
    /// Ambiguous times (DST fold) take the earlier instant; times inside a
    /// DST gap move forward one hour.
    fn attach(&self, naive: NaiveDateTime) -> EventInstant {
        let Some(tz) = self.timezone else {
            return EventInstant::Floating(naive);
        };

        let zoned = tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest());

        match zoned {
            Some(dt) => EventInstant::Zoned(dt),
            None => {
                warn!(%naive, timezone = %tz, "Could not place time in timezone");
                EventInstant::Floating(naive)
            }
        }
    }
}

/// The system timezone, or `None` if it cannot be determined.
pub fn local_timezone() -> Option<Tz> {
    let name = match iana_time_zone::get_timezone() {
        Ok(name) => name,
        Err(e) => {
            warn!(error = %e, "Failed to get local timezone; timezone info will be missing");
            return None;
        }
    };

    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(e) => {
            warn!(timezone = %name, error = %e, "Unknown local timezone; timezone info will be missing");
            None
        }
    }
}

fn required(extraction: &RawExtraction, field: Field) -> Result<&str, ResolutionFailure> {
    if !extraction.has(field) {
        return Err(ResolutionFailure::MissingRequired(field));
    }
    extraction
        .get(field)
        .map(str::trim)
        .ok_or(ResolutionFailure::MissingRequired(field))
}

/// Parse the combined date and start time.
///
/// The date is read as a calendar date or, for relative expressions such as
/// "next tuesday", through fuzzydate. When the time is not a plain clock
/// time, fuzzydate gets the combined string instead.
fn parse_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let clock = parse_clock(time);
    let day = parse_calendar_date(date).or_else(|| parse_human(date).map(|dt| dt.date()));

    if let (Some(day), Some(clock)) = (day, clock) {
        return Some(day.and_time(clock));
    }

    parse_human(&format!("{date} {time}"))
}

/// Time of day from an end-time string: clock formats first, then fuzzydate.
fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    parse_clock(input).or_else(|| parse_human(input).map(|dt| dt.time()))
}

fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

/// Parse clock times like "3pm", "3 PM", "3:30 p.m.", "15:00", "15:00:30",
/// "noon" and "midnight".
///
/// A bare number without am/pm is rejected: "14" is as likely a day as an hour.
fn parse_clock(input: &str) -> Option<NaiveTime> {
    let lower = input.trim().to_lowercase().replace('.', "");
    let lower = lower.strip_prefix("at ").unwrap_or(lower.as_str()).trim();

    match lower {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let (digits, pm) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(true))
    } else {
        (lower, None)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return None;
    }

    let mut parts = digits.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None if pm.is_some() => 0,
        None => return None,
    };
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    let hour = match pm {
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(true) => hour % 12 + 12,
        Some(false) => hour % 12,
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Permissive natural-language parse, relative to the current date.
fn parse_human(input: &str) -> Option<NaiveDateTime> {
    let expanded = expand_abbreviations(input);
    match fuzzydate::parse(&expanded) {
        Ok(dt) => Some(dt),
        Err(_) => {
            debug!(input, "fuzzydate could not parse input");
            None
        }
    }
}

/// Expand abbreviations fuzzydate doesn't handle and drop filler words.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_end_matches(','))
        .filter(|word| *word != "at" && *word != "on")
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Timelike, Utc};
    use chrono_tz::America::New_York;

    fn extraction(date: &str, start: &str, end: Option<&str>) -> RawExtraction {
        RawExtraction::new(
            Some("meeting".into()),
            Some(date.into()),
            Some(start.into()),
            end.map(Into::into),
        )
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn floating() -> DateTimeResolver {
        DateTimeResolver::new(None)
    }

    // --- required fields ---

    #[test]
    fn missing_date_or_start_fails() {
        let resolver = floating();

        let no_date = RawExtraction::new(Some("x".into()), None, Some("3pm".into()), None);
        assert_eq!(
            resolver.resolve(&no_date),
            Err(ResolutionFailure::MissingRequired(Field::Date))
        );

        let no_start = RawExtraction::new(Some("x".into()), Some("2026-03-20".into()), None, None);
        assert_eq!(
            resolver.resolve(&no_start),
            Err(ResolutionFailure::MissingRequired(Field::StartTime))
        );

        let blank_start = extraction("2026-03-20", "  ", None);
        assert_eq!(
            resolver.resolve(&blank_start),
            Err(ResolutionFailure::MissingRequired(Field::StartTime))
        );
    }

    #[test]
    fn title_is_not_required() {
        let no_title = RawExtraction::new(None, Some("2026-03-20".into()), Some("3pm".into()), None);
        assert!(floating().resolve(&no_title).is_ok());
    }

    #[test]
    fn unparseable_start_reports_combined_input() {
        let result = floating().resolve(&extraction("not a date at all xyz", "teatime", None));
        assert_eq!(
            result,
            Err(ResolutionFailure::UnparseableStart {
                input: "not a date at all xyz teatime".into()
            })
        );
    }

    // --- end policy ---

    #[test]
    fn absent_end_defaults_to_one_hour() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3pm", None))
            .unwrap();
        assert_eq!(start.naive_local(), at(2026, 3, 20, 15, 0));
        assert_eq!(end.naive_local() - start.naive_local(), Duration::hours(1));
    }

    #[test]
    fn blank_end_defaults_to_one_hour() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "09:30", Some(" ")))
            .unwrap();
        assert_eq!(end.naive_local(), start.naive_local() + Duration::hours(1));
    }

    #[test]
    fn end_is_overlaid_on_start_date() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3 PM", Some("4:30 pm")))
            .unwrap();
        assert_eq!(start.naive_local(), at(2026, 3, 20, 15, 0));
        assert_eq!(end.naive_local(), at(2026, 3, 20, 16, 30));
    }

    #[test]
    fn inverted_end_rolls_to_next_day() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3pm", Some("2pm")))
            .unwrap();
        assert_eq!(end.naive_local(), at(2026, 3, 21, 14, 0));
        assert_eq!(end.naive_local().date(), start.naive_local().date().succ_opt().unwrap());
        assert!(end.naive_local() > start.naive_local());
    }

    #[test]
    fn late_event_ending_after_midnight() {
        let (_, end) = floating()
            .resolve(&extraction("2026-12-31", "10pm", Some("1am")))
            .unwrap();
        assert_eq!(end.naive_local(), at(2027, 1, 1, 1, 0));
    }

    #[test]
    fn end_equal_to_start_defaults_to_one_hour() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "15:00", Some("3pm")))
            .unwrap();
        assert_eq!(end.naive_local(), start.naive_local() + Duration::hours(1));
    }

    #[test]
    fn unparseable_end_defaults_to_one_hour() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3pm", Some("whenever we are done xyz")))
            .unwrap();
        assert_eq!(end.naive_local(), start.naive_local() + Duration::hours(1));
    }

    #[test]
    fn date_in_end_string_is_ignored() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3pm", Some("2026-03-25 4pm")))
            .unwrap();
        assert_eq!(start.naive_local(), at(2026, 3, 20, 15, 0));
        assert_eq!(end.naive_local(), at(2026, 3, 20, 16, 0));
    }

    // --- relative dates ---

    #[test]
    fn relative_date_resolves_against_today() {
        let (start, end) = floating()
            .resolve(&extraction("tomorrow", "10am", None))
            .unwrap();
        let start = start.naive_local();
        let tomorrow_local = Local::now().date_naive().succ_opt().unwrap();
        let tomorrow_utc = Utc::now().date_naive().succ_opt().unwrap();
        assert!(start.date() == tomorrow_local || start.date() == tomorrow_utc);
        assert_eq!((start.hour(), start.minute()), (10, 0));
        assert_eq!(end.naive_local() - start, Duration::hours(1));
    }

    // --- timezone ---

    #[test]
    fn instants_are_stamped_with_configured_zone() {
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, end) = resolver
            .resolve(&extraction("2026-03-20", "3pm", Some("4pm")))
            .unwrap();
        assert_eq!(start.timezone(), Some(New_York));
        assert_eq!(
            start.to_fixed().unwrap().to_rfc3339(),
            "2026-03-20T15:00:00-04:00"
        );
        assert_eq!(end.to_fixed().unwrap().to_rfc3339(), "2026-03-20T16:00:00-04:00");
    }

    #[test]
    fn no_zone_gives_floating_instants() {
        let (start, end) = floating()
            .resolve(&extraction("2026-03-20", "3pm", None))
            .unwrap();
        assert!(matches!(start, EventInstant::Floating(_)));
        assert!(matches!(end, EventInstant::Floating(_)));
    }

    #[test]
    fn time_in_dst_gap_moves_forward() {
        // Clocks jump from 02:00 to 03:00 on 2026-03-08 in New York.
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, _) = resolver
            .resolve(&extraction("2026-03-08", "2:30am", None))
            .unwrap();
        assert_eq!(
            start.to_fixed().unwrap().to_rfc3339(),
            "2026-03-08T03:30:00-04:00"
        );
    }

    #[test]
    fn ambiguous_time_takes_earlier_instant() {
        // 01:30 happens twice on 2026-11-01 in New York.
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, _) = resolver
            .resolve(&extraction("2026-11-01", "1:30am", None))
            .unwrap();
        assert_eq!(
            start.to_fixed().unwrap().to_rfc3339(),
            "2026-11-01T01:30:00-04:00"
        );
    }

    #[test]
    fn end_after_gap_stays_after_moved_start() {
        // 02:30 does not exist on 2026-03-08; the start moves to 03:30 and
        // the half-hour length is kept.
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, end) = resolver
            .resolve(&extraction("2026-03-08", "2:30am", Some("3am")))
            .unwrap();
        assert_eq!(
            start.to_fixed().unwrap().to_rfc3339(),
            "2026-03-08T03:30:00-04:00"
        );
        assert_eq!(
            end.to_fixed().unwrap().to_rfc3339(),
            "2026-03-08T04:00:00-04:00"
        );
        assert!(end.is_after(&start));
    }

    #[test]
    fn default_length_is_one_hour_across_fold() {
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, end) = resolver
            .resolve(&extraction("2026-11-01", "1:30am", None))
            .unwrap();
        let (start, end) = (start.to_fixed().unwrap(), end.to_fixed().unwrap());
        assert_eq!(end - start, Duration::hours(1));
        assert_eq!(end.to_rfc3339(), "2026-11-01T01:30:00-05:00");
    }

    #[test]
    fn explicit_end_across_fold_keeps_wall_clock() {
        let resolver = DateTimeResolver::new(Some(New_York));
        let (start, end) = resolver
            .resolve(&extraction("2026-11-01", "1am", Some("3am")))
            .unwrap();
        assert_eq!(end.to_fixed().unwrap().to_rfc3339(), "2026-11-01T03:00:00-05:00");
        assert_eq!(
            end.to_fixed().unwrap() - start.to_fixed().unwrap(),
            Duration::hours(3)
        );
    }

    // --- parse_clock ---

    #[test]
    fn clock_meridiem_forms() {
        assert_eq!(parse_clock("3pm"), NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(parse_clock("3 PM"), NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(parse_clock("3:30 p.m."), NaiveTime::from_hms_opt(15, 30, 0));
        assert_eq!(parse_clock("12am"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_clock("12pm"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_clock("at 10am"), NaiveTime::from_hms_opt(10, 0, 0));
    }

    #[test]
    fn clock_24_hour_forms() {
        assert_eq!(parse_clock("15:00"), NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(parse_clock("09:05:30"), NaiveTime::from_hms_opt(9, 5, 30));
    }

    #[test]
    fn clock_keywords() {
        assert_eq!(parse_clock("Noon"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_clock("midnight"), NaiveTime::from_hms_opt(0, 0, 0));
    }

    #[test]
    fn clock_rejects_garbage() {
        assert_eq!(parse_clock("14"), None);
        assert_eq!(parse_clock("13pm"), None);
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("soon"), None);
        assert_eq!(parse_clock("pm"), None);
    }

    // --- dates ---

    #[test]
    fn calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 6);
        assert_eq!(parse_calendar_date("2025-05-06"), expected);
        assert_eq!(parse_calendar_date("05/06/2025"), expected);
        assert_eq!(parse_calendar_date("May 06, 2025"), expected);
        assert_eq!(parse_calendar_date("May 6 2025"), expected);
        assert_eq!(parse_calendar_date("next tuesday"), None);
    }

    // --- expand_abbreviations ---

    #[test]
    fn expand_day_and_month_abbreviations() {
        assert_eq!(expand_abbreviations("sat 3pm"), "saturday 3pm");
        assert_eq!(expand_abbreviations("Tues 10am"), "tuesday 10am");
        assert_eq!(expand_abbreviations("sept 5"), "september 5");
    }

    #[test]
    fn expand_drops_filler_words() {
        assert_eq!(expand_abbreviations("tomorrow at 10am"), "tomorrow 10am");
        assert_eq!(expand_abbreviations("on fri, 3pm"), "friday 3pm");
        assert_eq!(expand_abbreviations("next friday"), "next friday");
    }
}
