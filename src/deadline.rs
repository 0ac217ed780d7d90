//! Deadline model
//!
//! Task deadlines have been stored in three shapes over time:
//!
//! - point in time: `{ "date": "2024-01-02", "time": "09:00" }`
//! - weekday slot: `{ "weekday": "friday", "time": "09:00" }`
//! - interval: `{ "start_date", "start_time", "end_date", "end_time", "weekday"? }`
//!
//! Every shape is accepted on read. Everything downstream works on the
//! [`Interval`] returned by [`normalize`], and the deadline editor
//! ([`DeadlineForm::validate`]) only ever produces intervals.
//!
//! Endpoints stay raw strings inside the records so that a malformed value
//! never prevents a task from loading; parsing happens here. Weekday names
//! are read in any case, unknown ones read as absent, and a value matching
//! no shape at all is kept verbatim as [`Deadline::Unrecognized`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Fallback shown when neither endpoint of a deadline parses
pub const INVALID_DEADLINE: &str = "Invalid deadline";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const SHORT_FORMAT: &str = "%d %b %H:%M";

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days in display order (Sunday last)
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Human label, e.g. `Friday`
    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Stored form, e.g. `friday`
    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Position in [`Weekday::ALL`], Monday = 0
    pub fn index(self) -> usize {
        self.to_chrono().num_days_from_monday() as usize
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    /// Accepts full names and three-letter abbreviations, any case.
    fn from_str(value: &str) -> Result<Self> {
        let needle = value.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str() == needle || (needle.len() == 3 && day.as_str().starts_with(&needle)))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown weekday '{}'", value.trim())))
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Optional weekday that reads unknown or non-string values as `None`.
fn lenient_weekday<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Weekday>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|value| value.parse().ok()))
}

/// Legacy single instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointInTime {
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// Legacy (and quick-add) weekday + time label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdaySlot {
    #[serde(
        default,
        deserialize_with = "lenient_weekday",
        skip_serializing_if = "Option::is_none"
    )]
    pub weekday: Option<Weekday>,
    #[serde(default)]
    pub time: String,
}

/// Canonical deadline shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start_date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(
        default,
        deserialize_with = "lenient_weekday",
        skip_serializing_if = "Option::is_none"
    )]
    pub weekday: Option<Weekday>,
}

impl Interval {
    fn single(date: &str, time: &str, weekday: Option<Weekday>) -> Self {
        Self {
            start_date: date.to_string(),
            start_time: time.to_string(),
            end_date: date.to_string(),
            end_time: time.to_string(),
            weekday,
        }
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        parse_instant(&self.start_date, &self.start_time)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        parse_instant(&self.end_date, &self.end_time)
    }
}

/// A task deadline in any of its stored shapes.
///
/// Variant order matters for deserialization: the interval is recognized by
/// `start_date`, the point in time by `date`, any other object is a weekday
/// slot, and whatever is left is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deadline {
    Interval(Interval),
    PointInTime(PointInTime),
    WeekdaySlot(WeekdaySlot),
    /// Stored value of no known shape; written back unchanged
    Unrecognized(serde_json::Value),
}

impl Deadline {
    /// Weekday + time slot as recorded by the quick-add form
    pub fn slot(weekday: Weekday, time: impl Into<String>) -> Self {
        Deadline::WeekdaySlot(WeekdaySlot {
            weekday: Some(weekday),
            time: time.into(),
        })
    }

    /// Weekday of a bare weekday slot; `None` for every other shape.
    pub fn weekday_slot(&self) -> Option<Weekday> {
        match self {
            Deadline::WeekdaySlot(slot) => slot.weekday,
            _ => None,
        }
    }
}

/// True for the canonical interval shape.
pub fn is_interval(deadline: &Deadline) -> bool {
    matches!(deadline, Deadline::Interval(_))
}

/// Parse `HH:mm` (seconds tolerated).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Parse an ISO calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn parse_instant(date: &str, time: &str) -> Option<NaiveDateTime> {
    Some(parse_date(date)?.and_time(parse_time(time)?))
}

/// Weekday of an ISO date in the local calendar.
pub fn derive_weekday(iso_date: &str) -> Option<Weekday> {
    parse_date(iso_date).map(|date| Weekday::from_chrono(date.weekday()))
}

fn next_on_or_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let from_idx = from.weekday().num_days_from_monday() as i64;
    let to_idx = weekday.to_chrono().num_days_from_monday() as i64;
    from + Duration::days((to_idx - from_idx).rem_euclid(7))
}

/// Widen any deadline shape to an interval, using the local date as "today".
pub fn normalize(deadline: &Deadline) -> Interval {
    normalize_at(deadline, Local::now().date_naive())
}

/// Widen any deadline shape to an interval.
///
/// A point in time becomes a single-instant interval whose weekday comes
/// from its own date. A weekday slot becomes a single instant on the next
/// occurrence of its weekday (on or after `today`); a slot without a weekday
/// takes today's.
pub fn normalize_at(deadline: &Deadline, today: NaiveDate) -> Interval {
    match deadline {
        Deadline::Interval(interval) => interval.clone(),
        Deadline::PointInTime(point) => {
            Interval::single(&point.date, &point.time, derive_weekday(&point.date))
        }
        Deadline::WeekdaySlot(slot) => {
            let weekday = slot
                .weekday
                .unwrap_or_else(|| Weekday::from_chrono(today.weekday()));
            let date = next_on_or_after(today, weekday).format(DATE_FORMAT).to_string();
            Interval::single(&date, &slot.time, Some(weekday))
        }
        Deadline::Unrecognized(_) => Interval::single("", "", None),
    }
}

fn short(instant: Option<NaiveDateTime>) -> String {
    instant
        .map(|value| value.format(SHORT_FORMAT).to_string())
        .unwrap_or_default()
}

/// Render `"<Weekday> · <start> — <end>"`.
///
/// Returns `None` when neither endpoint parses.
pub fn format(interval: &Interval) -> Option<String> {
    let start = interval.start();
    let end = interval.end();
    if start.is_none() && end.is_none() {
        return None;
    }

    let prefix = interval
        .weekday
        .map(|day| format!("{} · ", day.label()))
        .unwrap_or_default();
    let text = format!("{prefix}{} — {}", short(start), short(end));
    Some(text.trim().to_string())
}

/// Display text for a stored deadline.
pub fn describe(deadline: &Deadline) -> String {
    describe_or(deadline, INVALID_DEADLINE)
}

/// Display text for a stored deadline with a custom fallback.
pub fn describe_or(deadline: &Deadline, fallback: &str) -> String {
    format(&normalize(deadline)).unwrap_or_else(|| fallback.to_string())
}

/// Relative hint against the deadline's end, e.g. `in 3h` or `overdue`.
pub fn due_hint(deadline: &Deadline, now: NaiveDateTime) -> Option<String> {
    let interval = normalize_at(deadline, now.date());
    let due = interval.end().or_else(|| interval.start())?;
    let millis = (due - now).num_milliseconds();
    if millis < 0 {
        return Some("overdue".to_string());
    }

    let minutes = millis as f64 / 60_000.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    let hint = if hours < 1.0 {
        format!("in {} min", minutes.round() as i64)
    } else if hours < 24.0 {
        format!("in {}h", hours.round() as i64)
    } else if days < 7.0 {
        format!("in {}d", days.round() as i64)
    } else {
        format!("in {}w", (days / 7.0).round() as i64)
    };
    Some(hint)
}

/// Deadline editor input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineForm {
    pub weekday: Option<Weekday>,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

impl DeadlineForm {
    /// Prefill the editor from an existing deadline.
    pub fn from_deadline(deadline: &Deadline, today: NaiveDate) -> Self {
        let interval = normalize_at(deadline, today);
        Self {
            weekday: interval.weekday,
            start_date: interval.start_date,
            start_time: interval.start_time,
            end_date: interval.end_date,
            end_time: interval.end_time,
        }
    }

    /// Check the form and build the canonical interval.
    pub fn validate(&self) -> Result<Deadline> {
        let start = parse_instant(&self.start_date, &self.start_time).ok_or_else(|| {
            Error::InvalidDeadline("start date and time must be filled in".to_string())
        })?;
        let end = parse_instant(&self.end_date, &self.end_time).ok_or_else(|| {
            Error::InvalidDeadline("end date and time must be filled in".to_string())
        })?;
        if end <= start {
            return Err(Error::DeadlineOrder {
                start: start.format("%Y-%m-%dT%H:%M").to_string(),
                end: end.format("%Y-%m-%dT%H:%M").to_string(),
            });
        }
        let weekday = self
            .weekday
            .ok_or_else(|| Error::InvalidDeadline("select a weekday".to_string()))?;

        Ok(Deadline::Interval(Interval {
            start_date: start.date().format(DATE_FORMAT).to_string(),
            start_time: start.time().format(TIME_FORMAT).to_string(),
            end_date: end.date().format(DATE_FORMAT).to_string(),
            end_time: end.time().format(TIME_FORMAT).to_string(),
            weekday: Some(weekday),
        }))
    }
}
