//! Calendar model and the backend interface the calendar actions call into.

mod in_memory;

pub use in_memory::InMemoryCalendar;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::CalendarError;

pub type CalendarResult<T> = Result<T, CalendarError>;

/// A stored calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone the event was booked in
    pub timezone: String,
    #[serde(default)]
    pub recurrence: Vec<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// Fields for a new event; times are already resolved to instants
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub recurrence: Vec<String>,
    pub attendees: Vec<String>,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub attendees: Option<Vec<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Storage backend for calendar events
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Zone the calendar reports for itself
    async fn timezone(&self) -> CalendarResult<Tz>;

    /// Events overlapping `[start, end)`, ordered by start time
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>>;

    async fn create_event(&self, event: NewEvent) -> CalendarResult<CalendarEvent>;

    /// Events whose summary contains `query`, ignoring case
    async fn find_events(&self, query: &str) -> CalendarResult<Vec<CalendarEvent>>;

    async fn update_event(&self, id: &str, patch: EventPatch) -> CalendarResult<CalendarEvent>;

    /// Removes an event and returns it
    async fn delete_event(&self, id: &str) -> CalendarResult<CalendarEvent>;
}

pub fn parse_timezone(name: &str) -> CalendarResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CalendarError::InvalidEvent(format!("Unknown timezone '{}'", name)))
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses an RFC 3339 timestamp, or a local one interpreted in `zone`.
pub fn parse_event_time(input: &str, zone: Tz) -> CalendarResult<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            CalendarError::InvalidEvent(format!(
                "Cannot parse '{}' as a time; expected YYYY-MM-DDTHH:MM:SS",
                input
            ))
        })?;

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            CalendarError::InvalidEvent(format!("'{}' does not exist in {}", input, zone))
        })
}

/// Renders an instant in the given zone as RFC 3339
pub fn format_event_time(instant: DateTime<Utc>, zone: &str) -> String {
    match zone.parse::<Tz>() {
        Ok(tz) => instant.with_timezone(&tz).to_rfc3339(),
        Err(_) => instant.to_rfc3339(),
    }
}
