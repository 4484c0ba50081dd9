use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::event_to_value;
use crate::calendar::{
    format_event_time, parse_event_time, parse_timezone, CalendarService, EventPatch, NewEvent,
};
use crate::errors::ActionError;
use crate::registry::{parse_args, Action};

/// Attendees arrive either as bare emails or as `{"email": ...}` objects
#[derive(Deserialize)]
#[serde(untagged)]
enum Attendee {
    Email(String),
    Object { email: String },
}

impl Attendee {
    fn into_email(self) -> String {
        match self {
            Attendee::Email(email) | Attendee::Object { email } => email,
        }
    }
}

fn collect_attendees(attendees: Option<Vec<Attendee>>) -> Option<Vec<String>> {
    attendees.map(|list| list.into_iter().map(Attendee::into_email).collect())
}

/// Explicit zone argument if given, otherwise the zone the calendar reports
async fn resolve_zone(
    calendar: &dyn CalendarService,
    explicit: Option<&str>,
) -> Result<Tz, ActionError> {
    match explicit {
        Some(name) => Ok(parse_timezone(name)?),
        None => Ok(calendar.timezone().await?),
    }
}

#[derive(Deserialize)]
struct RangeArgs {
    start_time: String,
    end_time: String,
}

/// `get_events_between_start_and_end`
pub struct GetEventsBetween {
    calendar: Arc<dyn CalendarService>,
}

impl GetEventsBetween {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for GetEventsBetween {
    fn name(&self) -> &str {
        "get_events_between_start_and_end"
    }

    fn description(&self) -> &str {
        "Fetches calendar events within a time range. Returns each event's id, summary, start and end time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_time": {"type": "string", "description": "Range start, YYYY-MM-DDTHH:MM:SS with optional offset"},
                "end_time": {"type": "string", "description": "Range end, YYYY-MM-DDTHH:MM:SS with optional offset"}
            },
            "required": ["start_time", "end_time"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: RangeArgs = parse_args(args)?;
        let zone = self.calendar.timezone().await?;
        let start = parse_event_time(&args.start_time, zone)?;
        let end = parse_event_time(&args.end_time, zone)?;
        if end <= start {
            return Err(ActionError::InvalidArguments(
                "end_time must be after start_time".to_string(),
            ));
        }

        let events = self.calendar.list_events(start, end).await?;
        if events.is_empty() {
            return Ok(Value::String(format!(
                "No events found between {} and {}.",
                format_event_time(start, zone.name()),
                format_event_time(end, zone.name())
            )));
        }
        Ok(Value::Array(events.iter().map(event_to_value).collect()))
    }
}

#[derive(Deserialize)]
struct CreateArgs {
    start_time: String,
    end_time: String,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    timezone: Option<String>,
    recurrence: Option<Vec<String>>,
    attendees: Option<Vec<Attendee>>,
}

/// `set_calender_event`
pub struct CreateEvent {
    calendar: Arc<dyn CalendarService>,
}

impl CreateEvent {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for CreateEvent {
    fn name(&self) -> &str {
        "set_calender_event"
    }

    fn description(&self) -> &str {
        "Creates a new event in the calendar. Times without an offset are read in the event timezone, which defaults to the calendar's own."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_time": {"type": "string", "description": "Event start, YYYY-MM-DDTHH:MM:SS"},
                "end_time": {"type": "string", "description": "Event end, YYYY-MM-DDTHH:MM:SS"},
                "summary": {"type": "string", "description": "Title of the event"},
                "location": {"type": "string"},
                "description": {"type": "string"},
                "timezone": {"type": "string", "description": "IANA timezone, e.g. Asia/Kolkata"},
                "recurrence": {"type": "array", "items": {"type": "string"}, "description": "RRULE lines"},
                "attendees": {"type": "array", "items": {"type": "string"}, "description": "Attendee email addresses"}
            },
            "required": ["start_time", "end_time"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: CreateArgs = parse_args(args)?;
        let zone = resolve_zone(self.calendar.as_ref(), args.timezone.as_deref()).await?;

        let event = NewEvent {
            start: parse_event_time(&args.start_time, zone)?,
            end: parse_event_time(&args.end_time, zone)?,
            summary: args.summary,
            location: args.location,
            description: args.description,
            timezone: zone.name().to_string(),
            recurrence: args.recurrence.unwrap_or_default(),
            attendees: collect_attendees(args.attendees).unwrap_or_default(),
        };

        let created = self.calendar.create_event(event).await?;
        info!(event_id = %created.id, "Event created");
        Ok(json!({"status": "created", "event": event_to_value(&created)}))
    }
}

#[derive(Deserialize)]
struct FindArgs {
    name: String,
}

/// `find_event_by_name`
pub struct FindEventByName {
    calendar: Arc<dyn CalendarService>,
}

impl FindEventByName {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for FindEventByName {
    fn name(&self) -> &str {
        "find_event_by_name"
    }

    fn description(&self) -> &str {
        "Finds events whose title contains the given text. Use it to get the id needed by update_event and delete_event."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Text to look for in event titles"}
            },
            "required": ["name"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: FindArgs = parse_args(args)?;
        if args.name.trim().is_empty() {
            return Err(ActionError::InvalidArguments("name must not be empty".to_string()));
        }

        let events = self.calendar.find_events(&args.name).await?;
        if events.is_empty() {
            return Ok(Value::String(format!("No events found matching '{}'.", args.name)));
        }
        Ok(Value::Array(events.iter().map(event_to_value).collect()))
    }
}

#[derive(Deserialize)]
struct UpdateArgs {
    event_id: String,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    timezone: Option<String>,
    attendees: Option<Vec<Attendee>>,
}

/// `update_event`
pub struct UpdateEvent {
    calendar: Arc<dyn CalendarService>,
}

impl UpdateEvent {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for UpdateEvent {
    fn name(&self) -> &str {
        "update_event"
    }

    fn description(&self) -> &str {
        "Changes fields of an existing event. Only the fields given are modified."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string", "description": "Id returned by find_event_by_name or get_events_between_start_and_end"},
                "summary": {"type": "string"},
                "location": {"type": "string"},
                "description": {"type": "string"},
                "start_time": {"type": "string", "description": "New start, YYYY-MM-DDTHH:MM:SS"},
                "end_time": {"type": "string", "description": "New end, YYYY-MM-DDTHH:MM:SS"},
                "timezone": {"type": "string", "description": "IANA timezone for the new times"},
                "attendees": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["event_id"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: UpdateArgs = parse_args(args)?;
        let zone = resolve_zone(self.calendar.as_ref(), args.timezone.as_deref()).await?;

        let patch = EventPatch {
            summary: args.summary,
            location: args.location,
            description: args.description,
            start: args
                .start_time
                .as_deref()
                .map(|t| parse_event_time(t, zone))
                .transpose()?,
            end: args
                .end_time
                .as_deref()
                .map(|t| parse_event_time(t, zone))
                .transpose()?,
            timezone: args.timezone.map(|_| zone.name().to_string()),
            attendees: collect_attendees(args.attendees),
        };
        if patch.is_empty() {
            return Err(ActionError::InvalidArguments(
                "Nothing to update; pass at least one field besides event_id".to_string(),
            ));
        }

        let updated = self.calendar.update_event(&args.event_id, patch).await?;
        info!(event_id = %updated.id, "Event updated");
        Ok(json!({"status": "updated", "event": event_to_value(&updated)}))
    }
}

#[derive(Deserialize)]
struct DeleteArgs {
    event_id: String,
}

/// `delete_event`
pub struct DeleteEvent {
    calendar: Arc<dyn CalendarService>,
}

impl DeleteEvent {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Action for DeleteEvent {
    fn name(&self) -> &str {
        "delete_event"
    }

    fn description(&self) -> &str {
        "Deletes an event by id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_id": {"type": "string", "description": "Id of the event to delete"}
            },
            "required": ["event_id"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ActionError> {
        let args: DeleteArgs = parse_args(args)?;
        let deleted = self.calendar.delete_event(&args.event_id).await?;
        info!(event_id = %deleted.id, "Event deleted");
        Ok(Value::String(format!(
            "Deleted event '{}' ({}).",
            deleted.summary.as_deref().unwrap_or("untitled"),
            deleted.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::default_registry;
    use crate::calendar::InMemoryCalendar;
    use crate::registry::ActionRegistry;
    use crate::CalendarError;

    fn registry() -> ActionRegistry {
        default_registry(Arc::new(InMemoryCalendar::new(chrono_tz::Asia::Kolkata)))
    }

    async fn create(registry: &ActionRegistry, summary: &str, start: &str, end: &str) -> Value {
        let out = registry
            .execute(
                "set_calender_event",
                json!({"summary": summary, "start_time": start, "end_time": end}),
            )
            .await
            .unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[tokio::test]
    async fn test_create_uses_calendar_zone_by_default() {
        let registry = registry();
        let created = create(&registry, "Sync", "2025-09-13T10:00:00", "2025-09-13T11:00:00").await;

        assert_eq!(created["status"], "created");
        assert_eq!(created["event"]["timezone"], "Asia/Kolkata");
        assert_eq!(created["event"]["start_time"], "2025-09-13T10:00:00+05:30");
    }

    #[tokio::test]
    async fn test_create_with_explicit_zone_and_attendee_objects() {
        let registry = registry();
        let out = registry
            .execute(
                "set_calender_event",
                json!({
                    "summary": "Offsite",
                    "start_time": "2025-09-13T10:00:00",
                    "end_time": "2025-09-13T12:00:00",
                    "timezone": "Europe/London",
                    "attendees": [{"email": "sarah@example.com"}, "raj@example.com"]
                }),
            )
            .await
            .unwrap();
        let created: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(created["event"]["start_time"], "2025-09-13T10:00:00+01:00");
        assert_eq!(
            created["event"]["attendees"],
            json!(["sarah@example.com", "raj@example.com"])
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let registry = registry();
        let missing = registry
            .execute("set_calender_event", json!({"summary": "No times"}))
            .await
            .unwrap_err();
        assert!(matches!(missing, ActionError::InvalidArguments(_)));

        let inverted = registry
            .execute(
                "set_calender_event",
                json!({"start_time": "2025-09-13T11:00:00", "end_time": "2025-09-13T10:00:00"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            inverted,
            ActionError::Calendar(CalendarError::InvalidEvent(_))
        ));

        let zone = registry
            .execute(
                "set_calender_event",
                json!({"start_time": "2025-09-13T10:00:00", "end_time": "2025-09-13T11:00:00", "timezone": "Nowhere/Land"}),
            )
            .await
            .unwrap_err();
        assert!(zone.to_string().contains("Unknown timezone"));
    }

    #[tokio::test]
    async fn test_list_range() {
        let registry = registry();
        create(&registry, "Morning", "2025-09-13T09:00:00", "2025-09-13T10:00:00").await;
        create(&registry, "Evening", "2025-09-13T18:00:00", "2025-09-13T19:00:00").await;

        let out = registry
            .execute(
                "get_events_between_start_and_end",
                json!({"start_time": "2025-09-13T00:00:00", "end_time": "2025-09-13T12:00:00"}),
            )
            .await
            .unwrap();
        let events: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(events.as_array().unwrap().len(), 1);
        assert_eq!(events[0]["summary"], "Morning");

        let empty = registry
            .execute(
                "get_events_between_start_and_end",
                json!({"start_time": "2025-09-14T00:00:00Z", "end_time": "2025-09-15T00:00:00Z"}),
            )
            .await
            .unwrap();
        assert!(empty.starts_with("No events found between"));
    }

    #[tokio::test]
    async fn test_find_update_delete_flow() {
        let registry = registry();
        create(&registry, "Dentist", "2025-09-13T15:00:00", "2025-09-13T15:30:00").await;

        let found: Value = serde_json::from_str(
            &registry
                .execute("find_event_by_name", json!({"name": "dent"}))
                .await
                .unwrap(),
        )
        .unwrap();
        let id = found[0]["id"].as_str().unwrap().to_string();

        let updated: Value = serde_json::from_str(
            &registry
                .execute(
                    "update_event",
                    json!({"event_id": id, "end_time": "2025-09-13T16:00:00"}),
                )
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(updated["event"]["end_time"], "2025-09-13T16:00:00+05:30");

        let nothing = registry
            .execute("update_event", json!({"event_id": id}))
            .await
            .unwrap_err();
        assert!(matches!(nothing, ActionError::InvalidArguments(_)));

        let deleted = registry
            .execute("delete_event", json!({"event_id": id}))
            .await
            .unwrap();
        assert!(deleted.starts_with("Deleted event 'Dentist'"));

        let missing = registry
            .execute("delete_event", json!({"event_id": id}))
            .await
            .unwrap_err();
        assert!(missing.to_string().contains("Event not found"));

        let none = registry
            .execute("find_event_by_name", json!({"name": "dentist"}))
            .await
            .unwrap();
        assert_eq!(none, "No events found matching 'dentist'.");
    }
}
