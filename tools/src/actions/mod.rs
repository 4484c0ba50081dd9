//! Calendar actions exposed to the model, named as the assistant's prompt expects.

mod clock;
mod events;

pub use clock::{current_date_time, CurrentDateTime};
pub use events::{
    CreateEvent, DeleteEvent, FindEventByName, GetEventsBetween, UpdateEvent,
};

use std::sync::Arc;

use serde_json::{json, Value};

use crate::calendar::{format_event_time, CalendarEvent, CalendarService};
use crate::registry::ActionRegistry;

/// Registry with every calendar action bound to `calendar`
pub fn default_registry(calendar: Arc<dyn CalendarService>) -> ActionRegistry {
    ActionRegistry::new()
        .with(Arc::new(GetEventsBetween::new(Arc::clone(&calendar))))
        .with(Arc::new(CreateEvent::new(Arc::clone(&calendar))))
        .with(Arc::new(FindEventByName::new(Arc::clone(&calendar))))
        .with(Arc::new(UpdateEvent::new(Arc::clone(&calendar))))
        .with(Arc::new(DeleteEvent::new(Arc::clone(&calendar))))
        .with(Arc::new(CurrentDateTime::new(calendar)))
}

/// Shape of an event as reported back to the model
pub(crate) fn event_to_value(event: &CalendarEvent) -> Value {
    json!({
        "id": event.id,
        "summary": event.summary,
        "start_time": format_event_time(event.start, &event.timezone),
        "end_time": format_event_time(event.end, &event.timezone),
        "timezone": event.timezone,
        "location": event.location,
        "description": event.description,
        "attendees": event.attendees,
        "recurrence": event.recurrence,
    })
}
