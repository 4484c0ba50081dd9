use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;
use uuid::Uuid;

use super::{CalendarEvent, CalendarResult, CalendarService, EventPatch, NewEvent};
use crate::errors::CalendarError;

/// Process-local calendar; contents are lost when the process exits
#[derive(Debug, Clone)]
pub struct InMemoryCalendar {
    timezone: Tz,
    /// Thread-safe storage of events keyed by id
    events: Arc<RwLock<HashMap<String, CalendarEvent>>>,
}

impl InMemoryCalendar {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            events: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn sorted(mut events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        events
    }
}

fn check_span(start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarResult<()> {
    if end <= start {
        return Err(CalendarError::InvalidEvent(format!(
            "End time {} must be after start time {}",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(())
}

#[async_trait]
impl CalendarService for InMemoryCalendar {
    async fn timezone(&self) -> CalendarResult<Tz> {
        Ok(self.timezone)
    }

    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        let events = self.events.read().map_err(|e| {
            CalendarError::Backend(format!("Failed to acquire read lock: {}", e))
        })?;

        let matching = events
            .values()
            .filter(|event| event.overlaps(start, end))
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    async fn create_event(&self, event: NewEvent) -> CalendarResult<CalendarEvent> {
        check_span(event.start, event.end)?;

        let created = CalendarEvent {
            id: Uuid::new_v4().simple().to_string(),
            summary: event.summary,
            location: event.location,
            description: event.description,
            start: event.start,
            end: event.end,
            timezone: event.timezone,
            recurrence: event.recurrence,
            attendees: event.attendees,
        };

        let mut events = self.events.write().map_err(|e| {
            CalendarError::Backend(format!("Failed to acquire write lock: {}", e))
        })?;
        events.insert(created.id.clone(), created.clone());
        debug!("Created event: {}", created.id);

        Ok(created)
    }

    async fn find_events(&self, query: &str) -> CalendarResult<Vec<CalendarEvent>> {
        let needle = query.trim().to_lowercase();
        let events = self.events.read().map_err(|e| {
            CalendarError::Backend(format!("Failed to acquire read lock: {}", e))
        })?;

        let matching = events
            .values()
            .filter(|event| {
                event
                    .summary
                    .as_deref()
                    .is_some_and(|summary| summary.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> CalendarResult<CalendarEvent> {
        let mut events = self.events.write().map_err(|e| {
            CalendarError::Backend(format!("Failed to acquire write lock: {}", e))
        })?;

        let current = events
            .get(id)
            .ok_or_else(|| CalendarError::NotFound(id.to_string()))?;

        let mut updated = current.clone();
        if let Some(summary) = patch.summary {
            updated.summary = Some(summary);
        }
        if let Some(location) = patch.location {
            updated.location = Some(location);
        }
        if let Some(description) = patch.description {
            updated.description = Some(description);
        }
        if let Some(start) = patch.start {
            updated.start = start;
        }
        if let Some(end) = patch.end {
            updated.end = end;
        }
        if let Some(timezone) = patch.timezone {
            updated.timezone = timezone;
        }
        if let Some(attendees) = patch.attendees {
            updated.attendees = attendees;
        }
        check_span(updated.start, updated.end)?;

        events.insert(id.to_string(), updated.clone());
        debug!("Updated event: {}", id);
        Ok(updated)
    }

    async fn delete_event(&self, id: &str) -> CalendarResult<CalendarEvent> {
        let mut events = self.events.write().map_err(|e| {
            CalendarError::Backend(format!("Failed to acquire write lock: {}", e))
        })?;

        let removed = events
            .remove(id)
            .ok_or_else(|| CalendarError::NotFound(id.to_string()))?;
        debug!("Deleted event: {}", id);
        Ok(removed)
    }
}
