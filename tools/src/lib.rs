//! Actions the language model may request while booking or querying events.
//!
//! [`ActionRegistry`] is the fixed set of callable actions handed to the
//! model; [`default_registry`] wires the calendar actions to a
//! [`CalendarService`].

pub mod actions;
pub mod calendar;
pub mod errors;
pub mod registry;

pub use actions::default_registry;
pub use calendar::{CalendarEvent, CalendarService, EventPatch, InMemoryCalendar, NewEvent};
pub use errors::{ActionError, CalendarError};
pub use registry::{Action, ActionRegistry};
