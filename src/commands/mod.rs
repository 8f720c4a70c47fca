use crate::components::google_calendar::{CalendarTransport, EventQuery};
use chrono::{DateTime, Utc};

pub mod calendar;
pub mod dedupe;
pub mod recolor;

pub use calendar::{delete_by_title, list_calendars, show_colors, DeleteOutcome};
pub use dedupe::{dedupe, DedupeOutcome};
pub use recolor::{recolor, RecolorOutcome};

/// Shared context for all commands
pub struct CommandContext<'a, T: CalendarTransport + ?Sized> {
    pub transport: &'a T,
    /// Calendar the command operates on
    pub calendar_id: &'a str,
    /// Plan and log mutations without submitting them
    pub dry_run: bool,
    /// Skip events that ended before this instant
    pub since: Option<DateTime<Utc>>,
}

impl<'a, T: CalendarTransport + ?Sized> CommandContext<'a, T> {
    /// Create a new command context
    pub fn new(transport: &'a T, calendar_id: &'a str) -> Self {
        Self {
            transport,
            calendar_id,
            dry_run: false,
            since: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    /// Listing options for this context, with recurring events optionally expanded
    pub fn event_query(&self, single_events: bool) -> EventQuery {
        EventQuery {
            single_events,
            time_min: self.since,
        }
    }
}
