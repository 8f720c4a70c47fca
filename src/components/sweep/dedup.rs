use crate::components::google_calendar::models::{CalendarEvent, Mutation};
use std::collections::HashSet;

/// Identity of an event for duplicate detection: title, start and end marker.
///
/// A marker is the event's date-time when it has one, otherwise its date.
/// Events without a title and without start/end all share one key, so such
/// events are treated as duplicates of each other. The key also ignores the
/// calendar and recurrence an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey<'a> {
    pub title: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
}

impl<'a> DedupKey<'a> {
    pub fn of(event: &'a CalendarEvent) -> Self {
        Self {
            title: event.summary.as_deref(),
            start: event.start_marker(),
            end: event.end_marker(),
        }
    }
}

/// Return the 2nd..nth occurrence of every key, in encounter order.
///
/// The first event seen for a key is kept and never returned.
pub fn find_duplicates(events: &[CalendarEvent]) -> Vec<&CalendarEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .iter()
        .filter(|event| !seen.insert(DedupKey::of(*event)))
        .collect()
}

/// Deletion requests for the given duplicates
pub fn deletion_mutations(duplicates: &[&CalendarEvent]) -> Vec<Mutation> {
    duplicates.iter().map(|event| Mutation::delete(event)).collect()
}
