use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Start or end marker of an event: either an all-day date or a date-time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed marker, e.g. `2024-01-01T10:00:00+02:00`
    pub fn at(date_time: &str) -> Self {
        Self {
            date_time: Some(date_time.to_string()),
            ..Default::default()
        }
    }

    /// An all-day marker, e.g. `2024-01-01`
    pub fn on(date: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    /// The date-time if present, otherwise the date
    pub fn marker(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// Calendar event as returned by the events endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub color_id: Option<String>,
}

impl CalendarEvent {
    /// Title of the event, empty when the event has none
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn start_marker(&self) -> Option<&str> {
        self.start.as_ref().and_then(EventTime::marker)
    }

    pub fn end_marker(&self) -> Option<&str> {
        self.end.as_ref().and_then(EventTime::marker)
    }
}

/// One page of `events.list`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Entry of the user's calendar list
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub primary: Option<bool>,
}

/// One page of `calendarList.list`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListPage {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColorDefinition {
    pub background: String,
    pub foreground: String,
}

/// Palette returned by the `colors` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Colors {
    #[serde(default)]
    pub event: BTreeMap<String, ColorDefinition>,
}

impl Colors {
    /// Event colors ordered by their numeric id
    pub fn event_colors(&self) -> Vec<(&str, &ColorDefinition)> {
        let mut colors: Vec<_> = self.event.iter().map(|(id, c)| (id.as_str(), c)).collect();
        colors.sort_by_key(|(id, _)| (id.parse::<u32>().unwrap_or(u32::MAX), id.to_string()));
        colors
    }
}

/// What to do with a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationAction {
    Delete,
    SetColor(String),
}

/// An update or delete request targeting one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub event_id: String,
    pub summary: Option<String>,
    pub action: MutationAction,
}

impl Mutation {
    pub fn delete(event: &CalendarEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            summary: event.summary.clone(),
            action: MutationAction::Delete,
        }
    }

    pub fn set_color(event: &CalendarEvent, color_id: &str) -> Self {
        Self {
            event_id: event.id.clone(),
            summary: event.summary.clone(),
            action: MutationAction::SetColor(color_id.to_string()),
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_from_api_json() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "abc123",
            "status": "confirmed",
            "summary": "CHEM-101 Lecture",
            "colorId": "5",
            "start": { "dateTime": "2024-01-01T10:00:00-05:00", "timeZone": "America/New_York" },
            "end": { "date": "2024-01-02" }
        }"#;

        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "abc123");
        assert_eq!(event.color_id.as_deref(), Some("5"));
        assert_eq!(event.start_marker(), Some("2024-01-01T10:00:00-05:00"));
        assert_eq!(event.end_marker(), Some("2024-01-02"));
    }

    #[test]
    fn test_event_without_summary_has_empty_title() {
        let event: CalendarEvent = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(event.title(), "");
        assert_eq!(event.start_marker(), None);
    }

    #[test]
    fn test_event_colors_sorted_numerically() {
        let json = r##"{
            "calendar": {"1": {"background": "#ac725e", "foreground": "#1d1d1d"}},
            "event": {
                "10": {"background": "#51b749", "foreground": "#1d1d1d"},
                "2": {"background": "#7ae7bf", "foreground": "#1d1d1d"},
                "1": {"background": "#a4bdfc", "foreground": "#1d1d1d"}
            }
        }"##;
        let colors: Colors = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = colors.event_colors().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }
}
