pub mod google_calendar;
pub mod sweep;

pub use google_calendar::{CalendarTransport, GoogleCalendarClient};
