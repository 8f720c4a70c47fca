//! Google Calendar API access: models, OAuth token handling and the REST client.

pub mod auth;
pub mod client;
pub mod models;
pub mod token;
pub mod transport;

pub use client::GoogleCalendarClient;
pub use models::{CalendarEvent, EventTime, Mutation, MutationAction};
pub use token::TokenManager;
pub use transport::{CalendarTransport, EventQuery};
