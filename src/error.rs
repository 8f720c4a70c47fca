use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(
        code(calendar_sweeper::environment),
        help("Set the variable in your shell or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_sweeper::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calendar_sweeper::google_calendar))]
    GoogleCalendar(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(calendar_sweeper::auth),
        help("Run `get_calendar_token` to authorize this tool again")
    )]
    Auth(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(calendar_sweeper::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(calendar_sweeper::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_sweeper::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_sweeper::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SweepResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
