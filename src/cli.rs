use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deduplicate and recolor Google Calendar events
#[derive(Debug, Parser)]
#[command(name = "calendar-sweeper", version, about)]
pub struct Cli {
    /// Calendar to operate on (defaults to GOOGLE_CALENDAR_ID or "primary")
    #[arg(long, global = true)]
    pub calendar: Option<String>,

    /// Keyword rules file (defaults to CALENDAR_RULES_PATH or config/rules.toml)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Write a debug-level log to this file, truncating it first
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete duplicate events, keeping the first of each
    Dedupe {
        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
        /// Ignore events that ended before this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// Recolor events whose titles contain a configured keyword
    Recolor {
        /// Only report what would be updated
        #[arg(long)]
        dry_run: bool,
        /// Ignore events that ended before this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },
    /// List the calendars of the account
    ListCalendars,
    /// Show the available event colors
    Colors,
    /// Delete the first event with the given title
    Delete {
        /// Exact event title
        title: String,
        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "calendar-sweeper",
            "recolor",
            "--dry-run",
            "--calendar",
            "work@example.com",
        ])
        .unwrap();

        assert_eq!(cli.calendar.as_deref(), Some("work@example.com"));
        assert!(matches!(
            cli.command,
            Command::Recolor {
                dry_run: true,
                since: None
            }
        ));
    }

    #[test]
    fn test_since_parses_rfc3339() {
        let cli = Cli::try_parse_from([
            "calendar-sweeper",
            "dedupe",
            "--since",
            "2024-09-01T00:00:00+02:00",
        ])
        .unwrap();

        match cli.command {
            Command::Dedupe { since, .. } => {
                let expected: DateTime<Utc> = "2024-08-31T22:00:00Z".parse().unwrap();
                assert_eq!(since, Some(expected));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_since_rejects_bare_dates() {
        let result = Cli::try_parse_from(["calendar-sweeper", "recolor", "--since", "2024-09-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_takes_title() {
        let cli = Cli::try_parse_from(["calendar-sweeper", "delete", "Dentist"]).unwrap();
        match cli.command {
            Command::Delete { title, dry_run } => {
                assert_eq!(title, "Dentist");
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
