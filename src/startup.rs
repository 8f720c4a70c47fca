use crate::cli::{Cli, Command};
use crate::commands::{self, CommandContext, DeleteOutcome};
use crate::components::google_calendar::{GoogleCalendarClient, TokenManager};
use crate::config::Config;
use crate::error::{other_error, SweepResult};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn, Subscriber};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn";
const FILE_LOG_FILTER: &str = "debug,reqwest=warn,hyper=warn,hyper_util=warn";

/// Initialize logging, optionally mirroring debug output into a file
pub fn init_logging(log_file: Option<&Path>) -> SweepResult<()> {
    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    );

    let file = match log_file {
        Some(path) => {
            // Truncated so each run starts with a fresh log
            Some(file_layer(File::create(path)?))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Debug-level layer for the log file, keeping HTTP client internals at warn
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new(FILE_LOG_FILTER))
}

/// Load configuration and apply command line overrides
pub fn load_config(cli: &Cli) -> SweepResult<Config> {
    let mut config = Config::load()?;

    if let Some(calendar) = &cli.calendar {
        config.google_calendar_id = calendar.clone();
    }
    if let Some(rules) = &cli.rules {
        config.rules_path = rules.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.debug_log = Some(log_file.clone());
    }

    Ok(config)
}

/// Build the API client from configuration
pub fn build_client(config: &Config) -> SweepResult<GoogleCalendarClient> {
    let token_manager = TokenManager::new(
        &config.token_path,
        &config.google_client_id,
        &config.google_client_secret,
    );
    GoogleCalendarClient::new(token_manager)
}

/// Run the selected command to completion
pub async fn run(command: &Command, config: &Config) -> SweepResult<()> {
    let client = build_client(config)?;
    let calendar_id = config.google_calendar_id.as_str();

    match command {
        Command::Dedupe { dry_run, since } => {
            let ctx = CommandContext::new(&client, calendar_id)
                .dry_run(*dry_run)
                .since(*since);
            let outcome = commands::dedupe(&ctx).await?;
            report_failures(outcome.report.failed);
        }
        Command::Recolor { dry_run, since } => {
            let rules = config.load_rules()?;
            info!("Loaded {} keyword rules", rules.len());
            let ctx = CommandContext::new(&client, calendar_id)
                .dry_run(*dry_run)
                .since(*since);
            let outcome = commands::recolor(&ctx, &rules).await?;
            report_failures(outcome.report.failed);
        }
        Command::ListCalendars => {
            commands::list_calendars(&client).await?;
        }
        Command::Colors => {
            commands::show_colors(&client).await?;
        }
        Command::Delete { title, dry_run } => {
            let ctx = CommandContext::new(&client, calendar_id).dry_run(*dry_run);
            match commands::delete_by_title(&ctx, title).await? {
                DeleteOutcome::NotFound => {
                    println!("No event was found with the summary {}. Please try again.", title)
                }
                DeleteOutcome::DryRun(event) => {
                    println!("The event {} ({}) would be deleted", title, event.id)
                }
                DeleteOutcome::Applied(report) if report.is_clean() => {
                    println!("The event {} has been deleted", title)
                }
                DeleteOutcome::Applied(_) => error!("The event {} could not be deleted", title),
            }
        }
    }

    Ok(())
}

fn report_failures(failed: usize) {
    if failed > 0 {
        warn!("{} mutations failed, see the log above for details", failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_layer_keeps_debug_but_not_http_internals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let subscriber =
            tracing_subscriber::registry().with(file_layer(File::create(&path).unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "calendar_sweeper::sweep", "Checking event: Swim");
            tracing::debug!(target: "reqwest::connect", "starting new connection");
            tracing::debug!(target: "hyper_util::client", "pooling idle connection");
            tracing::warn!(target: "hyper_util::client", "connection reset");
        });

        let log = fs::read_to_string(&path).unwrap();
        assert!(log.contains("Checking event: Swim"));
        assert!(log.contains("connection reset"));
        assert!(!log.contains("starting new connection"));
        assert!(!log.contains("pooling idle connection"));
    }
}
