use calendar_sweeper::cli::Cli;
use calendar_sweeper::startup;
use clap::Parser;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = startup::load_config(&cli)?;

    // Initialize logging
    startup::init_logging(config.debug_log.as_deref())?;

    info!(
        "Starting calendar-sweeper on calendar {}",
        config.google_calendar_id
    );

    startup::run(&cli.command, &config).await?;
    Ok(())
}
