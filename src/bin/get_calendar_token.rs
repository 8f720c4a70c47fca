use calendar_sweeper::components::google_calendar::{auth, TokenManager};
use calendar_sweeper::config::Config;
use calendar_sweeper::error::SweepResult;

#[tokio::main(flavor = "current_thread")]
async fn main() -> SweepResult<()> {
    // Load configuration
    let config = Config::load()?;

    let token_manager = TokenManager::new(
        &config.token_path,
        &config.google_client_id,
        &config.google_client_secret,
    );

    // Run the browser consent flow and exchange the code for tokens
    let token_data = auth::authorize(&config).await?;

    // Save token using TokenManager
    token_manager.set_token(token_data).await?;

    println!(
        "Token successfully saved to {}!",
        token_manager.path().display()
    );

    Ok(())
}
