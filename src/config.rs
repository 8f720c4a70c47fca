use crate::components::sweep::KeywordRule;
use crate::error::{config_error, env_error, SweepResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Calendar alias for the account's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_RULES_PATH: &str = "config/rules.toml";
pub const DEFAULT_REDIRECT_PORT: u16 = 8080;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Calendar to operate on
    pub google_calendar_id: String,
    /// Where the OAuth token is stored
    pub token_path: PathBuf,
    /// TOML file holding the color table and keyword rules
    pub rules_path: PathBuf,
    /// Optional file receiving a debug-level copy of the log
    pub debug_log: Option<PathBuf>,
    /// Local port receiving the OAuth redirect
    pub redirect_port: u16,
}

impl Config {
    /// Load configuration from the environment and an optional .env file
    pub fn load() -> SweepResult<Self> {
        dotenv().ok();

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let google_calendar_id = env::var("GOOGLE_CALENDAR_ID")
            .unwrap_or_else(|_| String::from(DEFAULT_CALENDAR_ID));
        let token_path = env::var("CALENDAR_TOKEN_PATH")
            .unwrap_or_else(|_| String::from(DEFAULT_TOKEN_PATH))
            .into();
        let rules_path = env::var("CALENDAR_RULES_PATH")
            .unwrap_or_else(|_| String::from(DEFAULT_RULES_PATH))
            .into();
        let debug_log = env::var("CALENDAR_DEBUG_LOG").ok().map(PathBuf::from);

        let redirect_port = match env::var("OAUTH_REDIRECT_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| config_error("Invalid OAUTH_REDIRECT_PORT format"))?,
            Err(_) => DEFAULT_REDIRECT_PORT,
        };

        Ok(Config {
            google_client_id,
            google_client_secret,
            google_calendar_id,
            token_path,
            rules_path,
            debug_log,
            redirect_port,
        })
    }

    /// Load the keyword rules referenced by this configuration
    pub fn load_rules(&self) -> SweepResult<Vec<KeywordRule>> {
        load_rules(&self.rules_path)
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    /// Category name to color id
    #[serde(default)]
    colors: HashMap<String, String>,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    keyword: String,
    category: Option<String>,
    color: Option<String>,
}

/// Read keyword rules from a TOML file; a missing file means no rules
pub fn load_rules(path: &Path) -> SweepResult<Vec<KeywordRule>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_rules(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Rules file {} not found, no keyword rules loaded", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse the rules file format:
///
/// ```toml
/// [colors]
/// classes = "5"
///
/// [[rules]]
/// keyword = "CHEM-"
/// category = "classes"
///
/// [[rules]]
/// keyword = "Swim"
/// color = "7"
/// ```
///
/// Rules keep their file order.
pub fn parse_rules(content: &str) -> SweepResult<Vec<KeywordRule>> {
    let file: RulesFile = toml::from_str(content)?;

    file.rules
        .into_iter()
        .map(|entry| {
            if entry.keyword.trim().is_empty() {
                return Err(config_error("Rule keyword must not be empty"));
            }

            let color_id = match (entry.category, entry.color) {
                (_, Some(color)) => color,
                (Some(category), None) => file.colors.get(&category).cloned().ok_or_else(|| {
                    config_error(&format!(
                        "Rule '{}' refers to unknown category '{}'",
                        entry.keyword, category
                    ))
                })?,
                (None, None) => {
                    return Err(config_error(&format!(
                        "Rule '{}' needs a category or a color",
                        entry.keyword
                    )))
                }
            };

            Ok(KeywordRule::new(&entry.keyword, &color_id))
        })
        .collect()
}
