use crate::error::{auth_error, SweepResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Google's OAuth token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Loads, refreshes and persists the OAuth token in a local JSON file
#[derive(Clone)]
pub struct TokenManager {
    path: PathBuf,
    client_id: String,
    client_secret: String,
    client: Client,
    cached: Arc<Mutex<Option<Value>>>,
}

impl TokenManager {
    pub fn new(path: impl Into<PathBuf>, client_id: &str, client_secret: &str) -> Self {
        Self {
            path: path.into(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            client: Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a valid access token, refreshing the stored token when it has expired
    pub async fn access_token(&self) -> SweepResult<String> {
        let token = self.get_token().await?;
        token
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| auth_error("No access token available"))
    }

    /// Get OAuth token, either from memory, from disk or by refreshing it
    pub async fn get_token(&self) -> SweepResult<Value> {
        let mut cached = self.cached.lock().await;

        let token = match cached.take() {
            Some(token) => Some(token),
            None => self.read_token()?,
        };

        let token = match token {
            Some(token) if !is_expired(&token) => token,
            Some(token) => {
                info!("Stored token has expired, refreshing it");
                self.refresh_token(&token).await?
            }
            None => {
                return Err(auth_error(&format!(
                    "No token found at {}",
                    self.path.display()
                )))
            }
        };

        *cached = Some(token.clone());
        Ok(token)
    }

    /// Persist a token, replacing any previous one
    pub async fn set_token(&self, token: Value) -> SweepResult<()> {
        self.write_token(&token)?;
        *self.cached.lock().await = Some(token);
        Ok(())
    }

    fn write_token(&self, token: &Value) -> SweepResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        debug!("Token written to {}", self.path.display());
        Ok(())
    }

    fn read_token(&self) -> SweepResult<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let token: Value = serde_json::from_str(&content)
            .map_err(|e| auth_error(&format!("Failed to parse stored token: {}", e)))?;
        Ok(Some(token))
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &Value) -> SweepResult<Value> {
        let refresh_token = token
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_error("Token has expired and holds no refresh token"))?;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        // The caller holds the cache lock, so only the file is written here
        let refreshed = merge_refreshed_token(token, &new_token)?;
        self.write_token(&refreshed)?;
        Ok(refreshed)
    }
}

/// Add an absolute `expires_at` timestamp to a token response
pub fn stamp_expiry(mut token: Value) -> SweepResult<Value> {
    let expires_in = token
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);
    let expires_at = Utc::now().timestamp() + expires_in;

    let obj = token
        .as_object_mut()
        .ok_or_else(|| auth_error("Token data is not an object"))?;
    obj.insert("expires_at".to_string(), json!(expires_at));
    Ok(token)
}

fn is_expired(token: &Value) -> bool {
    match token.get("expires_at").and_then(|v| v.as_i64()) {
        Some(expires_at) => expires_at - EXPIRY_MARGIN_SECS <= Utc::now().timestamp(),
        None => true,
    }
}

/// Keep the old refresh token unless the service rotated it
fn merge_refreshed_token(old: &Value, new_token: &Value) -> SweepResult<Value> {
    let access_token = new_token
        .get("access_token")
        .cloned()
        .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?;

    let mut merged = old.as_object().cloned().unwrap_or_default();
    merged.insert("access_token".to_string(), access_token);
    if let Some(refresh) = new_token.get("refresh_token") {
        merged.insert("refresh_token".to_string(), refresh.clone());
    }
    if let Some(expires_in) = new_token.get("expires_in") {
        merged.insert("expires_in".to_string(), expires_in.clone());
    } else {
        merged.remove("expires_in");
    }

    stamp_expiry(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_token_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let expires_at = Utc::now().timestamp() + 3600;
        fs::write(
            &path,
            json!({"access_token": "abc", "refresh_token": "r", "expires_at": expires_at})
                .to_string(),
        )
        .unwrap();

        let manager = TokenManager::new(&path, "id", "secret");
        assert_eq!(manager.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TokenManager::new(dir.path().join("none.json"), "id", "secret");
        let err = manager.get_token().await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, json!({"access_token": "old", "expires_at": 0}).to_string()).unwrap();

        let manager = TokenManager::new(&path, "id", "secret");
        assert!(manager.access_token().await.is_err());
    }

    #[tokio::test]
    async fn test_set_token_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let manager = TokenManager::new(&path, "id", "secret");

        let token = stamp_expiry(json!({"access_token": "fresh", "expires_in": 3599})).unwrap();
        manager.set_token(token).await.unwrap();

        assert!(path.exists());
        assert_eq!(manager.access_token().await.unwrap(), "fresh");
    }

    #[test]
    fn test_refresh_keeps_existing_refresh_token() {
        let old = json!({"access_token": "old", "refresh_token": "keep", "expires_at": 0});
        let new_token = json!({"access_token": "new", "expires_in": 3600});

        let merged = merge_refreshed_token(&old, &new_token).unwrap();
        assert_eq!(merged["access_token"], "new");
        assert_eq!(merged["refresh_token"], "keep");
        assert!(!is_expired(&merged));
    }
}
