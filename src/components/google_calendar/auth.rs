use super::token::{stamp_expiry, TOKEN_URL};
use crate::config::Config;
use crate::error::{auth_error, SweepResult};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

/// Google's OAuth consent page
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scopes requested during authorization. Changing them requires a new token.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.events.owned",
    "https://www.googleapis.com/auth/calendar.calendarlist.readonly",
];

/// Build the consent URL the user is sent to
pub fn authorization_url(client_id: &str, redirect_uri: &str, state: &str) -> SweepResult<Url> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| auth_error(&format!("Failed to build authorization URL: {}", e)))
}

/// Extract the authorization code from the redirect request path.
///
/// Returns `Ok(None)` for requests that carry neither a code nor an error,
/// such as a browser asking for `/favicon.ico`.
pub fn parse_callback(request_path: &str, expected_state: &str) -> SweepResult<Option<String>> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(request_path))
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(auth_error(&format!("Authorization was denied: {}", value)));
            }
            _ => {}
        }
    }

    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("State parameter does not match the request"));
    }
    Ok(Some(code))
}

/// Exchange an authorization code for tokens
pub async fn exchange_code(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> SweepResult<Value> {
    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(auth_error(&format!("Failed to get token: {}", error_text)));
    }

    let token: Value = response.json().await?;
    stamp_expiry(token)
}

/// Run the installed-app flow: open the browser, wait for the redirect, fetch tokens
pub async fn authorize(config: &Config) -> SweepResult<Value> {
    let redirect_uri = format!("http://127.0.0.1:{}", config.redirect_port);
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = authorization_url(&config.google_client_id, &redirect_uri, &state)?;

    println!("Opening browser for Google Calendar authorization...");
    if let Err(e) = webbrowser::open(auth_url.as_str()) {
        warn!("Could not open a browser: {}", e);
        println!("Open this URL to continue:\n{}", auth_url);
    }

    let server = tiny_http::Server::http(("127.0.0.1", config.redirect_port))
        .map_err(|e| auth_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    let code = loop {
        let request = server.recv()?;
        match parse_callback(request.url(), &state) {
            Ok(Some(code)) => {
                let response = tiny_http::Response::from_string(
                    "Authorization successful! You can close this window.",
                );
                request.respond(response)?;
                break code;
            }
            Ok(None) => {
                request.respond(tiny_http::Response::empty(tiny_http::StatusCode(404)))?;
            }
            Err(e) => {
                let response = tiny_http::Response::from_string(e.to_string());
                request.respond(response)?;
                return Err(e);
            }
        }
    };

    info!("Received authorization code, exchanging it for tokens");
    exchange_code(
        &Client::new(),
        &config.google_client_id,
        &config.google_client_secret,
        &code,
        &redirect_uri,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_requests_offline_access() {
        let url = authorization_url("client", "http://localhost:8080", "s1").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(pairs.contains(&("state".to_string(), "s1".to_string())));
        let scope = pairs.iter().find(|(k, _)| k == "scope").unwrap();
        assert!(scope.1.contains("calendar.events.owned"));
    }

    #[test]
    fn test_parse_callback_returns_code() {
        let code = parse_callback("/?state=abc&code=4%2F0Ab", "abc").unwrap();
        assert_eq!(code.as_deref(), Some("4/0Ab"));
    }

    #[test]
    fn test_parse_callback_rejects_wrong_state() {
        assert!(parse_callback("/?state=other&code=xyz", "abc").is_err());
    }

    #[test]
    fn test_parse_callback_reports_denial() {
        assert!(parse_callback("/?error=access_denied&state=abc", "abc").is_err());
    }

    #[test]
    fn test_parse_callback_ignores_unrelated_requests() {
        assert_eq!(parse_callback("/favicon.ico", "abc").unwrap(), None);
    }
}
