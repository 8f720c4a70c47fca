use super::models::{
    CalendarEvent, CalendarListPage, Colors, EventsPage, Mutation, MutationAction,
};
use super::token::TokenManager;
use super::transport::{CalendarTransport, EventQuery};
use crate::error::{google_calendar_error, SweepResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Base URL of the Calendar v3 REST API
pub const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
/// Batch endpoint of the Calendar API
pub const BATCH_URL: &str = "https://www.googleapis.com/batch/calendar/v3";
/// Google recommends at most 50 calls per calendar batch request
pub const BATCH_LIMIT: usize = 50;

/// Google Calendar REST client
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    token_manager: TokenManager,
    api_base: Url,
    batch_url: Url,
}

impl GoogleCalendarClient {
    pub fn new(token_manager: TokenManager) -> SweepResult<Self> {
        Self::with_endpoints(token_manager, API_BASE, BATCH_URL)
    }

    /// Create a client talking to custom endpoints
    pub fn with_endpoints(
        token_manager: TokenManager,
        api_base: &str,
        batch_url: &str,
    ) -> SweepResult<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        let batch_url = Url::parse(batch_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            token_manager,
            api_base,
            batch_url,
        })
    }

    /// Build an API URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> SweepResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("API base URL cannot be a base"))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> SweepResult<Url> {
        self.endpoint(&["calendars", calendar_id, "events", event_id])
    }

    fn events_url(
        &self,
        calendar_id: &str,
        query: &EventQuery,
        page_token: Option<&str>,
    ) -> SweepResult<Url> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if query.single_events {
                pairs.append_pair("singleEvents", "true");
            }
            if let Some(time_min) = &query.time_min {
                pairs.append_pair("timeMin", &time_min.to_rfc3339());
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    /// Attach credentials, send, and turn non-success statuses into errors
    async fn send(&self, request: RequestBuilder, action: &str) -> SweepResult<Response> {
        let access_token = self.token_manager.access_token().await?;

        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> SweepResult<T> {
        let response = self.send(request, action).await?;
        response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse response to {}: {}", action, e))
        })
    }

    /// Render mutations as a `multipart/mixed` batch body
    fn batch_body(
        &self,
        boundary: &str,
        calendar_id: &str,
        batch: &[Mutation],
    ) -> SweepResult<String> {
        let mut body = String::new();
        for (index, mutation) in batch.iter().enumerate() {
            let url = self.event_url(calendar_id, &mutation.event_id)?;
            body.push_str(&format!(
                "--{}\r\nContent-Type: application/http\r\nContent-ID: <item-{}>\r\n\r\n",
                boundary, index
            ));
            match &mutation.action {
                MutationAction::Delete => {
                    body.push_str(&format!("DELETE {} HTTP/1.1\r\n\r\n", url.path()));
                }
                MutationAction::SetColor(color_id) => {
                    body.push_str(&format!(
                        "PATCH {} HTTP/1.1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n",
                        url.path(),
                        json!({ "colorId": color_id })
                    ));
                }
            }
        }
        body.push_str(&format!("--{}--\r\n", boundary));
        Ok(body)
    }

    async fn send_batch(
        &self,
        calendar_id: &str,
        batch: &[Mutation],
    ) -> SweepResult<Vec<SweepResult<()>>> {
        let boundary = format!("batch_{}", Uuid::new_v4().simple());
        let body = self.batch_body(&boundary, calendar_id, batch)?;

        debug!("Executing batch of {} requests", batch.len());
        let request = self
            .client
            .post(self.batch_url.clone())
            .header(
                CONTENT_TYPE,
                format!("multipart/mixed; boundary={}", boundary),
            )
            .body(body);
        let response = self.send(request, "submit batch").await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response
            .text()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to read batch response: {}", e)))?;

        Ok(parse_batch_response(&content_type, &text, batch.len()))
    }
}

#[async_trait]
impl CalendarTransport for GoogleCalendarClient {
    async fn list_events_page(
        &self,
        calendar_id: &str,
        query: &EventQuery,
        page_token: Option<&str>,
    ) -> SweepResult<EventsPage> {
        let url = self.events_url(calendar_id, query, page_token)?;
        let page: EventsPage = self.send_json(self.client.get(url), "fetch events").await?;
        debug!(
            "Fetched page of {} events (more: {})",
            page.items.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SweepResult<()> {
        let url = self.event_url(calendar_id, event_id)?;
        self.send(self.client.delete(url), "delete event").await?;
        Ok(())
    }

    async fn set_event_color(
        &self,
        calendar_id: &str,
        event_id: &str,
        color_id: &str,
    ) -> SweepResult<CalendarEvent> {
        let url = self.event_url(calendar_id, event_id)?;
        let request = self.client.patch(url).json(&json!({ "colorId": color_id }));
        self.send_json(request, "update event").await
    }

    async fn list_calendars_page(
        &self,
        page_token: Option<&str>,
    ) -> SweepResult<CalendarListPage> {
        let mut url = self.endpoint(&["users", "me", "calendarList"])?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }
        self.send_json(self.client.get(url), "list calendars").await
    }

    async fn get_colors(&self) -> SweepResult<Colors> {
        let url = self.endpoint(&["colors"])?;
        self.send_json(self.client.get(url), "fetch colors").await
    }

    fn max_batch_size(&self) -> usize {
        BATCH_LIMIT
    }

    async fn submit_batch(&self, calendar_id: &str, batch: &[Mutation]) -> Vec<SweepResult<()>> {
        if batch.len() == 1 {
            return vec![self.submit(calendar_id, &batch[0]).await];
        }

        batch_results(self.send_batch(calendar_id, batch).await, batch.len())
    }
}

/// Spread the outcome of a batch request over its items.
///
/// When the request itself failed, every item in it failed with that error.
fn batch_results(
    outcome: SweepResult<Vec<SweepResult<()>>>,
    len: usize,
) -> Vec<SweepResult<()>> {
    match outcome {
        Ok(results) => results,
        Err(e) => {
            let message = e.to_string();
            (0..len)
                .map(|_| Err(google_calendar_error(&message)))
                .collect()
        }
    }
}

/// Split a `multipart/mixed` batch response into one result per request.
///
/// Parts are matched to requests by their `Content-ID`; requests without a
/// matching part are reported as failed.
pub fn parse_batch_response(
    content_type: &str,
    body: &str,
    expected: usize,
) -> Vec<SweepResult<()>> {
    let mut results: Vec<Option<SweepResult<()>>> = (0..expected).map(|_| None).collect();

    if let Some(boundary) = boundary_of(content_type) {
        let delimiter = format!("--{}", boundary);
        for part in body.split(delimiter.as_str()) {
            let part = part.trim();
            if part.is_empty() || part == "--" {
                continue;
            }
            if let Some(index) = content_id_index(part) {
                if index < expected {
                    results[index] = Some(part_result(part));
                }
            }
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Err(google_calendar_error("No response for batch item"))))
        .collect()
}

fn boundary_of(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"'))
}

fn content_id_index(part: &str) -> Option<usize> {
    let line = part
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-id:"))?;
    let id = line.rsplit("item-").next()?;
    id.trim().trim_end_matches('>').parse().ok()
}

fn part_result(part: &str) -> SweepResult<()> {
    let mut lines = part.lines().skip_while(|l| !l.starts_with("HTTP/"));
    let status_line = lines
        .next()
        .ok_or_else(|| google_calendar_error("Batch item has no status line"))?;
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| google_calendar_error(&format!("Bad status line: {}", status_line)))?;

    if (200..300).contains(&status) {
        return Ok(());
    }

    let body = lines
        .skip_while(|l| !l.trim().is_empty())
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n");
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    Err(google_calendar_error(&format!("HTTP {} - {}", status, message)))
}
