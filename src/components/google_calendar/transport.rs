use super::models::{
    CalendarEvent, CalendarListPage, Colors, EventsPage, Mutation, MutationAction,
};
use crate::error::SweepResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Query options for listing events
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Expand recurring events into single instances
    pub single_events: bool,
    /// Lower bound (exclusive) for an event's end time
    pub time_min: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn single_events() -> Self {
        Self {
            single_events: true,
            ..Default::default()
        }
    }
}

/// Calendar service operations the sweeper depends on
#[async_trait]
pub trait CalendarTransport: Send + Sync {
    /// Fetch one page of events, starting at `page_token` when given
    async fn list_events_page(
        &self,
        calendar_id: &str,
        query: &EventQuery,
        page_token: Option<&str>,
    ) -> SweepResult<EventsPage>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SweepResult<()>;

    async fn set_event_color(
        &self,
        calendar_id: &str,
        event_id: &str,
        color_id: &str,
    ) -> SweepResult<CalendarEvent>;

    async fn list_calendars_page(&self, page_token: Option<&str>)
        -> SweepResult<CalendarListPage>;

    async fn get_colors(&self) -> SweepResult<Colors>;

    /// Largest number of mutations accepted by one `submit_batch` call
    fn max_batch_size(&self) -> usize {
        1
    }

    /// Submit a single mutation
    async fn submit(&self, calendar_id: &str, mutation: &Mutation) -> SweepResult<()> {
        match &mutation.action {
            MutationAction::Delete => self.delete_event(calendar_id, &mutation.event_id).await,
            MutationAction::SetColor(color_id) => self
                .set_event_color(calendar_id, &mutation.event_id, color_id)
                .await
                .map(|_| ()),
        }
    }

    /// Submit a group of mutations, returning one result per mutation in order.
    ///
    /// Transports without a batch endpoint fall back to one request per item.
    async fn submit_batch(&self, calendar_id: &str, batch: &[Mutation]) -> Vec<SweepResult<()>> {
        let mut results = Vec::with_capacity(batch.len());
        for mutation in batch {
            results.push(self.submit(calendar_id, mutation).await);
        }
        results
    }
}
