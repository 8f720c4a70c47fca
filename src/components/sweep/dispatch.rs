use crate::components::google_calendar::models::{Mutation, MutationAction};
use crate::components::google_calendar::transport::CalendarTransport;
use crate::error::google_calendar_error;
use tracing::{debug, info, warn};

/// A mutation the service rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub event_id: String,
    pub summary: Option<String>,
    pub error: String,
}

/// Outcome counters of one dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<MutationFailure>,
}

impl MutationReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, mutation: &Mutation, result: crate::error::SweepResult<()>) {
        self.attempted += 1;
        match result {
            Ok(()) => {
                self.succeeded += 1;
                match &mutation.action {
                    MutationAction::Delete => info!("Deleted event: {}", mutation.title()),
                    MutationAction::SetColor(color_id) => info!(
                        "Updated event '{}' with color ID {}",
                        mutation.title(),
                        color_id
                    ),
                }
            }
            Err(e) => {
                self.failed += 1;
                let verb = match mutation.action {
                    MutationAction::Delete => "delete",
                    MutationAction::SetColor(_) => "update",
                };
                warn!(
                    "Failed to {} event: {}, Error: {}",
                    verb,
                    mutation.title(),
                    e
                );
                self.failures.push(MutationFailure {
                    event_id: mutation.event_id.clone(),
                    summary: mutation.summary.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Submit every mutation, grouping them into batches the transport accepts.
///
/// A rejected mutation is recorded and never stops the ones after it.
pub async fn apply_mutations<T>(
    transport: &T,
    calendar_id: &str,
    mutations: &[Mutation],
) -> MutationReport
where
    T: CalendarTransport + ?Sized,
{
    let mut report = MutationReport::default();
    let batch_size = transport.max_batch_size().max(1);

    for batch in mutations.chunks(batch_size) {
        debug!("Submitting {} mutations", batch.len());
        let mut results = transport.submit_batch(calendar_id, batch).await.into_iter();

        for mutation in batch {
            let result = results
                .next()
                .unwrap_or_else(|| Err(google_calendar_error("No result returned for mutation")));
            report.record(mutation, result);
        }
    }

    report
}
