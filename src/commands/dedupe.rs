use super::CommandContext;
use crate::components::google_calendar::CalendarTransport;
use crate::components::sweep::{
    apply_mutations, deletion_mutations, find_duplicates, list_events, MutationReport,
};
use crate::error::SweepResult;
use tracing::info;

/// Result of a duplicate sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeOutcome {
    /// Events checked
    pub checked: usize,
    /// Duplicates found
    pub found: usize,
    /// Deletions submitted, empty on a dry run
    pub report: MutationReport,
}

/// Find duplicate events in the calendar and delete all but the first of each
pub async fn dedupe<T>(ctx: &CommandContext<'_, T>) -> SweepResult<DedupeOutcome>
where
    T: CalendarTransport + ?Sized,
{
    let events = list_events(ctx.transport, ctx.calendar_id, &ctx.event_query(false)).await?;
    let duplicates = find_duplicates(&events);
    let mutations = deletion_mutations(&duplicates);

    let mut outcome = DedupeOutcome {
        checked: events.len(),
        found: duplicates.len(),
        ..Default::default()
    };

    if ctx.dry_run {
        for mutation in &mutations {
            info!(
                "Would delete duplicate event: {} ({})",
                mutation.title(),
                mutation.event_id
            );
        }
        info!("Total duplicates found: {} (dry run)", outcome.found);
        return Ok(outcome);
    }

    outcome.report = apply_mutations(ctx.transport, ctx.calendar_id, &mutations).await;
    info!(
        "Total duplicates found: {}, deleted: {}, failed: {}",
        outcome.found, outcome.report.succeeded, outcome.report.failed
    );

    Ok(outcome)
}
