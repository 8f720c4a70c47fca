use super::CommandContext;
use crate::components::google_calendar::CalendarTransport;
use crate::components::sweep::{
    apply_mutations, list_events, plan_recolor, KeywordRule, MutationReport, RecolorSummary,
};
use crate::error::SweepResult;
use tracing::{debug, info, warn};

/// Result of a recoloring run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecolorOutcome {
    pub summary: RecolorSummary,
    /// Updates submitted, empty on a dry run
    pub report: MutationReport,
}

/// Recolor events whose titles contain a rule's keyword
pub async fn recolor<T>(
    ctx: &CommandContext<'_, T>,
    rules: &[KeywordRule],
) -> SweepResult<RecolorOutcome>
where
    T: CalendarTransport + ?Sized,
{
    if rules.is_empty() {
        warn!("No keyword rules configured, nothing to recolor");
        return Ok(RecolorOutcome::default());
    }

    let events = list_events(ctx.transport, ctx.calendar_id, &ctx.event_query(true)).await?;
    let plan = plan_recolor(&events, rules);

    for classification in &plan.classifications {
        debug!(
            "Checking event: {} (Current Color: {}) - {}",
            classification.event.title(),
            classification.event.color_id.as_deref().unwrap_or("default"),
            classification.decision
        );
    }

    let mut outcome = RecolorOutcome {
        summary: plan.summary(),
        ..Default::default()
    };

    if ctx.dry_run {
        info!(
            "Total events checked: {}, would update: {} (dry run)",
            outcome.summary.checked, outcome.summary.updated
        );
        return Ok(outcome);
    }

    outcome.report = apply_mutations(ctx.transport, ctx.calendar_id, &plan.mutations).await;
    info!("Total events checked: {}", outcome.summary.checked);
    info!(
        "Total events updated: {} ({} failed)",
        outcome.report.succeeded, outcome.report.failed
    );

    Ok(outcome)
}
