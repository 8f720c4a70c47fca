use super::CommandContext;
use crate::components::google_calendar::models::{CalendarEvent, CalendarListEntry, Colors};
use crate::components::google_calendar::{CalendarTransport, Mutation};
use crate::components::sweep::{self, apply_mutations, find_event_by_summary, MutationReport};
use crate::error::SweepResult;
use tracing::info;

/// Print every calendar of the account
pub async fn list_calendars<T>(transport: &T) -> SweepResult<Vec<CalendarListEntry>>
where
    T: CalendarTransport + ?Sized,
{
    let calendars = sweep::list_calendars(transport).await?;

    if calendars.is_empty() {
        println!("No calendars found.");
    }
    for calendar in &calendars {
        println!(
            "ID: {}, Summary: {}{}",
            calendar.id,
            calendar.summary.as_deref().unwrap_or(""),
            if calendar.primary == Some(true) { " (primary)" } else { "" }
        );
    }

    Ok(calendars)
}

/// Print the event color palette
pub async fn show_colors<T>(transport: &T) -> SweepResult<Colors>
where
    T: CalendarTransport + ?Sized,
{
    let colors = transport.get_colors().await?;

    for (id, color) in colors.event_colors() {
        println!("colorId: {}", id);
        println!("Background: {}", color.background);
        println!("Foreground: {}", color.foreground);
    }

    Ok(colors)
}

/// Result of deleting an event by its title
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// No event has that title
    NotFound,
    /// Found, but left in place because of a dry run
    DryRun(CalendarEvent),
    Applied(MutationReport),
}

/// Delete the first event whose title equals `title`
pub async fn delete_by_title<T>(
    ctx: &CommandContext<'_, T>,
    title: &str,
) -> SweepResult<DeleteOutcome>
where
    T: CalendarTransport + ?Sized,
{
    let Some(event) = find_event_by_summary(ctx.transport, ctx.calendar_id, title).await? else {
        info!("No event was found with the summary {}", title);
        return Ok(DeleteOutcome::NotFound);
    };

    if ctx.dry_run {
        info!("The event {} ({}) would be deleted", title, event.id);
        return Ok(DeleteOutcome::DryRun(event));
    }

    info!("The event {} will be deleted", title);
    let mutation = Mutation::delete(&event);
    let report = apply_mutations(ctx.transport, ctx.calendar_id, &[mutation]).await;
    Ok(DeleteOutcome::Applied(report))
}
