use crate::components::google_calendar::models::{CalendarEvent, CalendarListEntry};
use crate::components::google_calendar::transport::{CalendarTransport, EventQuery};
use crate::error::{Error, SweepResult};
use futures::stream::{self, Stream, TryStreamExt};
use std::pin::pin;
use tracing::{debug, info};

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily fetch event pages, following continuation tokens until none is left.
///
/// Pages are yielded in the service's order.
pub fn event_pages<'a, T>(
    transport: &'a T,
    calendar_id: &'a str,
    query: &'a EventQuery,
) -> impl Stream<Item = SweepResult<Vec<CalendarEvent>>> + 'a
where
    T: CalendarTransport + ?Sized,
{
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let page_token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok::<_, Error>(None),
        };

        let page = transport
            .list_events_page(calendar_id, query, page_token.as_deref())
            .await?;

        let next = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };
        Ok(Some((page.items, next)))
    })
}

/// Fetch every event of a calendar into memory, in listing order
pub async fn list_events<T>(
    transport: &T,
    calendar_id: &str,
    query: &EventQuery,
) -> SweepResult<Vec<CalendarEvent>>
where
    T: CalendarTransport + ?Sized,
{
    let events: Vec<CalendarEvent> = event_pages(transport, calendar_id, query)
        .try_concat()
        .await?;

    if events.is_empty() {
        info!("No events found in calendar {}", calendar_id);
    } else {
        debug!("Listed {} events from calendar {}", events.len(), calendar_id);
    }
    Ok(events)
}

/// Find the first event whose title equals `summary`, stopping at the page that holds it
pub async fn find_event_by_summary<T>(
    transport: &T,
    calendar_id: &str,
    summary: &str,
) -> SweepResult<Option<CalendarEvent>>
where
    T: CalendarTransport + ?Sized,
{
    let query = EventQuery::default();
    let mut pages = pin!(event_pages(transport, calendar_id, &query));

    while let Some(page) = pages.try_next().await? {
        if let Some(event) = page
            .into_iter()
            .find(|e| e.summary.as_deref() == Some(summary))
        {
            return Ok(Some(event));
        }
    }

    Ok(None)
}

/// List every calendar of the authenticated account
pub async fn list_calendars<T>(transport: &T) -> SweepResult<Vec<CalendarListEntry>>
where
    T: CalendarTransport + ?Sized,
{
    let mut calendars = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = transport.list_calendars_page(page_token.as_deref()).await?;
        calendars.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(calendars)
}
