//! Event scraping: the completed and upcoming listing pages.
//!
//! Both listings share one table layout: the first cell carries the event
//! link and date, the second the location. The listings are fetched
//! sequentially with the inter-batch delay between them; each listing gets
//! one retry and a listing that fails both attempts contributes nothing
//! rather than failing the phase.

use crate::config::ScrapeConfig;
use crate::http::HttpClient;
use crate::merge;
use crate::models::{Event, EventStatus};
use crate::utils::{clean_text, extract_id_from_url, normalize_field};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, instrument, warn};

static EVENTS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.b-statistics__table-events").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.b-statistics__table-content").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.b-statistics__date").unwrap());

/// Marker class on the highlighted "next event" row, which duplicates the
/// first upcoming event and is skipped.
const FIRST_ROW_MARKER: &str = "b-statistics__table-row_type_first";

/// Parse an event listing page.
pub fn parse_events_table(html: &str, status: EventStatus) -> Vec<Event> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&EVENTS_TABLE).next() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    // First row is the header.
    for row in table.select(&ROW).skip(1) {
        if row.value().classes().any(|class| class == FIRST_ROW_MARKER) {
            continue;
        }
        if let Some(event) = extract_event(row, status) {
            events.push(event);
        }
    }
    events
}

fn extract_event(row: ElementRef, status: EventStatus) -> Option<Event> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < 2 {
        return None;
    }

    let content = cells[0].select(&CONTENT).next()?;
    let link = content.select(&LINK).next()?;
    let date_tag = content.select(&DATE).next()?;

    let event_id = extract_id_from_url(link.value().attr("href")?);
    let name = clean_text(&link.text().collect::<String>());
    if event_id.is_empty() || name.is_empty() {
        return None;
    }

    Some(Event {
        event_id,
        name,
        date: normalize_field(&date_tag.text().collect::<String>()),
        location: normalize_field(&cells[1].text().collect::<String>()),
        status,
    })
}

/// Scrape both event listings, completed first, with the configured delay
/// between the two fetches.
#[instrument(level = "info", skip_all)]
pub async fn scrape_events(client: &HttpClient, config: &ScrapeConfig) -> Vec<Event> {
    let completed = scrape_listing(client, config, EventStatus::Completed).await;
    client.throttle().await;
    let upcoming = scrape_listing(client, config, EventStatus::Upcoming).await;

    let events = merge::dedupe_by_key([completed, upcoming].concat(), |event| {
        event.event_id.clone()
    });
    info!(count = events.len(), "Total events scraped");
    events
}

async fn scrape_listing(
    client: &HttpClient,
    config: &ScrapeConfig,
    status: EventStatus,
) -> Vec<Event> {
    let url = config.events_url(status);
    let html = match client.get_html(&url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, %status, "Event listing fetch failed; retrying once");
            match client.get_html(&url).await {
                Ok(html) => html,
                Err(e) => {
                    error!(error = %e, %status, "Event listing still failing after retry; skipping");
                    return Vec::new();
                }
            }
        }
    };

    let events = parse_events_table(&html, status);
    info!(count = events.len(), %status, "Indexed events");
    events
}
