//! Fight scraping: per-event bout lists and fight-details pages.
//!
//! The fight-details page is the least regular markup in the source: upcoming
//! bouts have no results at all, finished bouts render their outcome as
//! loosely structured label/value runs, and the statistics tables may be
//! absent or partially filled. Extraction is therefore fallback-driven
//! throughout: every labeled value is tried structurally first (the expected
//! adjacent element) and through exactly one label-anchored regex second, and
//! whatever remains unset afterwards is filled with the schema's declared
//! defaults.
//!
//! The statistics column mapping is fixed by table position, read from the
//! first row of each table's `tbody`:
//!
//! | Totals table | col | Significant strikes | col |
//! |--------------|-----|---------------------|-----|
//! | knockdowns | 1 | head | 3 |
//! | significant strikes | 2 | body | 4 |
//! | total strikes | 4 | leg | 5 |
//! | takedowns | 5 | | |
//! | submission attempts | 7 | | |
//! | reversals | 8 | | |
//! | control time | 9 | | |

use crate::config::ScrapeConfig;
use crate::error::Error;
use crate::http::HttpClient;
use crate::merge;
use crate::models::{Event, Fight, FightIndexEntry};
use crate::runner;
use crate::utils::{clean_text, extract_id_from_url};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};

static FIGHT_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.b-fight-details__table").unwrap());
static ANY_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static EVENT_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.b-content__title").unwrap());
static PERSON: Lazy<Selector> = Lazy::new(|| Selector::parse("div.b-fight-details__person").unwrap());
static PERSON_STATUS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.b-fight-details__person-status").unwrap());
static PERSON_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.b-fight-details__person-name").unwrap());
static FIGHT_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.b-fight-details__fight-title").unwrap());
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.b-fight-details__content").unwrap());
static TEXT_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.b-fight-details__text-item").unwrap());
static TEXT_ITEM_FIRST: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i.b-fight-details__text-item_first").unwrap());
static LABEL: Lazy<Selector> = Lazy::new(|| Selector::parse("i.b-fight-details__label").unwrap());
static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static TEXT_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.b-fight-details__text").unwrap());
static TABLE_TEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.b-fight-details__table-text").unwrap());
static COLLAPSE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.b-fight-details__collapse-link_tot").unwrap());

// One regex fallback per labeled field, anchored to the label text.
static METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Method:\s*(.+?)(?:\s+Round:|$)").unwrap());
static ROUND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Round:\s*(\d+)").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Time:\s*(\d+:\d+)").unwrap());
static TIME_FORMAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Time format:\s*(.+?)(?:\s+Referee:|$)").unwrap());
static REFEREE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Referee:\s*(.+)").unwrap());
static DETAILS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Details:\s*(.+)").unwrap());

/// Award icons on the fight title, mapped to their bonus tags.
const BONUS_TAGS: [(&str, &str); 5] = [
    ("belt.png", "BELT"),
    ("ko.png", "KO"),
    ("fight.png", "FIGHT"),
    ("perf.png", "PERF"),
    ("sub.png", "SUB"),
];

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Parse an event page's bout list into index entries.
///
/// `fight_order` is the 1-based row position on the card; rows without the
/// expected cell count or `data-link` are skipped but keep their position.
pub fn parse_event_fights(html: &str, event_id: &str) -> Vec<FightIndexEntry> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&FIGHT_TABLE).next() else {
        return Vec::new();
    };
    let Some(tbody) = table.select(&TBODY).next() else {
        return Vec::new();
    };

    let mut fights = Vec::new();
    for (index, row) in tbody.select(&ROW).enumerate() {
        if row.select(&CELL).count() < 10 {
            continue;
        }
        let fight_id = row
            .value()
            .attr("data-link")
            .map(extract_id_from_url)
            .unwrap_or_default();
        if fight_id.is_empty() {
            continue;
        }
        fights.push(FightIndexEntry {
            event_id: event_id.to_string(),
            fight_id,
            fight_order: index as u32 + 1,
        });
    }
    fights
}

/// Parse a fight-details page into a full bout record.
///
/// Identity fields (`fight_id`, `event_id`, `fight_order`) are only
/// provisional here; the caller merges the record into its index entry,
/// which owns them. An upcoming bout (no results container or no statistics
/// table) short-circuits to the basic identity fields with everything else
/// defaulted; missing post-event data is a normal outcome, not an error.
pub fn parse_fight_details(html: &str) -> Fight {
    let document = Html::parse_document(html);
    let mut fight = Fight::default();

    if let Some(title) = document.select(&EVENT_TITLE).next() {
        if let Some(link) = title.select(&LINK).next() {
            fight.event_id = extract_id_from_url(link.value().attr("href").unwrap_or(""));
        }
    }

    let complete = document.select(&CONTENT).next().is_some()
        && document.select(&ANY_TABLE).next().is_some();

    extract_combatants(&document, &mut fight, complete);
    extract_fight_title(&document, &mut fight);

    if !complete {
        return fight.fill_defaults();
    }

    extract_bout_details(&document, &mut fight);
    extract_totals(&document, &mut fight);
    extract_significant_strikes(&document, &mut fight);
    fight.fill_defaults()
}

/// Combatant names, ids and the declared winner.
///
/// The winner is whichever combatant block's status indicator carries the
/// `green` win marker. On a completed fight with neither block marked the
/// first-listed combatant is provisionally credited, a heuristic that is not
/// guaranteed semantically correct and is logged whenever it fires. The
/// winner's id is resolved by matching the display name back against the two
/// combatants; no match leaves it unset.
fn extract_combatants(document: &Html, fight: &mut Fight, complete: bool) {
    let persons: Vec<ElementRef> = document.select(&PERSON).collect();
    if persons.len() < 2 {
        return;
    }

    let identity = |person: &ElementRef| -> Option<(String, String)> {
        let link = person.select(&PERSON_NAME).next()?.select(&LINK).next()?;
        let name = clean_text(&element_text(link));
        let id = extract_id_from_url(link.value().attr("href").unwrap_or(""));
        Some((name, id))
    };
    if let Some((name, id)) = identity(&persons[0]) {
        fight.red_name = Some(name);
        fight.red_id = Some(id);
    }
    if let Some((name, id)) = identity(&persons[1]) {
        fight.blue_name = Some(name);
        fight.blue_id = Some(id);
    }

    let has_win_marker = |person: &ElementRef| {
        person
            .select(&PERSON_STATUS)
            .next()
            .map(|status| status.value().classes().any(|class| class.contains("green")))
            .unwrap_or(false)
    };

    let winner_name = if has_win_marker(&persons[0]) {
        fight.red_name.clone()
    } else if has_win_marker(&persons[1]) {
        fight.blue_name.clone()
    } else if complete {
        warn!(
            red = ?fight.red_name,
            blue = ?fight.blue_name,
            "No win marker on a completed fight; crediting first-listed combatant"
        );
        fight.red_name.clone()
    } else {
        None
    };

    if let Some(name) = winner_name {
        if fight.red_name.as_deref() == Some(name.as_str()) {
            fight.winner_id = fight.red_id.clone();
        } else if fight.blue_name.as_deref() == Some(name.as_str()) {
            fight.winner_id = fight.blue_id.clone();
        }
    }
}

/// Weight class text and bonus award tags from the fight title element.
fn extract_fight_title(document: &Html, fight: &mut Fight) {
    let Some(title) = document.select(&FIGHT_TITLE).next() else {
        return;
    };

    let text = clean_text(&element_text(title));
    if !text.is_empty() {
        fight.weight_class = Some(text);
    }

    let mut tags = Vec::new();
    for image in title.select(&IMAGE) {
        let src = image.value().attr("src").unwrap_or("").to_lowercase();
        for (suffix, tag) in BONUS_TAGS {
            if src.ends_with(suffix) {
                tags.push(tag.to_string());
            }
        }
    }
    if !tags.is_empty() {
        fight.bonus = Some(tags);
    }
}

/// Method, round, time, time format, referee and the details section.
fn extract_bout_details(document: &Html, fight: &mut Fight) {
    let Some(content) = document.select(&CONTENT).next() else {
        return;
    };

    for item in content
        .select(&TEXT_ITEM_FIRST)
        .chain(content.select(&TEXT_ITEM))
    {
        parse_detail_item(item, fight);
    }

    for section in content.select(&TEXT_SECTION) {
        let Some(label) = section.select(&LABEL).next() else {
            continue;
        };
        if element_text(label).to_lowercase().contains("details") {
            let text = clean_text(&element_text(section));
            if let Some(value) = capture(&DETAILS_RE, &text) {
                fight.details = Some(value);
            }
            break;
        }
    }
}

/// One labeled item: structural extraction first, the field's regex second.
fn parse_detail_item(item: ElementRef, fight: &mut Fight) {
    let Some(label) = item.select(&LABEL).next() else {
        return;
    };
    let label_text = clean_text(&element_text(label))
        .to_lowercase()
        .replace(':', "");
    let full_text = clean_text(&element_text(item));

    match label_text.as_str() {
        "method" => {
            let structural = next_element_sibling(label)
                .filter(|el| el.value().name() == "i")
                .map(|el| clean_text(&element_text(el)))
                .filter(|text| !text.is_empty());
            fight.method = structural.or_else(|| capture(&METHOD_RE, &full_text));
        }
        "round" => {
            let structural = sibling_text(label)
                .filter(|text| !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()));
            fight.round = structural.or_else(|| capture(&ROUND_RE, &full_text));
        }
        "time" => {
            let structural = sibling_text(label).filter(|text| is_clock(text));
            fight.time = structural.or_else(|| capture(&TIME_RE, &full_text));
        }
        "time format" => {
            let structural = sibling_text(label).filter(|text| !text.is_empty());
            fight.time_format = structural.or_else(|| capture(&TIME_FORMAT_RE, &full_text));
        }
        "referee" => {
            let structural = item
                .select(&SPAN)
                .next()
                .map(|span| clean_text(&element_text(span)))
                .filter(|text| !text.is_empty());
            fight.referee = structural.or_else(|| capture(&REFEREE_RE, &full_text));
        }
        _ => {}
    }
}

/// Main statistics from the first row of the totals table's body.
fn extract_totals(document: &Html, fight: &mut Fight) {
    let Some(table) = document.select(&ANY_TABLE).next() else {
        return;
    };
    let Some(tbody) = table.select(&TBODY).next() else {
        return;
    };
    let Some(row) = tbody.select(&ROW).next() else {
        return;
    };
    let cols: Vec<ElementRef> = row.select(&CELL).collect();
    if cols.len() < 10 {
        return;
    }

    fight.kd1 = Some(two_sided_stat(cols[1], 0));
    fight.kd2 = Some(two_sided_stat(cols[1], 1));
    fight.str1 = Some(two_sided_stat(cols[2], 0));
    fight.str2 = Some(two_sided_stat(cols[2], 1));
    fight.total_str1 = Some(two_sided_stat(cols[4], 0));
    fight.total_str2 = Some(two_sided_stat(cols[4], 1));
    fight.td1 = Some(two_sided_stat(cols[5], 0));
    fight.td2 = Some(two_sided_stat(cols[5], 1));
    fight.sub1 = Some(two_sided_stat(cols[7], 0));
    fight.sub2 = Some(two_sided_stat(cols[7], 1));
    fight.rev1 = Some(two_sided_stat(cols[8], 0));
    fight.rev2 = Some(two_sided_stat(cols[8], 1));
    fight.control_time1 = Some(two_sided_stat(cols[9], 0));
    fight.control_time2 = Some(two_sided_stat(cols[9], 1));
}

/// Head/body/leg strike breakdown from the table following the
/// "Significant Strikes" heading.
fn extract_significant_strikes(document: &Html, fight: &mut Fight) {
    let Some(heading) = document
        .select(&COLLAPSE_LINK)
        .find(|p| element_text(*p).contains("Significant Strikes"))
    else {
        return;
    };
    let Some(table) = next_table_after(heading) else {
        return;
    };
    let Some(tbody) = table.select(&TBODY).next() else {
        return;
    };
    let Some(row) = tbody.select(&ROW).next() else {
        return;
    };
    let cols: Vec<ElementRef> = row.select(&CELL).collect();
    if cols.len() < 9 {
        return;
    }

    fight.sig_head1 = Some(two_sided_stat(cols[3], 0));
    fight.sig_head2 = Some(two_sided_stat(cols[3], 1));
    fight.sig_body1 = Some(two_sided_stat(cols[4], 0));
    fight.sig_body2 = Some(two_sided_stat(cols[4], 1));
    fight.sig_leg1 = Some(two_sided_stat(cols[5], 0));
    fight.sig_leg2 = Some(two_sided_stat(cols[5], 1));
}

/// One side of a two-sided statistic cell.
///
/// Two sub-elements map to red/blue by position; a single sub-element belongs
/// to red with blue defaulting to `"0"`; an empty cell defaults both sides.
fn two_sided_stat(cell: ElementRef, side: usize) -> String {
    let values: Vec<String> = cell
        .select(&TABLE_TEXT)
        .map(|p| clean_text(&element_text(p)))
        .collect();
    match values.len() {
        0 => "0".to_string(),
        1 if side == 0 => values[0].clone(),
        1 => "0".to_string(),
        _ => values.get(side).cloned().unwrap_or_else(|| "0".to_string()),
    }
}

/// Text content of everything following `label` inside its parent item.
fn sibling_text(label: ElementRef) -> Option<String> {
    let mut out = String::new();
    for node in label.next_siblings() {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
        } else if let Some(element) = ElementRef::wrap(node) {
            out.extend(element.text());
        }
    }
    let cleaned = clean_text(&out);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn next_element_sibling(element: ElementRef) -> Option<ElementRef> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// First table following `element` in document order.
fn next_table_after<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut current = *element;
    loop {
        for sibling in current.next_siblings() {
            if let Some(el) = ElementRef::wrap(sibling) {
                if el.value().name() == "table" {
                    return Some(el);
                }
                if let Some(table) = el.select(&ANY_TABLE).next() {
                    return Some(table);
                }
            }
        }
        current = current.parent()?;
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|captures| clean_text(&captures[1]))
}

fn is_clock(text: &str) -> bool {
    text.split_once(':')
        .map(|(minutes, seconds)| {
            !minutes.is_empty()
                && !seconds.is_empty()
                && minutes.chars().all(|c| c.is_ascii_digit())
                && seconds.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Scrape the bout lists for the given events into a deduplicated fight
/// index.
///
/// Events run through the index-stable runner with progress reporting; an
/// event failing both attempts is reported and its fights stay out of the
/// index. Revisited pages produce duplicate entries, removed first-seen-wins
/// by `fight_id`.
#[instrument(level = "info", skip_all, fields(events = events.len()))]
pub async fn scrape_fight_index(
    client: &HttpClient,
    config: &ScrapeConfig,
    events: Vec<Event>,
) -> Vec<FightIndexEntry> {
    let fetch = |event: Event, _index: usize| async move {
        let url = config.event_url(&event.event_id);
        let html = client.get_html(&url).await?;
        let fights = parse_event_fights(&html, &event.event_id);
        // Every card lists its bouts, so an empty list means the page did
        // not have a usable shape.
        if fights.is_empty() {
            return Err(Error::Parsing(format!(
                "no bout table on event page {}",
                event.event_id
            )));
        }
        info!(
            event_id = %event.event_id,
            name = %event.name,
            count = fights.len(),
            "Indexed fights for event"
        );
        Ok((event.event_id, fights))
    };

    let (pages, failed) = runner::run_with_retry(
        events,
        config.max_workers,
        fetch,
        |event| event.event_id.clone(),
        |page: &(String, Vec<FightIndexEntry>)| page.0.clone(),
        runner::log_progress("fight index"),
    )
    .await;
    if !failed.is_empty() {
        warn!(event_ids = ?failed, "Events missing from the fight index after retry");
    }

    let all: Vec<FightIndexEntry> = pages.into_iter().flat_map(|(_, fights)| fights).collect();
    let unique = merge::dedupe_by_key(all, |fight| fight.fight_id.clone());
    info!(count = unique.len(), "Total fights extracted (duplicates removed)");
    unique
}

/// Scrape fight-details pages for the given index entries and merge each
/// parsed record into its entry under the protected-field policy.
#[instrument(level = "info", skip_all, fields(fights = entries.len()))]
pub async fn scrape_fight_details(
    client: &HttpClient,
    config: &ScrapeConfig,
    entries: Vec<FightIndexEntry>,
) -> Vec<Fight> {
    let fetch = |entry: FightIndexEntry, _index: usize| async move {
        let url = config.fight_url(&entry.fight_id);
        let html = client.get_html(&url).await?;
        let parsed = parse_fight_details(&html);
        Ok(merge::merge_fight(&entry, parsed))
    };

    let (fights, failed) = runner::run_with_retry(
        entries,
        config.max_workers,
        fetch,
        |entry| entry.fight_id.clone(),
        |fight: &Fight| fight.fight_id.clone(),
        runner::log_progress("fight details"),
    )
    .await;
    if !failed.is_empty() {
        warn!(fight_ids = ?failed, "Fights left out of the dataset after retry");
    }

    info!(count = fights.len(), "Fight details scraped");
    fights
}
