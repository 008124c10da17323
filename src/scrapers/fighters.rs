//! Fighter scraping: the a-z letter index and per-fighter detail pages.
//!
//! The fighter roster is partitioned by last-name initial; one letter page
//! lists every fighter for that letter with their physical measurements and
//! record. The detail page adds date of birth and the career performance
//! ratios. Letter pages are fetched through the unordered runner (the roster
//! is an aggregate, order is irrelevant); detail pages go through the
//! index-stable runner so progress counts line up with the input.

use crate::config::{ALPHABET, ScrapeConfig};
use crate::error::Error;
use crate::http::HttpClient;
use crate::merge;
use crate::models::{Fighter, FighterDetails};
use crate::runner;
use crate::utils::{clean_text, extract_id_from_url, normalize_field};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

static FIGHTERS_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.b-statistics__table").unwrap());
static TABLE_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr.b-statistics__table-row").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static INFO_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.b-list__info-box li").unwrap());
static CAREER_ITEM: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.b-list__info-box_style_middle-width div.b-list__info-box-left li")
        .unwrap()
});
static ITALIC: Lazy<Selector> = Lazy::new(|| Selector::parse("i").unwrap());

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Parse one letter page's fighter table.
///
/// Rows without a profile link are skipped; the fighter id comes from the
/// link's last path segment. Column positions are fixed: first, last,
/// nickname, height, weight, reach, stance, wins, defeats, draws, then the
/// title-holder belt icon.
pub fn parse_fighters_table(html: &str) -> Vec<Fighter> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&FIGHTERS_TABLE).next() else {
        return Vec::new();
    };

    let mut fighters = Vec::new();
    for row in table.select(&TABLE_ROW) {
        let cols: Vec<ElementRef> = row.select(&CELL).collect();
        if cols.is_empty() {
            continue;
        }
        let Some(link) = cols[0].select(&LINK).next() else {
            continue;
        };
        let fighter_id = extract_id_from_url(link.value().attr("href").unwrap_or(""));
        if fighter_id.is_empty() {
            continue;
        }

        let field = |index: usize| {
            cols.get(index)
                .and_then(|col| normalize_field(&element_text(*col)))
        };
        let belt = cols
            .get(10)
            .and_then(|col| col.select(&IMAGE).next())
            .map(|img| img.value().attr("src").unwrap_or("").ends_with("belt.png"))
            .unwrap_or(false);

        fighters.push(Fighter {
            fighter_id,
            first: field(0),
            last: field(1),
            nickname: field(2),
            height: field(3),
            weight: field(4),
            reach: field(5),
            stance: field(6),
            wins: field(7),
            defeats: field(8),
            draws: field(9),
            belt,
            ..Fighter::default()
        });
    }
    fighters
}

/// Parse a fighter's detail page into the detail block.
///
/// DOB lives in one of the info-box lists; the career ratios sit in the
/// middle box's left column, each as a `Label: value` item. Anything absent
/// stays unset.
pub fn parse_fighter_details(html: &str) -> FighterDetails {
    let document = Html::parse_document(html);
    let mut details = FighterDetails::default();

    for item in document.select(&INFO_ITEM) {
        let Some(title) = item.select(&ITALIC).next() else {
            continue;
        };
        if element_text(title).contains("DOB") {
            details.dob = normalize_field(&element_text(item).replace("DOB:", ""));
            break;
        }
    }

    for item in document.select(&CAREER_ITEM) {
        let Some(title) = item.select(&ITALIC).next() else {
            continue;
        };
        let label = clean_text(&element_text(title));
        let value = element_text(item)
            .split_once(':')
            .and_then(|(_, value)| normalize_field(value));

        if label.starts_with("SLpM") {
            details.slpm = value;
        } else if label.starts_with("Str. Acc.") {
            details.str_acc = value;
        } else if label.starts_with("SApM") {
            details.sapm = value;
        } else if label.starts_with("Str. Def") {
            details.str_def = value;
        } else if label.starts_with("TD Avg.") {
            details.td_avg = value;
        } else if label.starts_with("TD Acc.") {
            details.td_acc = value;
        } else if label.starts_with("TD Def.") {
            details.td_def = value;
        } else if label.starts_with("Sub. Avg.") {
            details.sub_avg = value;
        }
    }

    details
}

/// Scrape the full fighter roster across all index letters.
///
/// Letters run through the unordered bounded pool; a letter page that fails
/// both its attempts is reported and its fighters are simply missing from
/// the roster.
#[instrument(level = "info", skip_all)]
pub async fn scrape_fighters(client: &HttpClient, config: &ScrapeConfig) -> Vec<Fighter> {
    let letters: Vec<char> = ALPHABET.to_vec();
    let fetch = |letter: char, _index: usize| async move {
        let url = config.fighters_letter_url(letter);
        let html = client.get_html(&url).await?;
        let fighters = parse_fighters_table(&html);
        info!(%letter, count = fighters.len(), "Indexed fighters for letter");
        Ok((letter, fighters))
    };

    let mut pages = runner::concurrent_map(letters.clone(), config.max_workers, fetch).await;
    let done: HashSet<char> = pages.iter().map(|(letter, _)| *letter).collect();
    let failed: Vec<char> = letters
        .into_iter()
        .filter(|letter| !done.contains(letter))
        .collect();
    if !failed.is_empty() {
        warn!(letters = ?failed, "Retrying failed letter pages once");
        pages.extend(runner::concurrent_map(failed.clone(), config.max_workers, fetch).await);
        let done: HashSet<char> = pages.iter().map(|(letter, _)| *letter).collect();
        let unrecovered: Vec<char> = failed
            .into_iter()
            .filter(|letter| !done.contains(letter))
            .collect();
        if !unrecovered.is_empty() {
            warn!(letters = ?unrecovered, "Letter pages still failing after retry; roster is partial");
        }
    }

    let all: Vec<Fighter> = pages.into_iter().flat_map(|(_, page)| page).collect();
    let fighters = merge::dedupe_by_key(all, |fighter| fighter.fighter_id.clone());
    info!(count = fighters.len(), "Total fighters scraped");
    fighters
}

/// Scrape detail pages for the given fighters and merge the detail block
/// into each record.
///
/// Returns the updated records in input order plus the ids that failed both
/// attempts; those records are absent from the output.
#[instrument(level = "info", skip_all, fields(count = fighters.len()))]
pub async fn scrape_fighter_details(
    client: &HttpClient,
    config: &ScrapeConfig,
    fighters: Vec<Fighter>,
) -> (Vec<Fighter>, Vec<String>) {
    let fetch = |fighter: Fighter, _index: usize| async move {
        if fighter.fighter_id.is_empty() {
            return Err(Error::Validation(
                "fighter record missing fighter_id".to_string(),
            ));
        }
        let url = config.fighter_url(&fighter.fighter_id);
        let html = client.get_html(&url).await?;
        let details = parse_fighter_details(&html);
        Ok(fighter.with_details(details))
    };

    let (updated, failed) = runner::run_with_retry(
        fighters,
        config.max_workers,
        fetch,
        |fighter| fighter.fighter_id.clone(),
        |fighter: &Fighter| fighter.fighter_id.clone(),
        runner::log_progress("fighter details"),
    )
    .await;

    info!(
        updated = updated.len(),
        failed = failed.len(),
        "Fighter details scraped"
    );
    (updated, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER_PAGE: &str = r#"
        <html><body>
        <table class="b-statistics__table">
          <thead><tr class="b-statistics__table-row"><th>First</th></tr></thead>
          <tbody>
            <tr class="b-statistics__table-row">
              <td><a href="http://ufcstats.com/fighter-details/f123">Tom</a></td>
              <td><a href="http://ufcstats.com/fighter-details/f123">Aspinall</a></td>
              <td>--</td>
              <td>6' 5"</td>
              <td>248 lbs.</td>
              <td>78"</td>
              <td>Orthodox</td>
              <td>15</td>
              <td>3</td>
              <td>0</td>
              <td><img src="/wp/belt.png"></td>
            </tr>
            <tr class="b-statistics__table-row">
              <td><a href="http://ufcstats.com/fighter-details/f456">Jon</a></td>
              <td><a href="http://ufcstats.com/fighter-details/f456">Jones</a></td>
              <td>Bones</td>
              <td>6' 4"</td>
              <td>248 lbs.</td>
              <td>84.5"</td>
              <td>Orthodox</td>
              <td>27</td>
              <td>1</td>
              <td>0</td>
              <td></td>
            </tr>
            <tr class="b-statistics__table-row"><td>No link here</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn test_parse_fighters_table() {
        let fighters = parse_fighters_table(LETTER_PAGE);
        assert_eq!(fighters.len(), 2);

        let tom = &fighters[0];
        assert_eq!(tom.fighter_id, "f123");
        assert_eq!(tom.first.as_deref(), Some("Tom"));
        assert_eq!(tom.last.as_deref(), Some("Aspinall"));
        assert_eq!(tom.nickname, None);
        assert_eq!(tom.height.as_deref(), Some("6' 5\""));
        assert_eq!(tom.wins.as_deref(), Some("15"));
        assert!(tom.belt);

        let jon = &fighters[1];
        assert_eq!(jon.nickname.as_deref(), Some("Bones"));
        assert!(!jon.belt);
        // Detail block stays unset until the details phase runs.
        assert_eq!(jon.dob, None);
    }

    #[test]
    fn test_parse_fighters_table_without_table() {
        assert!(parse_fighters_table("<html><body></body></html>").is_empty());
    }

    const DETAIL_PAGE: &str = r#"
        <html><body>
        <div class="b-list__info-box b-list__info-box_style_small-width">
          <ul>
            <li><i class="b-list__info-box-title">Height:</i> 6' 4"</li>
            <li><i class="b-list__info-box-title">DOB:</i> Jul 19, 1987</li>
          </ul>
        </div>
        <div class="b-list__info-box b-list__info-box_style_middle-width js-guide clearfix">
          <div class="b-list__info-box-left">
            <ul>
              <li><i class="b-list__info-box-title">SLpM:</i> 4.29</li>
              <li><i class="b-list__info-box-title">Str. Acc.:</i> 58%</li>
              <li><i class="b-list__info-box-title">SApM:</i> 2.22</li>
              <li><i class="b-list__info-box-title">Str. Def:</i> 64%</li>
              <li><i class="b-list__info-box-title">TD Avg.:</i> 1.85</li>
              <li><i class="b-list__info-box-title">TD Acc.:</i> 47%</li>
              <li><i class="b-list__info-box-title">TD Def.:</i> 95%</li>
              <li><i class="b-list__info-box-title">Sub. Avg.:</i> 0.5</li>
            </ul>
          </div>
        </div>
        </body></html>"#;

    #[test]
    fn test_parse_fighter_details() {
        let details = parse_fighter_details(DETAIL_PAGE);
        assert_eq!(details.dob.as_deref(), Some("Jul 19, 1987"));
        assert_eq!(details.slpm.as_deref(), Some("4.29"));
        assert_eq!(details.str_acc.as_deref(), Some("58%"));
        assert_eq!(details.sapm.as_deref(), Some("2.22"));
        assert_eq!(details.str_def.as_deref(), Some("64%"));
        assert_eq!(details.td_avg.as_deref(), Some("1.85"));
        assert_eq!(details.td_acc.as_deref(), Some("47%"));
        assert_eq!(details.td_def.as_deref(), Some("95%"));
        assert_eq!(details.sub_avg.as_deref(), Some("0.5"));
    }

    #[test]
    fn test_parse_fighter_details_empty_page() {
        let details = parse_fighter_details("<html><body></body></html>");
        assert_eq!(details.dob, None);
        assert_eq!(details.slpm, None);
    }
}
