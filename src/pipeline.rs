//! The five-phase scraping pipeline.
//!
//! Phases run strictly sequentially, each one gated on the previous:
//!
//! 1. **Fighters**: the a-z letter index into `raw_fighters.csv`
//! 2. **Events**: completed + upcoming listings into `raw_events.csv`
//! 3. **FighterDetails**: per-fighter pages merged back into `raw_fighters.csv`
//! 4. **FightIndex**: per-event bout lists into `raw_fights.csv`
//! 5. **FightDetails**: per-fight pages merged into `raw_fights.csv`
//!
//! Each phase loads its input snapshot from the previous phase's persisted
//! output, truncates it under the dev-mode ceiling, runs its scraper over the
//! bounded pool, validates the result, and persists. There is no cross-phase
//! rollback: a phase that completes with partial failures still advances.
//! The only fatal paths are configuration errors and an unreadable input
//! snapshot.

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{Event, Fighter, FightIndexEntry};
use crate::outputs::dataset;
use crate::scrapers::{events, fighters, fights};
use crate::validate;
use tracing::{info, instrument, warn};

/// Run all five phases in order.
pub async fn run_full_pipeline(config: &ScrapeConfig) -> Result<()> {
    let client = HttpClient::new(config)?;

    info!(
        dev_mode = config.dev_mode,
        max_workers = config.max_workers,
        base_url = %config.base_url,
        "Starting scraping pipeline"
    );

    phase_fighters(config, &client).await?;
    phase_events(config, &client).await?;
    phase_fighter_details(config, &client).await?;
    phase_fight_index(config, &client).await?;
    phase_fight_details(config, &client).await?;

    info!("Pipeline completed");
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn phase_fighters(config: &ScrapeConfig, client: &HttpClient) -> Result<()> {
    info!("PHASE 1: FIGHTERS");
    let roster = fighters::scrape_fighters(client, config).await;
    let roster = config.apply_dev_limit(roster);
    validate::validate_dataset(&roster, validate::validate_fighter).log("fighters");
    dataset::save_dataset(&roster, &config.fighters_path())
}

#[instrument(level = "info", skip_all)]
async fn phase_events(config: &ScrapeConfig, client: &HttpClient) -> Result<()> {
    info!("PHASE 2: EVENTS");
    let listing = events::scrape_events(client, config).await;
    validate::validate_dataset(&listing, validate::validate_event).log("events");
    dataset::save_dataset(&listing, &config.events_path())
}

#[instrument(level = "info", skip_all)]
async fn phase_fighter_details(config: &ScrapeConfig, client: &HttpClient) -> Result<()> {
    info!("PHASE 3: FIGHTER DETAILS");
    let roster: Vec<Fighter> = dataset::load_dataset(&config.fighters_path())?;
    let roster = config.apply_dev_limit(roster);

    let (updated, failed) = fighters::scrape_fighter_details(client, config, roster).await;
    if !failed.is_empty() {
        warn!(fighter_ids = ?failed, "Fighters left without details after retry");
    }
    validate::validate_dataset(&updated, validate::validate_fighter).log("fighters");
    dataset::save_dataset(&updated, &config.fighters_path())
}

#[instrument(level = "info", skip_all)]
async fn phase_fight_index(config: &ScrapeConfig, client: &HttpClient) -> Result<()> {
    info!("PHASE 4: FIGHT INDEX");
    let listing: Vec<Event> = dataset::load_dataset(&config.events_path())?;
    let listing = config.apply_dev_limit(listing);

    let index = fights::scrape_fight_index(client, config, listing).await;
    dataset::save_dataset(&index, &config.fights_path())
}

#[instrument(level = "info", skip_all)]
async fn phase_fight_details(config: &ScrapeConfig, client: &HttpClient) -> Result<()> {
    info!("PHASE 5: FIGHT DETAILS");
    let index: Vec<FightIndexEntry> = dataset::load_dataset(&config.fights_path())?;
    let index = config.apply_dev_limit(index);

    let detailed = fights::scrape_fight_details(client, config, index).await;
    validate::validate_dataset(&detailed, validate::validate_fight).log("fights");
    dataset::save_dataset(&detailed, &config.fights_path())
}
