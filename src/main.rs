//! # UFC Stats Scraper
//!
//! A scraping pipeline that extracts fighter, event and fight records from
//! the semi-structured HTML of ufcstats.com and assembles them into three
//! tabular CSV datasets.
//!
//! ## Architecture
//!
//! The pipeline runs five strictly sequential phases, each seeding the next:
//! 1. **Fighters**: index every fighter by last-name letter (a-z)
//! 2. **Events**: index completed and upcoming event cards
//! 3. **Fighter details**: enrich each fighter with DOB and career ratios
//! 4. **Fight index**: list every bout per event, deduplicated corpus-wide
//! 5. **Fight details**: extract outcome and statistics for every bout
//!
//! Every phase fans its page fetches out over a bounded worker pool; a page
//! that fails fetch or parse is retried once and then dropped, never aborting
//! the phase.
//!
//! ## Usage
//!
//! ```sh
//! ufc_stats_scraper --data-dir ./data
//! ufc_stats_scraper --dev --limit 10
//! ```

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod http;
mod merge;
mod models;
mod outputs;
mod pipeline;
mod runner;
mod scrapers;
mod utils;
mod validate;

use cli::Cli;
use config::ScrapeConfig;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ufc_stats_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = ScrapeConfig {
        base_url: args.base_url,
        max_workers: args.max_workers,
        delay_seconds: args.delay,
        dev_mode: args.dev,
        dev_limit: args.limit,
        data_dir: args.data_dir,
    };
    config.validate()?;

    // Early check: ensure the data dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        tracing::error!(
            path = %config.data_dir,
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    pipeline::run_full_pipeline(&config).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        "Execution complete"
    );

    Ok(())
}
