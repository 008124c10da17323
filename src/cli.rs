//! Command-line interface definitions.
//!
//! All scraping parameters can be set from the command line; the base URL
//! can also come from the environment.

use clap::Parser;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Full production run
/// ufc_stats_scraper
///
/// # Fast iteration on a handful of records
/// ufc_stats_scraper --dev --limit 10
///
/// # Slower, wider pool
/// ufc_stats_scraper --max-workers 8 --delay 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory the datasets are written under
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Run in development mode with limited record counts
    #[arg(long)]
    pub dev: bool,

    /// Record-count ceiling applied in development mode
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Maximum concurrently in-flight fetches per phase
    #[arg(long, default_value_t = 5)]
    pub max_workers: usize,

    /// Delay in seconds between sequential batches
    #[arg(long, default_value_t = 3.0)]
    pub delay: f64,

    /// Base address of the stats site
    #[arg(long, env = "UFC_STATS_BASE_URL", default_value = "http://ufcstats.com")]
    pub base_url: String,
}
