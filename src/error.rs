//! Error taxonomy for the scraping pipeline.
//!
//! Page-level failures ([`Error::Scraping`], [`Error::Parsing`]) are caught at
//! the concurrent-runner boundary, logged and dropped from the batch; they
//! never abort a phase. [`Error::Configuration`] and an unreadable phase input
//! file are the only fatal paths.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure fetching a page. Carries the URL so the runner can
    /// log the failing item's identity.
    #[error("failed to fetch {url}: {source}")]
    Scraping {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Structural extraction could not produce a usable record shape.
    #[error("parsing error: {0}")]
    Parsing(String),

    /// A record failed its required-field checks.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid pipeline configuration. Fatal at startup.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
