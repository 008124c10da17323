//! Pipeline configuration and URL composition.
//!
//! A single [`ScrapeConfig`] value is built from the CLI at startup, validated
//! once, and passed explicitly into every phase; there is no ambient global
//! state. It carries the bounded-pool size, the inter-batch delay, the
//! development-mode truncation policy, and the base address every entity URL
//! is composed from.

use crate::error::{Error, Result};
use crate::models::EventStatus;
use std::path::PathBuf;
use url::Url;

/// Letters the fighter index is partitioned by.
pub const ALPHABET: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Scraping parameters shared by every phase.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Base address URLs are composed from, e.g. `http://ufcstats.com`.
    pub base_url: String,
    /// Maximum concurrently in-flight fetches per phase.
    pub max_workers: usize,
    /// Fixed delay between sequential batches, in seconds.
    pub delay_seconds: f64,
    /// Truncate record lists for fast iteration.
    pub dev_mode: bool,
    /// Record-count ceiling applied in dev mode.
    pub dev_limit: usize,
    /// Root directory the datasets are written under.
    pub data_dir: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ufcstats.com".to_string(),
            max_workers: 5,
            delay_seconds: 3.0,
            dev_mode: false,
            dev_limit: 20,
            data_dir: "data".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Check the configuration is usable before any phase runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a zero-sized worker pool, a
    /// negative delay, or a base address that does not parse as a URL.
    /// Configuration errors are fatal.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Configuration(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.delay_seconds < 0.0 {
            return Err(Error::Configuration(format!(
                "delay_seconds must be non-negative, got {}",
                self.delay_seconds
            )));
        }
        Url::parse(&self.base_url)
            .map_err(|e| Error::Configuration(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        Ok(())
    }

    /// Truncate a phase's input list under the development-mode ceiling.
    pub fn apply_dev_limit<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.dev_mode && items.len() > self.dev_limit {
            items.truncate(self.dev_limit);
        }
        items
    }

    /// Fighter index page for one letter, all pages flattened.
    pub fn fighters_letter_url(&self, letter: char) -> String {
        format!(
            "{}/statistics/fighters?char={letter}&page=all",
            self.base_url
        )
    }

    /// Event listing page for the given status, all pages flattened.
    pub fn events_url(&self, status: EventStatus) -> String {
        format!("{}/statistics/events/{status}?page=all", self.base_url)
    }

    pub fn event_url(&self, event_id: &str) -> String {
        format!("{}/event-details/{event_id}", self.base_url)
    }

    pub fn fighter_url(&self, fighter_id: &str) -> String {
        format!("{}/fighter-details/{fighter_id}", self.base_url)
    }

    pub fn fight_url(&self, fight_id: &str) -> String {
        format!("{}/fight-details/{fight_id}", self.base_url)
    }

    /// `<data_dir>/raw/raw_fighters.csv`
    pub fn fighters_path(&self) -> PathBuf {
        self.raw_dir().join("raw_fighters.csv")
    }

    /// `<data_dir>/raw/raw_events.csv`
    pub fn events_path(&self) -> PathBuf {
        self.raw_dir().join("raw_events.csv")
    }

    /// `<data_dir>/raw/raw_fights.csv`
    pub fn fights_path(&self) -> PathBuf {
        self.raw_dir().join("raw_fights.csv")
    }

    fn raw_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("raw")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScrapeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ScrapeConfig {
            max_workers: 0,
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = ScrapeConfig {
            base_url: "not a url".to_string(),
            ..ScrapeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_composition() {
        let config = ScrapeConfig::default();
        assert_eq!(
            config.fighters_letter_url('a'),
            "http://ufcstats.com/statistics/fighters?char=a&page=all"
        );
        assert_eq!(
            config.events_url(EventStatus::Completed),
            "http://ufcstats.com/statistics/events/completed?page=all"
        );
        assert_eq!(
            config.fight_url("f1"),
            "http://ufcstats.com/fight-details/f1"
        );
    }

    #[test]
    fn test_dev_limit_truncates_only_in_dev_mode() {
        let mut config = ScrapeConfig::default();
        config.dev_limit = 2;
        assert_eq!(config.apply_dev_limit(vec![1, 2, 3, 4]).len(), 4);
        config.dev_mode = true;
        assert_eq!(config.apply_dev_limit(vec![1, 2, 3, 4]), vec![1, 2]);
    }
}
