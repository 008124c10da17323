//! Required-field checks and aggregate validation reporting.
//!
//! Validation never halts the pipeline: each phase validates its output,
//! logs the first few offending rows, and reports aggregate statistics. A
//! record that fails its checks still ships; the report exists so bad
//! batches are visible, not so they block.

use crate::error::{Error, Result};
use crate::models::{Event, Fight, Fighter};
use tracing::{info, warn};

/// Aggregate outcome of validating one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl ValidationReport {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64 * 100.0
        }
    }

    pub fn log(&self, label: &str) {
        info!(
            total = self.total,
            valid = self.valid,
            invalid = self.invalid,
            success_rate = format!("{:.1}", self.success_rate()),
            "Validated {label} dataset"
        );
    }
}

/// A fighter needs its id and both name parts.
pub fn validate_fighter(fighter: &Fighter) -> Result<()> {
    if fighter.fighter_id.is_empty() {
        return Err(Error::Validation(
            "fighter missing required field: fighter_id".to_string(),
        ));
    }
    if fighter.first.is_none() || fighter.last.is_none() {
        return Err(Error::Validation(format!(
            "fighter {} missing name information",
            fighter.fighter_id
        )));
    }
    Ok(())
}

pub fn validate_event(event: &Event) -> Result<()> {
    if event.event_id.is_empty() {
        return Err(Error::Validation(
            "event missing required field: event_id".to_string(),
        ));
    }
    if event.name.is_empty() {
        return Err(Error::Validation(format!(
            "event {} missing required field: name",
            event.event_id
        )));
    }
    Ok(())
}

pub fn validate_fight(fight: &Fight) -> Result<()> {
    if fight.event_id.is_empty() {
        return Err(Error::Validation(
            "fight missing required field: event_id".to_string(),
        ));
    }
    if fight.fight_id.is_empty() {
        return Err(Error::Validation(
            "fight missing required field: fight_id".to_string(),
        ));
    }
    Ok(())
}

/// How many offending rows are logged before the rest are summarized.
const MAX_LOGGED_ERRORS: usize = 10;

/// Validate a whole dataset and report aggregate statistics.
pub fn validate_dataset<T>(
    records: &[T],
    validator: impl Fn(&T) -> Result<()>,
) -> ValidationReport {
    let mut valid = 0;
    let mut logged = 0;
    let mut suppressed = 0;
    for (row, record) in records.iter().enumerate() {
        match validator(record) {
            Ok(()) => valid += 1,
            Err(e) => {
                if logged < MAX_LOGGED_ERRORS {
                    warn!(row, error = %e, "Record failed validation");
                    logged += 1;
                } else {
                    suppressed += 1;
                }
            }
        }
    }
    if suppressed > 0 {
        warn!(suppressed, "More validation errors not shown");
    }
    ValidationReport {
        total: records.len(),
        valid,
        invalid: records.len() - valid,
    }
}
