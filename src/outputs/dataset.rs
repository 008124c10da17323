//! CSV save/load for the tabular datasets.
//!
//! Columns come from the record struct's field order (see `models`), so a
//! dataset's schema is stable across writes and the fights column order is
//! preserved bit-for-bit. Missing values serialize as empty strings. Both
//! operations are idempotent: saving overwrites the whole file, loading
//! never mutates it.

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Write a full dataset to `path`, creating parent directories as needed.
///
/// An empty dataset is skipped (nothing to declare a schema from), which
/// also keeps the previous snapshot intact.
pub fn save_dataset<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    if records.is_empty() {
        warn!(path = %path.display(), "No records to save; skipping write");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(count = records.len(), path = %path.display(), "Wrote dataset");
    Ok(())
}

/// Load a dataset written by [`save_dataset`].
///
/// # Errors
///
/// An unreadable or malformed file is an error: a phase cannot run without
/// its input snapshot, so this is the fatal path for the phase.
pub fn load_dataset<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<core::result::Result<Vec<T>, csv::Error>>()?;
    info!(count = records.len(), path = %path.display(), "Loaded dataset");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FightIndexEntry;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ufc_stats_{}_{name}", std::process::id()))
    }

    fn sample_index() -> Vec<FightIndexEntry> {
        vec![
            FightIndexEntry {
                event_id: "e1".to_string(),
                fight_id: "f1".to_string(),
                fight_order: 1,
            },
            FightIndexEntry {
                event_id: "e1".to_string(),
                fight_id: "f2".to_string(),
                fight_order: 2,
            },
        ]
    }

    #[test]
    fn test_save_load_round_trip() {
        let path = temp_path("round_trip.csv");
        save_dataset(&sample_index(), &path).unwrap();
        let loaded: Vec<FightIndexEntry> = load_dataset(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].fight_id, "f1");
        assert_eq!(loaded[1].fight_order, 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_is_idempotent() {
        let path = temp_path("idempotent.csv");
        save_dataset(&sample_index(), &path).unwrap();
        save_dataset(&sample_index(), &path).unwrap();
        let loaded: Vec<FightIndexEntry> = load_dataset(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_empty_dataset_skips_write() {
        let path = temp_path("empty.csv");
        let records: Vec<FightIndexEntry> = Vec::new();
        save_dataset(&records, &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let missing = temp_path("does_not_exist.csv");
        assert!(load_dataset::<FightIndexEntry>(&missing).is_err());
    }
}
