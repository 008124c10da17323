//! Data models for the scraped entities.
//!
//! This module defines the records flowing through the pipeline:
//! - [`Fighter`]: one athlete row from the letter index, later enriched with
//!   a [`FighterDetails`] block
//! - [`Event`]: one card from the completed/upcoming listings
//! - [`FightIndexEntry`]: the minimal (event, fight, order) triple scraped
//!   from an event page
//! - [`Fight`]: the full bout record assembled from a fight-details page
//!
//! Serialization order matters: the CSV column set of each dataset is the
//! struct's field declaration order, and the fights dataset's order is fixed
//! and preserved bit-for-bit on write. Heuristically extracted fields use
//! `Option<String>` as the "unset" sentinel until the default-fill pass runs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One fighter row.
///
/// Created by the Fighters phase from the letter index, then re-created with
/// the detail block populated by the FighterDetails phase. `belt` is true for
/// current title holders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fighter {
    pub fighter_id: String,
    pub first: Option<String>,
    pub last: Option<String>,
    pub nickname: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub reach: Option<String>,
    pub stance: Option<String>,
    pub wins: Option<String>,
    pub defeats: Option<String>,
    pub draws: Option<String>,
    pub belt: bool,

    // Detail block, populated by the FighterDetails phase
    pub dob: Option<String>,
    pub slpm: Option<String>,
    pub str_acc: Option<String>,
    pub sapm: Option<String>,
    pub str_def: Option<String>,
    pub td_avg: Option<String>,
    pub td_acc: Option<String>,
    pub td_def: Option<String>,
    pub sub_avg: Option<String>,
}

/// Date of birth plus the seven career performance ratios scraped from a
/// fighter's detail page.
#[derive(Debug, Clone, Default)]
pub struct FighterDetails {
    pub dob: Option<String>,
    pub slpm: Option<String>,
    pub str_acc: Option<String>,
    pub sapm: Option<String>,
    pub str_def: Option<String>,
    pub td_avg: Option<String>,
    pub td_acc: Option<String>,
    pub td_def: Option<String>,
    pub sub_avg: Option<String>,
}

impl Fighter {
    /// Produce a new record with the detail block taken from `details`.
    ///
    /// The index record's own fields are untouched; phases never mutate the
    /// snapshot they received.
    pub fn with_details(mut self, details: FighterDetails) -> Fighter {
        self.dob = details.dob;
        self.slpm = details.slpm;
        self.str_acc = details.str_acc;
        self.sapm = details.sapm;
        self.str_def = details.str_def;
        self.td_avg = details.td_avg;
        self.td_acc = details.td_acc;
        self.td_def = details.td_def;
        self.sub_avg = details.sub_avg;
        self
    }
}

/// Whether an event has already taken place or is still on the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Completed,
    Upcoming,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Upcoming => write!(f, "upcoming"),
        }
    }
}

/// One event card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub name: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub status: EventStatus,
}

/// The minimal fight record scraped from an event page.
///
/// `fight_order` is the 1-based position on the card. These three fields are
/// the protected fields of the later merge: the fight-details page is not
/// authoritative for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightIndexEntry {
    pub event_id: String,
    pub fight_id: String,
    pub fight_order: u32,
}

/// A full bout record.
///
/// Field order is the fights dataset's column order; do not reorder.
/// Counter fields hold string counts (`"0"` default), matching the source's
/// own rendering; `bonus` is the list of award tags on the fight title, absent
/// when no award was given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fight {
    pub event_id: String,
    pub fight_id: String,
    pub fight_order: Option<u32>,

    // Combatants (red corner listed first on the page)
    pub red_id: Option<String>,
    pub red_name: Option<String>,
    pub blue_id: Option<String>,
    pub blue_name: Option<String>,
    pub winner_id: Option<String>,

    // Bout outcome metadata
    pub weight_class: Option<String>,
    pub referee: Option<String>,
    pub round: Option<String>,
    pub time: Option<String>,
    pub time_format: Option<String>,
    pub method: Option<String>,
    pub details: Option<String>,
    #[serde(
        serialize_with = "serialize_bonus",
        deserialize_with = "deserialize_bonus"
    )]
    pub bonus: Option<Vec<String>>,

    // Two-sided statistics (1 = red, 2 = blue)
    pub kd1: Option<String>,
    pub kd2: Option<String>,
    pub str1: Option<String>,
    pub str2: Option<String>,
    pub td1: Option<String>,
    pub td2: Option<String>,
    pub sub1: Option<String>,
    pub sub2: Option<String>,
    pub control_time1: Option<String>,
    pub control_time2: Option<String>,
    pub sig_head1: Option<String>,
    pub sig_head2: Option<String>,
    pub sig_body1: Option<String>,
    pub sig_body2: Option<String>,
    pub sig_leg1: Option<String>,
    pub sig_leg2: Option<String>,
    pub total_str1: Option<String>,
    pub total_str2: Option<String>,
    pub pass1: Option<String>,
    pub pass2: Option<String>,
    pub rev1: Option<String>,
    pub rev2: Option<String>,
}

/// Counter fields defaulting to `"0"`.
const NUMERIC_DEFAULT: &str = "0";

impl Fight {
    /// Fill every still-unset field with its declared default.
    ///
    /// Total over the schema: counters get `"0"`, text fields the empty
    /// string, `bonus` stays absent. After this pass a record has no missing
    /// values regardless of how complete the source page was.
    pub fn fill_defaults(mut self) -> Fight {
        for field in [
            &mut self.kd1,
            &mut self.kd2,
            &mut self.str1,
            &mut self.str2,
            &mut self.td1,
            &mut self.td2,
            &mut self.sub1,
            &mut self.sub2,
            &mut self.pass1,
            &mut self.pass2,
            &mut self.rev1,
            &mut self.rev2,
        ] {
            if field.is_none() {
                *field = Some(NUMERIC_DEFAULT.to_string());
            }
        }
        for field in [
            &mut self.red_id,
            &mut self.red_name,
            &mut self.blue_id,
            &mut self.blue_name,
            &mut self.winner_id,
            &mut self.weight_class,
            &mut self.referee,
            &mut self.round,
            &mut self.time,
            &mut self.time_format,
            &mut self.method,
            &mut self.details,
            &mut self.control_time1,
            &mut self.control_time2,
            &mut self.sig_head1,
            &mut self.sig_head2,
            &mut self.sig_body1,
            &mut self.sig_body2,
            &mut self.sig_leg1,
            &mut self.sig_leg2,
            &mut self.total_str1,
            &mut self.total_str2,
        ] {
            if field.is_none() {
                *field = Some(String::new());
            }
        }
        self
    }
}

/// Bonus tags are stored as one `;`-joined CSV cell, empty when absent.
fn serialize_bonus<S: Serializer>(
    bonus: &Option<Vec<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bonus {
        Some(tags) => serializer.serialize_str(&tags.join(";")),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_bonus<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let cell = String::deserialize(deserializer)?;
    if cell.is_empty() {
        Ok(None)
    } else {
        Ok(Some(cell.split(';').map(str::to_string).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_string<T: Serialize>(records: &[T]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_fight_column_order_is_fixed() {
        let out = csv_string(&[Fight::default()]);
        let header = out.lines().next().unwrap();
        assert_eq!(
            header,
            "event_id,fight_id,fight_order,red_id,red_name,blue_id,blue_name,winner_id,\
             weight_class,referee,round,time,time_format,method,details,bonus,\
             kd1,kd2,str1,str2,td1,td2,sub1,sub2,control_time1,control_time2,\
             sig_head1,sig_head2,sig_body1,sig_body2,sig_leg1,sig_leg2,\
             total_str1,total_str2,pass1,pass2,rev1,rev2"
        );
    }

    #[test]
    fn test_fill_defaults_is_total() {
        let fight = Fight {
            event_id: "e1".to_string(),
            fight_id: "f1".to_string(),
            kd1: Some("2".to_string()),
            method: Some("KO/TKO".to_string()),
            ..Fight::default()
        }
        .fill_defaults();

        // Extracted values survive
        assert_eq!(fight.kd1.as_deref(), Some("2"));
        assert_eq!(fight.method.as_deref(), Some("KO/TKO"));
        // Unset counters become "0", unset text becomes ""
        assert_eq!(fight.kd2.as_deref(), Some("0"));
        assert_eq!(fight.sub1.as_deref(), Some("0"));
        assert_eq!(fight.pass2.as_deref(), Some("0"));
        assert_eq!(fight.referee.as_deref(), Some(""));
        assert_eq!(fight.control_time1.as_deref(), Some(""));
        assert_eq!(fight.sig_leg2.as_deref(), Some(""));
        // Bonus stays absent
        assert!(fight.bonus.is_none());
    }

    #[test]
    fn test_missing_values_serialize_as_empty_string() {
        let out = csv_string(&[Fight {
            event_id: "e1".to_string(),
            fight_id: "f1".to_string(),
            ..Fight::default()
        }]);
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("e1,f1,,"));
    }

    #[test]
    fn test_bonus_round_trip() {
        let fight = Fight {
            fight_id: "f1".to_string(),
            bonus: Some(vec!["PERF".to_string(), "BELT".to_string()]),
            ..Fight::default()
        };
        let out = csv_string(&[fight]);
        assert!(out.lines().nth(1).unwrap().contains("PERF;BELT"));

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let parsed: Fight = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(
            parsed.bonus,
            Some(vec!["PERF".to_string(), "BELT".to_string()])
        );
    }

    #[test]
    fn test_fighter_round_trip_with_details() {
        let fighter = Fighter {
            fighter_id: "abc".to_string(),
            first: Some("Jon".to_string()),
            last: Some("Jones".to_string()),
            belt: true,
            ..Fighter::default()
        }
        .with_details(FighterDetails {
            dob: Some("Jul 19, 1987".to_string()),
            slpm: Some("4.29".to_string()),
            ..FighterDetails::default()
        });

        let out = csv_string(&[fighter]);
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let parsed: Fighter = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed.fighter_id, "abc");
        assert!(parsed.belt);
        assert_eq!(parsed.dob.as_deref(), Some("Jul 19, 1987"));
        assert_eq!(parsed.slpm.as_deref(), Some("4.29"));
        assert_eq!(parsed.nickname, None);
    }

    #[test]
    fn test_event_status_round_trip() {
        let events = [
            Event {
                event_id: "e1".to_string(),
                name: "UFC 300".to_string(),
                date: Some("April 13, 2024".to_string()),
                location: Some("Las Vegas, Nevada, USA".to_string()),
                status: EventStatus::Completed,
            },
            Event {
                event_id: "e2".to_string(),
                name: "UFC 999".to_string(),
                date: None,
                location: None,
                status: EventStatus::Upcoming,
            },
        ];
        let out = csv_string(&events);
        assert!(out.contains("completed"));
        assert!(out.contains("upcoming"));

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let parsed: Vec<Event> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(parsed[0].status, EventStatus::Completed);
        assert_eq!(parsed[1].status, EventStatus::Upcoming);
        assert_eq!(EventStatus::Upcoming.to_string(), "upcoming");
    }
}
