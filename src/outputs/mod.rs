//! Dataset persistence.
//!
//! The pipeline's three datasets (fighters, events, fights) are persisted as
//! CSV between phases; each phase loads its input snapshot from the previous
//! phase's file and writes its own output in full, never partially
//! mid-phase.

pub mod dataset;
