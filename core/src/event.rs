//! The filing event log: an audit trail of every decision in a run.
//!
//! RULE: Every NEW / AMEND / DELETE decision, every nudge and every
//! skipped row is recorded as an event and persisted with the run.

use crate::types::{PriceLevel, RunId};
use serde::{Deserialize, Serialize};

/// Every event emitted during a batch run.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilingEvent {
    // ── Run events ─────────────────────────────────
    RunStarted {
        run_id: RunId,
        filing_number: String,
        rows: usize,
    },
    RunCompleted {
        run_id: RunId,
        file_rows: usize,
        deletions: usize,
        ancillary_rows: usize,
        duplicates: usize,
    },

    // ── Row events ─────────────────────────────────
    RowSkipped {
        row: usize,
        reason: String,
    },
    LevelResolved {
        row: usize,
        filed_level: PriceLevel,
        new_level: PriceLevel,
        fare_class: String,
        aed_amount: i64,
    },
    RowCompleted {
        row: usize,
        status: String,
    },

    // ── State machine events ───────────────────────
    FareDeleted {
        row: usize,
        level: PriceLevel,
        brand: String,
        fare_class: String,
    },
    LevelFiled {
        row: usize,
        action: String,
        level: PriceLevel,
        brand1_base: f64,
        brand1_total: f64,
    },
    AmendSkipped {
        row: usize,
        level: PriceLevel,
        reason: String,
    },
    SameFareNudged {
        row: usize,
        brand: String,
        base_fare: f64,
        total_fare: f64,
    },
    NearDuplicateNudged {
        row: usize,
        level: PriceLevel,
        nudge: f64,
    },
    AncillaryAmended {
        row: usize,
        brand: String,
        fare_class: String,
        new_amount: f64,
    },

    // ── Output events ──────────────────────────────
    DuplicateFareBasis {
        file_row: usize,
        fbc: String,
    },
}

impl FilingEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            FilingEvent::RunStarted { .. }          => "run_started",
            FilingEvent::RunCompleted { .. }        => "run_completed",
            FilingEvent::RowSkipped { .. }          => "row_skipped",
            FilingEvent::LevelResolved { .. }       => "level_resolved",
            FilingEvent::RowCompleted { .. }        => "row_completed",
            FilingEvent::FareDeleted { .. }         => "fare_deleted",
            FilingEvent::LevelFiled { .. }          => "level_filed",
            FilingEvent::AmendSkipped { .. }        => "amend_skipped",
            FilingEvent::SameFareNudged { .. }      => "same_fare_nudged",
            FilingEvent::NearDuplicateNudged { .. } => "near_duplicate_nudged",
            FilingEvent::AncillaryAmended { .. }    => "ancillary_amended",
            FilingEvent::DuplicateFareBasis { .. }  => "duplicate_fare_basis",
        }
    }

    /// Input row the event belongs to; 0 for run-level events.
    pub fn row(&self) -> usize {
        match self {
            FilingEvent::RowSkipped { row, .. }
            | FilingEvent::LevelResolved { row, .. }
            | FilingEvent::RowCompleted { row, .. }
            | FilingEvent::FareDeleted { row, .. }
            | FilingEvent::LevelFiled { row, .. }
            | FilingEvent::AmendSkipped { row, .. }
            | FilingEvent::SameFareNudged { row, .. }
            | FilingEvent::NearDuplicateNudged { row, .. }
            | FilingEvent::AncillaryAmended { row, .. } => *row,
            FilingEvent::RunStarted { .. }
            | FilingEvent::RunCompleted { .. }
            | FilingEvent::DuplicateFareBasis { .. } => 0,
        }
    }

    /// Component that emitted the event.
    pub fn component(&self) -> &'static str {
        match self {
            FilingEvent::RunStarted { .. }
            | FilingEvent::RunCompleted { .. }
            | FilingEvent::RowSkipped { .. }
            | FilingEvent::LevelResolved { .. }
            | FilingEvent::RowCompleted { .. } => "engine",
            FilingEvent::AncillaryAmended { .. } => "ancillary",
            FilingEvent::DuplicateFareBasis { .. } => "output",
            _ => "filing",
        }
    }
}

/// A row in the persisted event log.
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub row: usize,
    pub component: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized FilingEvent
}
