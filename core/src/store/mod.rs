//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods: it never executes SQL directly.

use crate::{error::FilingResult, event::EventLogEntry};
use rusqlite::{params, Connection, OptionalExtension};

mod filing;
mod processed;

pub use filing::{AncillaryRecord, DeletionRecord, FileInstructionRecord};
pub use processed::ProcessedRowRecord;

pub struct FilingStore {
    conn: Connection,
}

impl FilingStore {
    /// Open (or create) the output database at `path`.
    pub fn open(path: &str) -> FilingResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; ignore failures elsewhere.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> FilingResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> FilingResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_filing.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        filing_number: &str,
        filing_date: &str,
        version: &str,
    ) -> FilingResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, filing_number, filing_date, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                filing_number,
                filing_date,
                version,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Filing number recorded for a run, if the run exists.
    pub fn run_filing_number(&self, run_id: &str) -> FilingResult<Option<String>> {
        let filing_number = self
            .conn
            .query_row(
                "SELECT filing_number FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(filing_number)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> FilingResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, row_no, component, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.row as i64,
                entry.component,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_row(&self, run_id: &str, row: usize) -> FilingResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, row_no, component, event_type, payload
             FROM event_log WHERE run_id = ?1 AND row_no = ?2
             ORDER BY id ASC",
            params![run_id, row as i64],
        )
    }

    pub fn events_for_run(&self, run_id: &str) -> FilingResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, row_no, component, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
            params![run_id],
        )
    }

    fn query_events(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> FilingResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(args, |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    row:        row.get::<_, i64>(2)? as usize,
                    component:  row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
