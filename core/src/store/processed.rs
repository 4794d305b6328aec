use super::FilingStore;
use crate::{
    config::{Cell, InputRow},
    error::FilingResult,
};
use rusqlite::params;

/// An input row as re-emitted with its COMPLETED status.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRowRecord {
    pub row_no:      usize,
    pub origin:      Option<String>,
    pub destination: Option<String>,
    pub completed:   String,
}

fn cell_text(cell: &Option<Cell>) -> Option<String> {
    cell.as_ref().map(Cell::as_text)
}

impl FilingStore {
    // ── Processed input rows ───────────────────────────────────────

    pub fn insert_processed_row(
        &self,
        run_id: &str,
        row_no: usize,
        row: &InputRow,
        completed: &str,
    ) -> FilingResult<()> {
        self.conn.execute(
            "INSERT INTO processed_row (
                run_id, row_no, origin, destination, ow_rt, rbd, currency, b1, completed
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run_id,
                row_no as i64,
                cell_text(&row.origin),
                cell_text(&row.destination),
                cell_text(&row.trip),
                cell_text(&row.rbd),
                cell_text(&row.currency),
                cell_text(&row.b1),
                completed,
            ],
        )?;
        Ok(())
    }

    pub fn processed_rows(&self, run_id: &str) -> FilingResult<Vec<ProcessedRowRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_no, origin, destination, completed
             FROM processed_row WHERE run_id = ?1 ORDER BY row_no ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(ProcessedRowRecord {
                    row_no:      row.get::<_, i64>(0)? as usize,
                    origin:      row.get(1)?,
                    destination: row.get(2)?,
                    completed:   row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
