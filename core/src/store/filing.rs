use super::FilingStore;
use crate::{
    error::FilingResult,
    output::{AncillaryRow, DeletionRow, FileRow, FiledFareColumns},
};
use rusqlite::params;

/// A stored FILE row, as read back for reporting and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInstructionRecord {
    pub seq:          i64,
    pub action:       String,
    pub origin:       String,
    pub destination:  String,
    pub rbd:          String,
    pub channel:      String,
    pub ow_rt:        i64,
    pub baggage:      i64,
    pub product_type: String,
    pub base_fare:    f64,
    pub currency:     String,
    pub filing_date:  String,
    pub total_fare:   f64,
    pub fbc:          String,
    pub dupe_check:   String,
    pub flagged:      bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionRecord {
    pub seq:        i64,
    pub loc1:       String,
    pub loc2:       String,
    pub fare_class: String,
    pub ow_rt:      i64,
    pub amount:     f64,
    pub eff_date:   String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AncillaryRecord {
    pub seq:        i64,
    pub action:     String,
    pub fare_class: String,
    pub new_amount: f64,
    pub eff_date:   String,
}

impl FilingStore {
    // ── FILE ───────────────────────────────────────────────────────

    pub fn insert_file_rows(&self, run_id: &str, rows: &[FileRow]) -> FilingResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO file_instruction (
                run_id, seq, action, origin, destination, rbd, channel, ow_rt, baggage,
                product_type, base_fare, currency, sales, travel, notes, fn, filing_date,
                total_fare, fbc, dupe_check, flagged
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19, ?20, ?21)",
        )?;
        for (seq, r) in rows.iter().enumerate() {
            stmt.execute(params![
                run_id,
                seq as i64 + 1,
                r.action.label(),
                &r.origin,
                &r.destination,
                r.rbd.to_string(),
                &r.channel,
                r.trip.code(),
                r.baggage,
                r.brand.label(),
                r.base_fare,
                r.currency.code(),
                &r.sales,
                &r.travel,
                &r.notes,
                &r.filing_number,
                &r.filing_date,
                r.total_fare,
                &r.fbc,
                r.dupe_check.map(|d| d.label()).unwrap_or(""),
                if r.flagged() { 1i32 } else { 0i32 },
            ])?;
        }
        Ok(())
    }

    pub fn file_instructions(&self, run_id: &str) -> FilingResult<Vec<FileInstructionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, action, origin, destination, rbd, channel, ow_rt, baggage,
                    product_type, base_fare, currency, filing_date, total_fare, fbc,
                    dupe_check, flagged
             FROM file_instruction WHERE run_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(FileInstructionRecord {
                    seq:          row.get(0)?,
                    action:       row.get(1)?,
                    origin:       row.get(2)?,
                    destination:  row.get(3)?,
                    rbd:          row.get(4)?,
                    channel:      row.get(5)?,
                    ow_rt:        row.get(6)?,
                    baggage:      row.get(7)?,
                    product_type: row.get(8)?,
                    base_fare:    row.get(9)?,
                    currency:     row.get(10)?,
                    filing_date:  row.get(11)?,
                    total_fare:   row.get(12)?,
                    fbc:          row.get(13)?,
                    dupe_check:   row.get(14)?,
                    flagged:      row.get::<_, i32>(15)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── DELETE ─────────────────────────────────────────────────────

    pub fn insert_deletions(&self, run_id: &str, rows: &[DeletionRow]) -> FilingResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO fare_deletion (
                run_id, seq, tariff, cxr, nat1, nat2, loc1, loc2, rule, fare_class, ow_rt,
                rtg, fn, cur, amount, eff_date, disc_date, gfsfan
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18)",
        )?;
        for (seq, r) in rows.iter().enumerate() {
            let f: &FiledFareColumns = &r.filed;
            stmt.execute(params![
                run_id,
                seq as i64 + 1,
                &f.tariff,
                &f.cxr,
                &f.nat1,
                &f.nat2,
                &f.loc1,
                &f.loc2,
                &f.rule,
                &f.fare_class,
                f.ow_rt,
                &f.rtg,
                &f.filing_number,
                &f.cur,
                r.amount,
                &f.eff_date,
                &f.disc_date,
                &f.gfsfan,
            ])?;
        }
        Ok(())
    }

    pub fn deletions(&self, run_id: &str) -> FilingResult<Vec<DeletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, loc1, loc2, fare_class, ow_rt, amount, eff_date
             FROM fare_deletion WHERE run_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(DeletionRecord {
                    seq:        row.get(0)?,
                    loc1:       row.get(1)?,
                    loc2:       row.get(2)?,
                    fare_class: row.get(3)?,
                    ow_rt:      row.get(4)?,
                    amount:     row.get(5)?,
                    eff_date:   row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── GH FARE AMENDMENT ──────────────────────────────────────────

    pub fn insert_ancillary(&self, run_id: &str, rows: &[AncillaryRow]) -> FilingResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO ancillary_amendment (
                run_id, seq, action, tariff, cxr, nat1, nat2, loc1, loc2, rule, fare_class,
                ow_rt, rtg, fn, cur, new_amount, eff_date, disc_date, gfsfan
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19)",
        )?;
        for (seq, r) in rows.iter().enumerate() {
            let f = &r.filed;
            stmt.execute(params![
                run_id,
                seq as i64 + 1,
                &r.action,
                &f.tariff,
                &f.cxr,
                &f.nat1,
                &f.nat2,
                &f.loc1,
                &f.loc2,
                &f.rule,
                &f.fare_class,
                f.ow_rt,
                &f.rtg,
                &f.filing_number,
                &f.cur,
                r.new_amount,
                &f.eff_date,
                &f.disc_date,
                &f.gfsfan,
            ])?;
        }
        Ok(())
    }

    pub fn ancillary_amendments(&self, run_id: &str) -> FilingResult<Vec<AncillaryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, action, fare_class, new_amount, eff_date
             FROM ancillary_amendment WHERE run_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(AncillaryRecord {
                    seq:        row.get(0)?,
                    action:     row.get(1)?,
                    fare_class: row.get(2)?,
                    new_amount: row.get(3)?,
                    eff_date:   row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
