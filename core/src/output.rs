//! Output Assembler: the FILE, DELETE and GH FARE AMENDMENT tables.
//!
//! RULES:
//!   - All three tables are append-only for the whole batch.
//!   - The duplicate pass runs once, after the last input row.

use crate::{
    config::BatchHeader,
    reference::ExistingFare,
    tier_cascade::{LevelQuote, RowContext},
    types::{Brand, Currency, FilingNumber, TripType},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const FILE_DATE_FORMAT: &str = "%d-%m-%y";
pub const EXISTING_DATE_FORMAT: &str = "%d/%m/%y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingAction {
    New,
    Amend,
}

impl FilingAction {
    pub fn label(self) -> &'static str {
        match self {
            FilingAction::New   => "NEW",
            FilingAction::Amend => "AMEND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DupeCheck {
    Ok,
    NotOk,
}

impl DupeCheck {
    pub fn label(self) -> &'static str {
        match self {
            DupeCheck::Ok    => "OK",
            DupeCheck::NotOk => "Not OK",
        }
    }
}

/// One row of the FILE table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRow {
    pub action:        FilingAction,
    pub origin:        String,
    pub destination:   String,
    pub rbd:           char,
    pub channel:       String,
    pub trip:          TripType,
    pub baggage:       u32,
    pub brand:         Brand,
    pub base_fare:     f64,
    pub currency:      Currency,
    pub sales:         String,
    pub travel:        String,
    pub notes:         String,
    pub filing_number: FilingNumber,
    pub filing_date:   String,
    pub total_fare:    f64,
    pub fbc:           String,
    /// Set by the duplicate pass.
    pub dupe_check:    Option<DupeCheck>,
}

impl FileRow {
    /// Visually flagged for manual review.
    pub fn flagged(&self) -> bool {
        self.dupe_check == Some(DupeCheck::NotOk)
    }
}

/// Identifying columns shared by the DELETE and GH tables, copied from
/// the existing filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiledFareColumns {
    pub tariff:        String,
    pub cxr:           String,
    pub nat1:          String,
    pub nat2:          String,
    pub loc1:          String,
    pub loc2:          String,
    pub rule:          String,
    pub fare_class:    String,
    pub ow_rt:         u8,
    pub rtg:           String,
    pub filing_number: String,
    pub cur:           String,
    pub eff_date:      String,
    pub disc_date:     String,
    pub gfsfan:        String,
}

impl FiledFareColumns {
    pub fn of(fare: &ExistingFare) -> Self {
        Self {
            tariff:        fare.tariff.clone(),
            cxr:           fare.cxr.clone(),
            nat1:          fare.nat1.clone(),
            nat2:          fare.nat2.clone(),
            loc1:          fare.loc1.clone(),
            loc2:          fare.loc2.clone(),
            rule:          fare.rule.clone(),
            fare_class:    fare.fare_class.clone(),
            ow_rt:         fare.ow_rt,
            rtg:           fare.rtg.clone(),
            filing_number: fare.filing_number.clone(),
            cur:           fare.cur.clone(),
            eff_date:      fare.eff_date.format(EXISTING_DATE_FORMAT).to_string(),
            disc_date:     fare.disc_date.clone(),
            gfsfan:        fare.gfsfan.clone(),
        }
    }
}

/// One row of the DELETE table: a snapshot of the filing being withdrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionRow {
    pub filed:  FiledFareColumns,
    pub amount: f64,
}

impl DeletionRow {
    pub fn snapshot(fare: &ExistingFare) -> Self {
        Self { filed: FiledFareColumns::of(fare), amount: fare.amount }
    }
}

/// One row of the GH FARE AMENDMENT table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillaryRow {
    pub action:     String,
    pub filed:      FiledFareColumns,
    pub new_amount: f64,
}

/// The three output tables of one batch.
#[derive(Debug, Clone)]
pub struct FilingOutput {
    sales:           String,
    travel:          String,
    filing_date:     String,
    pub file:        Vec<FileRow>,
    pub deletions:   Vec<DeletionRow>,
    pub ancillary:   Vec<AncillaryRow>,
}

impl FilingOutput {
    pub fn new(header: &BatchHeader, filing_date: NaiveDate) -> Self {
        Self {
            sales:       header.sales.clone(),
            travel:      header.travel.clone(),
            filing_date: filing_date.format(FILE_DATE_FORMAT).to_string(),
            file:        Vec::new(),
            deletions:   Vec::new(),
            ancillary:   Vec::new(),
        }
    }

    /// Append one FILE row per tier of `quote`, in cascade order.
    pub fn push_level(&mut self, action: FilingAction, ctx: &RowContext, quote: &LevelQuote) {
        for tier in &quote.tiers {
            self.file.push(FileRow {
                action,
                origin:        ctx.route.origin.clone(),
                destination:   ctx.route.destination.clone(),
                rbd:           quote.rbd,
                channel:       tier.brand.channel().label().to_string(),
                trip:          ctx.trip,
                baggage:       tier.baggage,
                brand:         tier.brand,
                base_fare:     tier.filed.base,
                currency:      ctx.currency,
                sales:         self.sales.clone(),
                travel:        self.travel.clone(),
                notes:         String::new(),
                filing_number: ctx.filing_number.clone(),
                filing_date:   self.filing_date.clone(),
                total_fare:    tier.filed.total,
                fbc:           tier.fare_basis.clone(),
                dupe_check:    None,
            });
        }
    }

    pub fn push_deletion(&mut self, row: DeletionRow) {
        self.deletions.push(row);
    }

    pub fn push_ancillary(&mut self, row: AncillaryRow) {
        self.ancillary.push(row);
    }

    /// Run the duplicate pass over the FILE table. Returns the flagged rows'
    /// indices.
    pub fn mark_duplicates(&mut self) -> Vec<usize> {
        mark_duplicates(&mut self.file)
    }
}

/// First occurrence of a fare-basis code is "OK", every repeat "Not OK".
pub fn mark_duplicates(rows: &mut [FileRow]) -> Vec<usize> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut flagged = Vec::new();
    for (idx, row) in rows.iter_mut().enumerate() {
        if seen.insert(row.fbc.clone()) {
            row.dupe_check = Some(DupeCheck::Ok);
        } else {
            row.dupe_check = Some(DupeCheck::NotOk);
            flagged.push(idx);
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fbc: &str) -> FileRow {
        FileRow {
            action:        FilingAction::New,
            origin:        "DOH".into(),
            destination:   "DXB".into(),
            rbd:           'H',
            channel:       "WEB".into(),
            trip:          TripType::OneWay,
            baggage:       20,
            brand:         Brand::Brand2,
            base_fare:     500.0,
            currency:      Currency::QAR,
            sales:         "WEB SALES".into(),
            travel:        "ALL YEAR".into(),
            notes:         String::new(),
            filing_number: "F1".into(),
            filing_date:   "17-10-26".into(),
            total_fare:    580.0,
            fbc:           fbc.into(),
            dupe_check:    None,
        }
    }

    #[test]
    fn second_occurrence_is_flagged() {
        let mut rows = vec![row("A-F1"), row("B-F1"), row("A-F1")];
        let flagged = mark_duplicates(&mut rows);
        assert_eq!(flagged, vec![2]);
        assert_eq!(rows[0].dupe_check, Some(DupeCheck::Ok));
        assert_eq!(rows[1].dupe_check, Some(DupeCheck::Ok));
        assert_eq!(rows[2].dupe_check, Some(DupeCheck::NotOk));
        assert!(rows[2].flagged());
        assert!(!rows[0].flagged());
    }

    #[test]
    fn distinct_codes_are_all_ok() {
        let mut rows = vec![row("A-F1"), row("B-F1"), row("C-F1")];
        assert!(mark_duplicates(&mut rows).is_empty());
        assert!(rows.iter().all(|r| r.dupe_check == Some(DupeCheck::Ok)));
    }

    #[test]
    fn every_repeat_after_the_first_is_flagged() {
        let mut rows = vec![row("A-F1"), row("A-F1"), row("A-F1")];
        assert_eq!(mark_duplicates(&mut rows), vec![1, 2]);
        assert_eq!(DupeCheck::NotOk.label(), "Not OK");
    }

    #[test]
    fn filing_date_uses_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let out = FilingOutput::new(&BatchHeader::default_test(), date);
        assert_eq!(out.filing_date, "17-10-26");
    }
}
