//! The filing engine: one batch run, row by row.
//!
//! EXECUTION ORDER per input row (fixed, documented, never reordered):
//!   1. Row Validator
//!   2. Baggage for the input class, all five brands
//!   3. Tax components
//!   4. Exchange rate            (missing rate aborts the run)
//!   5. Fare Level Resolver
//!   6. Ticketing fee            (discount table up to level 5)
//!   7. Filing State Machine     (cascade, output rows, GH pass)
//!
//! After the last row: duplicate pass, then persistence.
//!
//! RULES:
//!   - Rows are processed strictly in input order, one at a time.
//!   - Reference data is never mutated during a run.
//!   - Every decision is recorded in the event log.

use crate::{
    config::{BatchHeader, InputBatch, InputRow},
    error::FilingResult,
    event::{EventLogEntry, FilingEvent},
    fare_basis::is_structure_sales,
    fare_level::resolve_level,
    output::FilingOutput,
    reference::{ReferenceData, TaxComponents},
    state_machine::FilingStateMachine,
    status::{Completion, RowFailure, RowSkip},
    store::FilingStore,
    tables::TFEE_DISCOUNT_MAX_LEVEL,
    tier_cascade::RowContext,
    types::{Brand, Fare, RunId, STRUCTURE_LEVEL},
    validation::validate_row,
};
use chrono::NaiveDate;

/// Date stamped on every FILE row of a test run.
pub const TEST_FILING_DATE: (i32, u32, u32) = (2026, 10, 17);

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id:     RunId,
    /// COMPLETED status per input row, in input order.
    pub statuses:   Vec<String>,
    pub output:     FilingOutput,
    /// FILE-table indices flagged by the duplicate pass.
    pub duplicates: Vec<usize>,
}

pub struct FilingEngine {
    pub run_id:      RunId,
    pub reference:   ReferenceData,
    pub filing_date: NaiveDate,
    pub store:       FilingStore,
}

impl FilingEngine {
    pub fn new(
        run_id: RunId,
        reference: ReferenceData,
        filing_date: NaiveDate,
        store: FilingStore,
    ) -> Self {
        Self { run_id, reference, filing_date, store }
    }

    /// Engine over `ReferenceData::default_test()` and a migrated in-memory
    /// store, stamping a fixed filing date.
    pub fn build_test(run_id: RunId) -> FilingResult<Self> {
        let store = FilingStore::in_memory()?;
        store.migrate()?;
        let (y, m, d) = TEST_FILING_DATE;
        let filing_date = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        Ok(Self::new(run_id, ReferenceData::default_test(), filing_date, store))
    }

    /// Process every row of `batch`, then run the duplicate pass and
    /// persist the three output tables and the annotated input rows.
    pub fn process_batch(&mut self, batch: &InputBatch) -> FilingResult<BatchReport> {
        let run_id = self.run_id.clone();
        let header = &batch.header;
        self.store.insert_run(
            &run_id,
            &header.filing_number,
            &self.filing_date.to_string(),
            env!("CARGO_PKG_VERSION"),
        )?;
        log::info!(
            "run={run_id} filing: {} rows, FN {}, sales {:?}",
            batch.rows.len(),
            header.filing_number,
            header.sales
        );
        self.persist_events(&[FilingEvent::RunStarted {
            run_id:        run_id.clone(),
            filing_number: header.filing_number.clone(),
            rows:          batch.rows.len(),
        }])?;

        let mut output = FilingOutput::new(header, self.filing_date);
        let mut statuses = Vec::with_capacity(batch.rows.len());

        for (idx, input) in batch.rows.iter().enumerate() {
            let row = idx + 1;
            let mut events = Vec::new();
            let completion = match self.process_row(row, input, header, &mut output, &mut events) {
                Ok(completion) => completion,
                Err(RowFailure::Skip(skip)) => {
                    log::warn!("row={row} filing: skipped, {skip}");
                    events.push(FilingEvent::RowSkipped { row, reason: skip.to_string() });
                    Completion::skipped(skip)
                }
                Err(RowFailure::Fatal(err)) => {
                    log::error!("row={row} filing: run aborted, {err}");
                    self.persist_events(&events)?;
                    return Err(err);
                }
            };

            log::info!("row={row} filing: {}", completion.as_str());
            events.push(FilingEvent::RowCompleted {
                row,
                status: completion.as_str().to_string(),
            });
            self.persist_events(&events)?;
            statuses.push(completion.as_str().to_string());
        }

        let duplicates = output.mark_duplicates();
        let mut events = Vec::with_capacity(duplicates.len() + 1);
        for &idx in &duplicates {
            let fbc = output.file[idx].fbc.clone();
            log::warn!("run={run_id} output: duplicate fare basis {fbc} at FILE row {}", idx + 1);
            events.push(FilingEvent::DuplicateFareBasis { file_row: idx + 1, fbc });
        }
        events.push(FilingEvent::RunCompleted {
            run_id:         run_id.clone(),
            file_rows:      output.file.len(),
            deletions:      output.deletions.len(),
            ancillary_rows: output.ancillary.len(),
            duplicates:     duplicates.len(),
        });
        self.persist_events(&events)?;

        self.store.insert_file_rows(&run_id, &output.file)?;
        self.store.insert_deletions(&run_id, &output.deletions)?;
        self.store.insert_ancillary(&run_id, &output.ancillary)?;
        for (idx, (input, status)) in batch.rows.iter().zip(&statuses).enumerate() {
            self.store.insert_processed_row(&run_id, idx + 1, input, status)?;
        }

        log::info!(
            "run={run_id} filing: done, {} FILE / {} DELETE / {} GH rows, {} duplicates",
            output.file.len(),
            output.deletions.len(),
            output.ancillary.len(),
            duplicates.len()
        );

        Ok(BatchReport { run_id, statuses, output, duplicates })
    }

    fn process_row(
        &self,
        row: usize,
        input: &InputRow,
        header: &BatchHeader,
        output: &mut FilingOutput,
        events: &mut Vec<FilingEvent>,
    ) -> Result<Completion, RowFailure> {
        let ctx = self.prepare_context(row, input, header, events)?;
        let completion = FilingStateMachine::new(row, &ctx, &self.reference, output, events).run()?;
        Ok(completion)
    }

    /// Steps 1 to 6: everything the state machine needs, or the reason
    /// the row cannot be priced.
    pub fn prepare_context(
        &self,
        row: usize,
        input: &InputRow,
        header: &BatchHeader,
        events: &mut Vec<FilingEvent>,
    ) -> Result<RowContext, RowFailure> {
        let reference = &self.reference;
        let valid = validate_row(input, reference)?;
        let filing_number = header.filing_number.clone();

        let mut baggage = [0u32; 5];
        for brand in Brand::ALL {
            baggage[brand.index()] = reference
                .baggage(&valid.route, valid.rbd, brand, valid.trip, valid.filed_level, &filing_number)
                .ok_or(RowSkip::MissingBaggageData)?;
        }

        let taxes = reference
            .taxes
            .get(&valid.route, valid.trip)
            .and_then(|entry| entry.complete())
            .ok_or(RowSkip::MissingTaxData)?;

        let rate = reference.exchange_rates.to_aed(valid.currency)?;
        let resolution = resolve_level(
            valid.filed_total,
            &taxes,
            rate,
            valid.trip,
            &reference.fare_levels,
        )?;

        let ticketing_fee = if valid.filed_level <= TFEE_DISCOUNT_MAX_LEVEL {
            reference
                .tfee_discounts
                .get(&valid.route)
                .and_then(|d| d.for_trip(valid.trip))
                .ok_or(RowSkip::MissingTicketingFee)?
        } else {
            taxes.ticketing_fee
        };
        let taxes = TaxComponents { ticketing_fee, ..taxes };

        let filed_level = valid.filed_level.min(STRUCTURE_LEVEL);
        log::debug!(
            "row={row} resolver: {} {} AED {} -> {} (F={filed_level} N={})",
            valid.route, valid.rbd, resolution.aed_amount, resolution.class, resolution.level
        );
        events.push(FilingEvent::LevelResolved {
            row,
            filed_level,
            new_level:  resolution.level,
            fare_class: resolution.class.to_string(),
            aed_amount: resolution.aed_amount,
        });

        Ok(RowContext {
            fare_calc_eligible: reference.fare_calc_ods.waives_ticketing_fee(&valid.route),
            structure_sales:    is_structure_sales(&header.sales),
            filed: Fare::new(
                valid.filed_total - taxes.fixed_tax - taxes.fuel,
                valid.filed_total,
            ),
            route:       valid.route,
            trip:        valid.trip,
            currency:    valid.currency,
            filing_number,
            rate,
            taxes,
            baggage,
            filed_level,
            new_level:   resolution.level,
        })
    }

    fn persist_events(&self, events: &[FilingEvent]) -> FilingResult<()> {
        for event in events {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                row:        event.row(),
                component:  event.component().to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }
}
