//! Filing State Machine: NEW / AMEND / DELETE across the level ladder.
//!
//! Transitions, by filed level F against resolved level N:
//!   F == N  AMEND at F.
//!   F >  N  DELETE every level strictly between them, NEW at N.
//!   F <  N  DELETE F up to N-1, AMEND at N after a near-duplicate check.
//!
//! RULES:
//!   - Levels above 8 are structure levels: never deleted or amended.
//!   - Existing fares are read, never written.
//!   - The COMPLETED annotation only ever grows.

use crate::{
    ancillary::ancillary_amendments,
    error::{FilingError, FilingResult},
    event::FilingEvent,
    fare_level::round_up,
    output::{DeletionRow, FilingAction, FilingOutput},
    reference::ReferenceData,
    status::{self, Completion},
    tables,
    tier_cascade::{price_level, FareAdjuster, LevelQuote, NoAdjustment, RowContext, Tier1Source},
    types::{Brand, Fare, PriceLevel, MAX_FILED_LEVEL},
};
use std::cmp::Ordering;

/// One step of a row's walk along the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStep {
    Delete(PriceLevel),
    FileNew(PriceLevel),
    Amend(PriceLevel),
}

/// Brand order of the DELETE table.
const DELETE_ORDER: [Brand; 5] = [
    Brand::Brand1,
    Brand::Brand2,
    Brand::Brand3,
    Brand::Gds1,
    Brand::Gds2,
];

/// The ordered steps for filed level `filed` and resolved level `new`.
pub fn plan_steps(filed: PriceLevel, new: PriceLevel) -> Vec<LevelStep> {
    match filed.cmp(&new) {
        Ordering::Equal => vec![LevelStep::Amend(new)],
        Ordering::Greater => ((new + 1)..filed)
            .rev()
            .map(LevelStep::Delete)
            .chain(std::iter::once(LevelStep::FileNew(new)))
            .collect(),
        Ordering::Less => (filed..new)
            .map(LevelStep::Delete)
            .chain(std::iter::once(LevelStep::Amend(new)))
            .collect(),
    }
}

/// How an AMEND step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AmendOutcome {
    Filed(LevelQuote),
    SameFare,
    NoExistingFare,
    StructureLevel,
}

/// Bumps a tier by one unit when its rounded base fare equals the base
/// already filed for that brand and class.
struct SameFareNudge<'a> {
    reference: &'a ReferenceData,
    ctx:       &'a RowContext,
}

impl FareAdjuster for SameFareNudge<'_> {
    fn adjust(&self, brand: Brand, rbd: char, fare: Fare) -> Fare {
        let existing_base = self
            .reference
            .existing_fare(
                &self.ctx.route,
                &rbd.to_string(),
                brand,
                self.ctx.trip,
                &self.ctx.filing_number,
            )
            .and_then(|e| e.base_fare);
        if existing_base == Some(fare.base) {
            Fare::new(fare.base + tables::SAME_FARE_NUDGE, fare.total + tables::SAME_FARE_NUDGE)
        } else {
            fare
        }
    }
}

/// Drives one validated row through its level steps.
pub struct FilingStateMachine<'a> {
    row:        usize,
    ctx:        &'a RowContext,
    reference:  &'a ReferenceData,
    output:     &'a mut FilingOutput,
    events:     &'a mut Vec<FilingEvent>,
    completion: Completion,
}

impl<'a> FilingStateMachine<'a> {
    pub fn new(
        row: usize,
        ctx: &'a RowContext,
        reference: &'a ReferenceData,
        output: &'a mut FilingOutput,
        events: &'a mut Vec<FilingEvent>,
    ) -> Self {
        Self { row, ctx, reference, output, events, completion: Completion::new() }
    }

    /// Run every step for the row and return its COMPLETED annotation.
    pub fn run(mut self) -> FilingResult<Completion> {
        let (filed, new) = (self.ctx.filed_level, self.ctx.new_level);
        let row = self.row;

        for step in plan_steps(filed, new) {
            match step {
                LevelStep::Delete(level) => self.delete_level(level)?,
                LevelStep::FileNew(level) => {
                    let quote = self.file_new(level)?;
                    self.amend_ancillary(&quote);
                    self.completion.mark_done();
                }
                LevelStep::Amend(level) => {
                    let fare = if filed < new {
                        let fare = self.near_duplicate_check(level)?;
                        self.completion.mark_done();
                        fare
                    } else {
                        self.ctx.filed
                    };
                    let outcome = self.amend(level, fare)?;
                    self.finish_amend(level, outcome, filed == new);
                }
            }
        }

        if filed > MAX_FILED_LEVEL || new > MAX_FILED_LEVEL {
            self.completion.note(status::STRUCTURE_RBD);
        }

        log::debug!("row={row} filing: F={filed} N={new} -> {}", self.completion.as_str());
        Ok(self.completion)
    }

    fn class_of(&self, level: PriceLevel) -> FilingResult<char> {
        self.reference
            .fare_levels
            .class_of(level)
            .ok_or_else(|| FilingError::InvalidReference(format!("no fare class for level {level}")))
    }

    /// Snapshot every existing brand filing of `level` into the DELETE table.
    fn delete_level(&mut self, level: PriceLevel) -> FilingResult<()> {
        if level > MAX_FILED_LEVEL {
            return Ok(());
        }
        let rbd = self.class_of(level)?.to_string();
        let row = self.row;
        for brand in DELETE_ORDER {
            let Some(existing) = self.reference.existing_fare(
                &self.ctx.route,
                &rbd,
                brand,
                self.ctx.trip,
                &self.ctx.filing_number,
            ) else {
                continue;
            };
            log::debug!("row={row} filing: DELETE {rbd} {brand} ({})", existing.fare_class);
            self.output.push_deletion(DeletionRow::snapshot(existing));
            self.events.push(FilingEvent::FareDeleted {
                row,
                level,
                brand:      brand.label().to_string(),
                fare_class: existing.fare_class.clone(),
            });
        }
        Ok(())
    }

    /// Re-file the row's own fare as NEW at `level`.
    fn file_new(&mut self, level: PriceLevel) -> FilingResult<LevelQuote> {
        let rbd = self.class_of(level)?;
        let quote = price_level(self.ctx, level, rbd, Tier1Source::Filed(self.ctx.filed), &NoAdjustment)?;
        self.record_level(FilingAction::New, &quote);
        Ok(quote)
    }

    /// Nudge the filed fare when Brand 1 at `level` already sits within
    /// one unit of it.
    fn near_duplicate_check(&mut self, level: PriceLevel) -> FilingResult<Fare> {
        let rbd = self.class_of(level)?.to_string();
        let fare = self.ctx.filed;
        let existing_base = self
            .reference
            .existing_fare(&self.ctx.route, &rbd, Brand::Brand1, self.ctx.trip, &self.ctx.filing_number)
            .and_then(|e| e.base_fare);

        match existing_base {
            Some(base) if (base - fare.base).abs() <= 1.0 => {
                let nudge = tables::near_duplicate_nudge(self.ctx.currency);
                log::debug!("row={} filing: near-duplicate at {rbd}, nudged by {nudge}", self.row);
                self.events.push(FilingEvent::NearDuplicateNudged { row: self.row, level, nudge });
                Ok(Fare::new(fare.base + nudge, fare.total + nudge))
            }
            _ => Ok(fare),
        }
    }

    /// AMEND all five tiers at `level`, starting Brand 1 from `fare`.
    fn amend(&mut self, level: PriceLevel, fare: Fare) -> FilingResult<AmendOutcome> {
        if level > MAX_FILED_LEVEL {
            return Ok(AmendOutcome::StructureLevel);
        }
        let rbd = self.class_of(level)?;
        let Some(existing) = self.reference.existing_fare(
            &self.ctx.route,
            &rbd.to_string(),
            Brand::Brand1,
            self.ctx.trip,
            &self.ctx.filing_number,
        ) else {
            return Ok(AmendOutcome::NoExistingFare);
        };
        if existing.base_fare == Some(fare.base) {
            return Ok(AmendOutcome::SameFare);
        }

        let adjuster = SameFareNudge { reference: self.reference, ctx: self.ctx };
        let quote = price_level(self.ctx, level, rbd, Tier1Source::Filed(fare), &adjuster)?;
        for tier in &quote.tiers {
            let rounded_base = round_up(tier.computed.base);
            if tier.filed.base != rounded_base {
                log::debug!(
                    "row={} filing: {} same fare as filed, nudged to {}",
                    self.row, tier.brand, tier.filed.base
                );
                self.events.push(FilingEvent::SameFareNudged {
                    row:        self.row,
                    brand:      tier.brand.label().to_string(),
                    base_fare:  tier.filed.base,
                    total_fare: tier.filed.total,
                });
            }
        }
        self.record_level(FilingAction::Amend, &quote);
        Ok(AmendOutcome::Filed(quote))
    }

    fn finish_amend(&mut self, level: PriceLevel, outcome: AmendOutcome, mark_done: bool) {
        let reason = match outcome {
            AmendOutcome::Filed(quote) => {
                if mark_done {
                    self.completion.mark_done();
                }
                self.amend_ancillary(&quote);
                return;
            }
            AmendOutcome::StructureLevel => return,
            AmendOutcome::SameFare => status::SAME_FARE,
            AmendOutcome::NoExistingFare => status::NO_EXISTING_FARE,
        };
        log::debug!("row={} filing: level {level} {reason}", self.row);
        self.completion.note(reason);
        self.events.push(FilingEvent::AmendSkipped {
            row: self.row,
            level,
            reason: reason.to_string(),
        });
    }

    fn record_level(&mut self, action: FilingAction, quote: &LevelQuote) {
        let brand1 = quote.tier(Brand::Brand1).filed;
        log::debug!(
            "row={} filing: {} {} B1 {}/{}",
            self.row, action.label(), quote.rbd, brand1.base, brand1.total
        );
        self.output.push_level(action, self.ctx, quote);
        self.events.push(FilingEvent::LevelFiled {
            row:          self.row,
            action:       action.label().to_string(),
            level:        quote.level,
            brand1_base:  brand1.base,
            brand1_total: brand1.total,
        });
    }

    fn amend_ancillary(&mut self, quote: &LevelQuote) {
        for (brand, gh) in ancillary_amendments(self.ctx, quote, self.reference) {
            log::debug!(
                "row={} ancillary: {brand} {} -> {}",
                self.row, gh.filed.fare_class, gh.new_amount
            );
            self.events.push(FilingEvent::AncillaryAmended {
                row:        self.row,
                brand:      brand.label().to_string(),
                fare_class: gh.filed.fare_class.clone(),
                new_amount: gh.new_amount,
            });
            self.output.push_ancillary(gh);
        }
    }
}
