//! Brand Tier Cascade: five brand/channel prices for one price level.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Brand 1: list price or the row's filed fare
//!   2. Brand 2: Brand 1 total + banded markup
//!   3. GDS 1: Brand 2 + segment fee + ticketing fee (waivable)
//!   4. Brand 3: GDS 1 total + fixed increment
//!   5. GDS 2: Brand 3 + flex percentage + segment fee + ticketing fee
//!
//! RULES:
//!   - Each tier is a pure function of the row context and the
//!     *filed* fares of the tiers before it (rounded up, adjusted).
//!   - Every amount is in filing currency; AED bands are applied by
//!     converting with the row's exchange rate.

use crate::{
    error::{FilingError, FilingResult},
    fare_basis::fare_basis_code,
    fare_level::round_up,
    reference::TaxComponents,
    tables,
    types::{Brand, Currency, Fare, FilingNumber, PriceLevel, Route, TripType},
};

/// Per-row working state, created after validation and discarded at row end.
#[derive(Debug, Clone, PartialEq)]
pub struct RowContext {
    pub route:              Route,
    pub trip:               TripType,
    pub currency:           Currency,
    pub filing_number:      FilingNumber,
    /// Header sales label is "STRUCTURE".
    pub structure_sales:    bool,
    /// AED per unit of `currency`.
    pub rate:               f64,
    /// Ticketing fee already resolved against the discount table.
    pub taxes:              TaxComponents,
    /// OD is on the fare-calc lists: GDS 1 waives the ticketing fee.
    pub fare_calc_eligible: bool,
    /// Allowance per brand, indexed by `Brand::index`.
    pub baggage:            [u32; 5],
    /// The row's own fare: base = B1 − fixed tax − fuel, total = B1.
    pub filed:              Fare,
    /// Filed level, clamped to the structure marker.
    pub filed_level:        PriceLevel,
    pub new_level:          PriceLevel,
}

impl RowContext {
    pub fn to_aed(&self, amount: f64) -> f64 {
        amount * self.rate
    }

    pub fn from_aed(&self, amount_aed: f64) -> f64 {
        amount_aed / self.rate
    }

    /// Fixed tax plus fuel surcharge.
    pub fn taxes_total(&self) -> f64 {
        self.taxes.fixed_tax + self.taxes.fuel
    }

    pub fn baggage_of(&self, brand: Brand) -> u32 {
        self.baggage[brand.index()]
    }

    /// Segment fee of the GDS tiers, banded on Brand 2's AED total.
    pub fn segment_fee(&self, brand2: Fare) -> f64 {
        self.from_aed(tables::markup_aed(self.to_aed(brand2.total), self.trip))
    }
}

/// Where Brand 1's fare comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tier1Source {
    /// The AED list price of the level's fare class.
    ListPrice,
    /// A fare supplied by the caller, normally the row's filed fare.
    Filed(Fare),
}

/// Adjusts a tier's rounded fare before it is filed and fed forward.
pub trait FareAdjuster {
    fn adjust(&self, brand: Brand, rbd: char, fare: Fare) -> Fare;
}

/// Files every tier exactly as computed.
pub struct NoAdjustment;

impl FareAdjuster for NoAdjustment {
    fn adjust(&self, _brand: Brand, _rbd: char, fare: Fare) -> Fare {
        fare
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierQuote {
    pub brand:      Brand,
    /// Fare as computed, before rounding.
    pub computed:   Fare,
    /// Fare as filed: rounded up, then adjusted.
    pub filed:      Fare,
    pub baggage:    u32,
    pub fare_basis: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelQuote {
    pub level: PriceLevel,
    pub rbd:   char,
    /// One quote per brand, in cascade order.
    pub tiers: Vec<TierQuote>,
}

impl LevelQuote {
    pub fn tier(&self, brand: Brand) -> &TierQuote {
        &self.tiers[brand.index()]
    }
}

struct TierInputs<'a> {
    ctx:    &'a RowContext,
    level:  PriceLevel,
    rbd:    char,
    source: Tier1Source,
    /// Filed fares of the tiers already priced.
    prior:  &'a [Fare],
}

struct TierSpec {
    brand: Brand,
    price: fn(&TierInputs) -> FilingResult<Fare>,
}

static TIERS: [TierSpec; 5] = [
    TierSpec { brand: Brand::Brand1, price: price_brand1 },
    TierSpec { brand: Brand::Brand2, price: price_brand2 },
    TierSpec { brand: Brand::Gds1,   price: price_gds1 },
    TierSpec { brand: Brand::Brand3, price: price_brand3 },
    TierSpec { brand: Brand::Gds2,   price: price_gds2 },
];

fn price_brand1(t: &TierInputs) -> FilingResult<Fare> {
    match t.source {
        Tier1Source::Filed(fare) => Ok(fare),
        Tier1Source::ListPrice => {
            let list_aed = tables::list_price_aed(t.rbd, t.ctx.trip).ok_or_else(|| {
                FilingError::InvalidReference(format!("no list price for fare class {}", t.rbd))
            })?;
            let base = t.ctx.from_aed(list_aed) - t.ctx.taxes.fuel;
            Ok(Fare::new(base, base + t.ctx.taxes_total()))
        }
    }
}

fn price_brand2(t: &TierInputs) -> FilingResult<Fare> {
    let brand1 = t.prior[Brand::Brand1.index()];
    let markup = tables::markup_aed(t.ctx.to_aed(brand1.total), t.ctx.trip);
    let total = brand1.total + t.ctx.from_aed(markup);
    Ok(Fare::new(total - t.ctx.taxes_total(), total))
}

fn price_gds1(t: &TierInputs) -> FilingResult<Fare> {
    let brand2 = t.prior[Brand::Brand2.index()];
    let fee = t.ctx.taxes.ticketing_fee;
    let mut base = brand2.base + t.ctx.segment_fee(brand2);
    if t.level <= tables::TFEE_DISCOUNT_MAX_LEVEL && t.ctx.fare_calc_eligible {
        base -= fee;
    }
    Ok(Fare::new(base, base + t.ctx.taxes_total() + fee))
}

fn price_brand3(t: &TierInputs) -> FilingResult<Fare> {
    let gds1 = t.prior[Brand::Gds1.index()];
    let total = gds1.total + t.ctx.from_aed(tables::brand3_increment_aed(t.ctx.trip));
    Ok(Fare::new(total - t.ctx.taxes_total(), total))
}

fn price_gds2(t: &TierInputs) -> FilingResult<Fare> {
    let brand3 = t.prior[Brand::Brand3.index()];
    let segment_fee = t.ctx.segment_fee(t.prior[Brand::Brand2.index()]);
    let flex = tables::flex_rate(t.level) * (brand3.base + t.ctx.taxes.fuel);
    let base = brand3.base + flex + segment_fee;
    Ok(Fare::new(base, base + t.ctx.taxes_total() + t.ctx.taxes.ticketing_fee))
}

/// Price all five tiers of `level` (fare class `rbd`) in cascade order.
pub fn price_level(
    ctx: &RowContext,
    level: PriceLevel,
    rbd: char,
    source: Tier1Source,
    adjuster: &dyn FareAdjuster,
) -> FilingResult<LevelQuote> {
    let mut filed: Vec<Fare> = Vec::with_capacity(TIERS.len());
    let mut tiers = Vec::with_capacity(TIERS.len());

    for spec in &TIERS {
        let computed = (spec.price)(&TierInputs {
            ctx,
            level,
            rbd,
            source,
            prior: &filed,
        })?;
        let rounded = Fare::new(round_up(computed.base), round_up(computed.total));
        let fare = adjuster.adjust(spec.brand, rbd, rounded);
        let baggage = ctx.baggage_of(spec.brand);

        filed.push(fare);
        tiers.push(TierQuote {
            brand: spec.brand,
            computed,
            filed: fare,
            baggage,
            fare_basis: fare_basis_code(
                &ctx.route,
                rbd,
                ctx.trip,
                spec.brand,
                baggage,
                ctx.structure_sales,
                &ctx.filing_number,
            ),
        });
    }

    Ok(LevelQuote { level, rbd, tiers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::FareLevelMap;

    fn context(rate: f64, trip: TripType) -> RowContext {
        RowContext {
            route:              Route::new("DOH", "DXB"),
            trip,
            currency:           Currency::QAR,
            filing_number:      "F1".into(),
            structure_sales:    false,
            rate,
            taxes:              TaxComponents { fixed_tax: 50.0, fuel: 30.0, ticketing_fee: 10.0 },
            fare_calc_eligible: true,
            baggage:            [20, 20, 30, 30, 40],
            filed:              Fare::new(470.0, 550.0),
            filed_level:        3,
            new_level:          3,
        }
    }

    fn totals(quote: &LevelQuote) -> Vec<f64> {
        quote.tiers.iter().map(|t| t.filed.total).collect()
    }

    #[test]
    fn filed_fare_cascade_matches_hand_computation() {
        let ctx = context(1.0, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::Filed(ctx.filed), &NoAdjustment).unwrap();

        let bases: Vec<f64> = q.tiers.iter().map(|t| t.filed.base).collect();
        assert_eq!(bases, vec![470.0, 500.0, 520.0, 630.0, 693.0]);
        assert_eq!(totals(&q), vec![550.0, 580.0, 610.0, 710.0, 783.0]);
    }

    #[test]
    fn tiers_come_out_in_cascade_order() {
        let ctx = context(1.0, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::ListPrice, &NoAdjustment).unwrap();
        let brands: Vec<Brand> = q.tiers.iter().map(|t| t.brand).collect();
        assert_eq!(brands, Brand::ALL.to_vec());
    }

    #[test]
    fn list_price_tier1_strips_fuel_from_list() {
        let ctx = context(1.0, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::ListPrice, &NoAdjustment).unwrap();
        assert_eq!(q.tier(Brand::Brand1).filed, Fare::new(425.0, 505.0));
    }

    #[test]
    fn ticketing_fee_waiver_only_up_to_level_5() {
        let ctx = context(1.0, TripType::OneWay);
        let filed = Tier1Source::Filed(ctx.filed);
        let waived = price_level(&ctx, 5, 'U', filed, &NoAdjustment).unwrap();
        let charged = price_level(&ctx, 6, 'B', filed, &NoAdjustment).unwrap();
        let fee = ctx.taxes.ticketing_fee;
        assert_eq!(
            charged.tier(Brand::Gds1).filed.total - waived.tier(Brand::Gds1).filed.total,
            fee
        );

        let mut ineligible = ctx.clone();
        ineligible.fare_calc_eligible = false;
        let q = price_level(&ineligible, 5, 'U', filed, &NoAdjustment).unwrap();
        assert_eq!(q.tier(Brand::Gds1).filed, charged.tier(Brand::Gds1).filed);
    }

    #[test]
    fn fractional_amounts_are_filed_rounded_up() {
        let ctx = context(3.8, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::ListPrice, &NoAdjustment).unwrap();
        for tier in &q.tiers {
            assert_eq!(tier.filed.base.fract(), 0.0);
            assert_eq!(tier.filed.total.fract(), 0.0);
            assert!(tier.filed.total >= tier.computed.total);
        }
    }

    #[test]
    fn totals_never_decrease_along_the_cascade() {
        let levels = FareLevelMap::standard();
        for trip in [TripType::OneWay, TripType::RoundTrip] {
            for rate in [1.0, 3.8, 10.0] {
                let ctx = context(rate, trip);
                for level in 1..=16u8 {
                    let rbd = levels.class_of(level).unwrap();
                    let q = price_level(&ctx, level, rbd, Tier1Source::ListPrice, &NoAdjustment)
                        .unwrap();
                    let t = totals(&q);
                    assert!(
                        t.windows(2).all(|w| w[0] <= w[1]),
                        "{trip:?} rate {rate} level {level}: {t:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn adjuster_output_feeds_the_next_tier() {
        struct BumpBrand1;
        impl FareAdjuster for BumpBrand1 {
            fn adjust(&self, brand: Brand, _rbd: char, fare: Fare) -> Fare {
                if brand == Brand::Brand1 {
                    Fare::new(fare.base + 1.0, fare.total + 1.0)
                } else {
                    fare
                }
            }
        }
        let ctx = context(1.0, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::Filed(ctx.filed), &BumpBrand1).unwrap();
        assert_eq!(q.tier(Brand::Brand1).filed, Fare::new(471.0, 551.0));
        assert_eq!(q.tier(Brand::Brand2).filed.total, 581.0);
    }

    #[test]
    fn fare_basis_codes_follow_baggage() {
        let ctx = context(1.0, TripType::OneWay);
        let q = price_level(&ctx, 3, 'H', Tier1Source::ListPrice, &NoAdjustment).unwrap();
        assert_eq!(q.tier(Brand::Brand1).fare_basis, "DOHDXBHO6QA5-F1");
        assert_eq!(q.tier(Brand::Gds2).fare_basis, "DOHDXBHOXP3QA1-F1");
    }
}
