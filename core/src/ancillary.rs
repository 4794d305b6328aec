//! Ancillary-Fee Amendment Pass: GH fares follow the web brands.
//!
//! Brand 1, Brand 2 and Brand 3 may each carry a "GH" filing on the route.
//! When one exists its amount is re-filed at the brand's new base fare
//! plus a fixed increment. A brand without a GH filing is skipped.

use crate::{
    fare_level::round_up,
    output::{AncillaryRow, FiledFareColumns},
    reference::ReferenceData,
    tables,
    tier_cascade::{LevelQuote, RowContext},
    types::Brand,
};

pub const ACTION_LABEL: &str = "Amend Fare";

/// GH amendment rows for the brands of `quote` that carry a GH filing.
pub fn ancillary_amendments(
    ctx: &RowContext,
    quote: &LevelQuote,
    reference: &ReferenceData,
) -> Vec<(Brand, AncillaryRow)> {
    let increment = tables::ancillary_increment(ctx.trip, ctx.currency);

    Brand::ANCILLARY
        .iter()
        .filter_map(|&brand| {
            let gh = reference.ancillary_fare(&ctx.route, brand, ctx.trip, &ctx.filing_number)?;
            let new_amount = round_up(quote.tier(brand).filed.base + increment);
            Some((
                brand,
                AncillaryRow {
                    action: ACTION_LABEL.to_string(),
                    filed:  FiledFareColumns::of(gh),
                    new_amount,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reference::TaxComponents,
        tier_cascade::{price_level, NoAdjustment, Tier1Source},
        types::{Currency, Fare, Route, TripType},
    };

    fn context(currency: Currency, trip: TripType) -> RowContext {
        RowContext {
            route:              Route::new("DOH", "DXB"),
            trip,
            currency,
            filing_number:      "F1".into(),
            structure_sales:    false,
            rate:               1.0,
            taxes:              TaxComponents { fixed_tax: 50.0, fuel: 30.0, ticketing_fee: 10.0 },
            fare_calc_eligible: true,
            baggage:            [20, 20, 30, 30, 40],
            filed:              Fare::new(470.0, 550.0),
            filed_level:        3,
            new_level:          3,
        }
    }

    #[test]
    fn only_brands_with_gh_filings_are_amended() {
        let reference = ReferenceData::default_test();
        let ctx = context(Currency::QAR, TripType::OneWay);
        let quote = price_level(&ctx, 3, 'H', Tier1Source::Filed(ctx.filed), &NoAdjustment).unwrap();

        let rows = ancillary_amendments(&ctx, &quote, &reference);
        let brands: Vec<Brand> = rows.iter().map(|(b, _)| *b).collect();
        assert_eq!(brands, vec![Brand::Brand1, Brand::Brand2]);
        assert_eq!(rows[0].1.new_amount, 490.0);
        assert_eq!(rows[1].1.new_amount, 520.0);
        assert_eq!(rows[0].1.action, "Amend Fare");
        assert_eq!(rows[0].1.filed.fare_class, "GHO1");
    }

    #[test]
    fn increment_depends_on_currency_denomination() {
        let reference = ReferenceData::default_test();
        let ctx = context(Currency::BHD, TripType::OneWay);
        let quote = price_level(&ctx, 3, 'H', Tier1Source::Filed(ctx.filed), &NoAdjustment).unwrap();
        let rows = ancillary_amendments(&ctx, &quote, &reference);
        assert_eq!(rows[0].1.new_amount, 472.0);
    }

    #[test]
    fn route_without_gh_filings_yields_nothing() {
        let reference = ReferenceData::default_test();
        let mut ctx = context(Currency::QAR, TripType::OneWay);
        ctx.route = Route::new("DOH", "BEY");
        let quote = price_level(&ctx, 3, 'H', Tier1Source::Filed(ctx.filed), &NoAdjustment).unwrap();
        assert!(ancillary_amendments(&ctx, &quote, &reference).is_empty());
    }
}
