//! Literal fare tables for this carrier's fare structure.
//!
//! These are data, not logic. Every pricing rule that depends on a
//! threshold or a fixed amount reads it from here.

use crate::types::{Brand, Channel, Currency, PriceLevel, TripType};

/// Amounts below this (AED, base fare incl. fuel surcharge) never resolve.
pub const MIN_FARE_AED: i64 = 50;

/// Ticketing-fee discounts and the GDS 1 waiver apply up to this level.
pub const TFEE_DISCOUNT_MAX_LEVEL: PriceLevel = 5;

/// Origin accepted regardless of the fare-calc OD list.
pub const ALWAYS_ELIGIBLE_ORIGIN: &str = "SLL";

/// Fallback origin-country code for fare-basis codes.
pub const DEFAULT_ORIGIN_COUNTRY: &str = "SA";

/// Sales label that switches fare-basis codes to structure digits.
pub const STRUCTURE_SALES_LABEL: &str = "STRUCTURE";

/// Fare class of the ancillary (GH) filings in the existing-fares table.
pub const ANCILLARY_FARE_CLASS: &str = "GH";

/// An inclusive AED range mapped to a fare class. `high: None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareBand {
    pub low:   i64,
    pub high:  Option<i64>,
    pub class: char,
}

impl FareBand {
    const fn new(low: i64, high: i64, class: char) -> Self {
        Self { low, high: Some(high), class }
    }

    const fn open(low: i64, class: char) -> Self {
        Self { low, high: None, class }
    }

    pub fn contains(&self, amount: i64) -> bool {
        amount >= self.low && self.high.map_or(true, |h| amount <= h)
    }
}

pub static ONE_WAY_BANDS: [FareBand; 16] = [
    FareBand::new(50, 389, 'L'),
    FareBand::new(390, 454, 'Q'),
    FareBand::new(455, 532, 'H'),
    FareBand::new(533, 623, 'K'),
    FareBand::new(624, 714, 'U'),
    FareBand::new(715, 831, 'B'),
    FareBand::new(832, 987, 'R'),
    FareBand::new(988, 1182, 'N'),
    FareBand::new(1183, 1377, 'M'),
    FareBand::new(1378, 1637, 'T'),
    FareBand::new(1638, 1962, 'W'),
    FareBand::new(1963, 2352, 'O'),
    FareBand::new(2353, 2807, 'E'),
    FareBand::new(2808, 3262, 'I'),
    FareBand::new(3263, 3782, 'A'),
    FareBand::open(3783, 'Y'),
];

pub static ROUND_TRIP_BANDS: [FareBand; 16] = [
    FareBand::new(100, 599, 'L'),
    FareBand::new(600, 699, 'Q'),
    FareBand::new(700, 819, 'H'),
    FareBand::new(820, 959, 'K'),
    FareBand::new(960, 1099, 'U'),
    FareBand::new(1100, 1279, 'B'),
    FareBand::new(1280, 1519, 'R'),
    FareBand::new(1520, 1819, 'N'),
    FareBand::new(1820, 2119, 'M'),
    FareBand::new(2120, 2519, 'T'),
    FareBand::new(2520, 3019, 'W'),
    FareBand::new(3020, 3619, 'O'),
    FareBand::new(3620, 4319, 'E'),
    FareBand::new(4320, 5019, 'I'),
    FareBand::new(5020, 5819, 'A'),
    FareBand::open(5820, 'Y'),
];

pub fn fare_bands(trip: TripType) -> &'static [FareBand] {
    trip.pick(&ONE_WAY_BANDS[..], &ROUND_TRIP_BANDS[..])
}

/// Tier-1 AED list price (base fare incl. fuel surcharge) per fare class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListPrice {
    pub class:      char,
    pub one_way:    f64,
    pub round_trip: f64,
}

pub static LIST_PRICES: [ListPrice; 16] = [
    ListPrice { class: 'L', one_way: 325.0,  round_trip: 500.0  },
    ListPrice { class: 'Q', one_way: 390.0,  round_trip: 600.0  },
    ListPrice { class: 'H', one_way: 455.0,  round_trip: 700.0  },
    ListPrice { class: 'K', one_way: 533.0,  round_trip: 820.0  },
    ListPrice { class: 'U', one_way: 624.0,  round_trip: 960.0  },
    ListPrice { class: 'B', one_way: 715.0,  round_trip: 1100.0 },
    ListPrice { class: 'R', one_way: 832.0,  round_trip: 1280.0 },
    ListPrice { class: 'N', one_way: 988.0,  round_trip: 1520.0 },
    ListPrice { class: 'M', one_way: 1183.0, round_trip: 1820.0 },
    ListPrice { class: 'T', one_way: 1378.0, round_trip: 2120.0 },
    ListPrice { class: 'W', one_way: 1638.0, round_trip: 2520.0 },
    ListPrice { class: 'O', one_way: 1963.0, round_trip: 3020.0 },
    ListPrice { class: 'E', one_way: 2353.0, round_trip: 3620.0 },
    ListPrice { class: 'I', one_way: 2808.0, round_trip: 4320.0 },
    ListPrice { class: 'A', one_way: 3263.0, round_trip: 5020.0 },
    ListPrice { class: 'Y', one_way: 3783.0, round_trip: 5820.0 },
];

pub fn list_price_aed(class: char, trip: TripType) -> Option<f64> {
    LIST_PRICES
        .iter()
        .find(|p| p.class == class)
        .map(|p| trip.pick(p.one_way, p.round_trip))
}

/// Markup band keyed on an AED total fare. `up_to_aed: None` catches the rest.
/// Used for the Brand 2 markup and the GDS segment fee alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupBand {
    pub up_to_aed:  Option<f64>,
    pub one_way:    f64,
    pub round_trip: f64,
}

pub static MARKUP_BANDS: [MarkupBand; 5] = [
    MarkupBand { up_to_aed: Some(500.0),  one_way: 20.0, round_trip: 40.0  },
    MarkupBand { up_to_aed: Some(1000.0), one_way: 30.0, round_trip: 60.0  },
    MarkupBand { up_to_aed: Some(1500.0), one_way: 40.0, round_trip: 80.0  },
    MarkupBand { up_to_aed: Some(2000.0), one_way: 50.0, round_trip: 100.0 },
    MarkupBand { up_to_aed: None,         one_way: 80.0, round_trip: 160.0 },
];

/// AED markup for a total fare already converted to AED.
pub fn markup_aed(total_aed: f64, trip: TripType) -> f64 {
    let band = MARKUP_BANDS
        .iter()
        .find(|b| b.up_to_aed.map_or(true, |limit| total_aed <= limit))
        .unwrap_or(&MARKUP_BANDS[MARKUP_BANDS.len() - 1]);
    trip.pick(band.one_way, band.round_trip)
}

/// Brand 3 sits this far (AED) above GDS 1.
pub fn brand3_increment_aed(trip: TripType) -> f64 {
    trip.pick(100.0, 200.0)
}

/// GDS 2 flex percentage: 5% up to level 13, 10% above.
pub fn flex_rate(level: PriceLevel) -> f64 {
    if (1..=13).contains(&level) { 0.05 } else { 0.10 }
}

/// Increment added to a tier base fare to get its GH ancillary fare.
pub fn ancillary_increment(trip: TripType, currency: Currency) -> f64 {
    match (currency.is_low_denomination(), trip) {
        (true, TripType::OneWay)     => 20.0,
        (true, TripType::RoundTrip)  => 40.0,
        (false, TripType::OneWay)    => 2.0,
        (false, TripType::RoundTrip) => 4.0,
    }
}

/// Nudge applied when a moved-up fare lands within one unit of an
/// existing filing.
pub fn near_duplicate_nudge(currency: Currency) -> f64 {
    if currency.is_low_denomination() { 10.0 } else { 1.0 }
}

/// Nudge applied on AMEND when a tier base fare equals the existing one.
pub const SAME_FARE_NUDGE: f64 = 1.0;

static ORIGIN_COUNTRIES: [(&str, &str); 5] = [
    ("BAH", "BH"),
    ("KWI", "KW"),
    ("DOH", "QA"),
    ("MCT", "OM"),
    ("SLL", "OM"),
];

pub fn origin_country(origin: &str) -> &'static str {
    ORIGIN_COUNTRIES
        .iter()
        .find(|(airport, _)| *airport == origin)
        .map(|(_, country)| *country)
        .unwrap_or(DEFAULT_ORIGIN_COUNTRY)
}

/// Airports filed under their city code in the existing-fares table.
static LOCATION_ALIASES: [(&str, &str); 7] = [
    ("SAW", "IST"),
    ("OTP", "BUH"),
    ("BGY", "MIL"),
    ("IKA", "THR"),
    ("GYD", "BAK"),
    ("ESB", "ANK"),
    ("VKO", "MOW"),
];

pub fn filed_location(code: &str) -> &str {
    LOCATION_ALIASES
        .iter()
        .find(|(airport, _)| *airport == code)
        .map(|(_, city)| *city)
        .unwrap_or(code)
}

/// Brand digit of a fare-basis code.
pub fn brand_digit(brand: Brand, structure_sales: bool) -> &'static str {
    if structure_sales {
        match brand {
            Brand::Brand1 => "6",
            Brand::Brand2 | Brand::Gds1 | Brand::Brand3 => "7",
            Brand::Gds2 => "3",
        }
    } else {
        match brand {
            Brand::Brand1 => "6",
            Brand::Brand2 => "7",
            Brand::Brand3 => "8",
            Brand::Gds1   => "P7",
            Brand::Gds2   => "P3",
        }
    }
}

/// Channel digit of a fare-basis code.
pub fn channel_digit(channel: Channel, structure_sales: bool) -> &'static str {
    match (channel, structure_sales) {
        (Channel::Web, true)  => "2",
        (Channel::Web, false) => "5",
        (Channel::Gds, _)     => "1",
    }
}
