//! Shared primitive types used across the filing pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical run identifier.
pub type RunId = String;

/// A canonical price level. 1 is the cheapest fare class.
pub type PriceLevel = u8;

/// Filing number, as printed on every output row.
pub type FilingNumber = String;

/// Levels above this are "structure" fare classes: never deleted or
/// amended, and baggage is looked up without the filing number.
pub const MAX_FILED_LEVEL: PriceLevel = 8;

/// Filed levels above this are clamped to it before the state machine runs.
pub const STRUCTURE_LEVEL: PriceLevel = 9;

/// Fresh run id for a batch run.
pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripType {
    OneWay,
    RoundTrip,
}

impl TripType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TripType::OneWay),
            2 => Some(TripType::RoundTrip),
            _ => None,
        }
    }

    /// The O/R column value: 1 or 2.
    pub fn code(self) -> u8 {
        match self {
            TripType::OneWay    => 1,
            TripType::RoundTrip => 2,
        }
    }

    /// Journey type as keyed in the tax table.
    pub fn journey_type(self) -> &'static str {
        match self {
            TripType::OneWay    => "OW",
            TripType::RoundTrip => "RT",
        }
    }

    /// Trip marker inside a fare-basis code.
    pub fn fbc_marker(self) -> char {
        match self {
            TripType::OneWay    => 'O',
            TripType::RoundTrip => 'R',
        }
    }

    /// Pick the one-way or round-trip value of a pair.
    pub fn pick<T: Copy>(self, one_way: T, round_trip: T) -> T {
        match self {
            TripType::OneWay    => one_way,
            TripType::RoundTrip => round_trip,
        }
    }
}

/// Filing currencies this carrier sells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    BHD,
    KWD,
    QAR,
    SAR,
    OMR,
}

impl Currency {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "BHD" => Some(Currency::BHD),
            "KWD" => Some(Currency::KWD),
            "QAR" => Some(Currency::QAR),
            "SAR" => Some(Currency::SAR),
            "OMR" => Some(Currency::OMR),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::BHD => "BHD",
            Currency::KWD => "KWD",
            Currency::QAR => "QAR",
            Currency::SAR => "SAR",
            Currency::OMR => "OMR",
        }
    }

    /// Key into the exchange-rate table, e.g. "QAR/AED".
    pub fn aed_pair(self) -> String {
        format!("{}/AED", self.code())
    }

    /// QAR and SAR are low-denomination currencies: fixed nudges and
    /// ancillary increments are ten times larger.
    pub fn is_low_denomination(self) -> bool {
        matches!(self, Currency::QAR | Currency::SAR)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Web,
    Gds,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::Web => "WEB",
            Channel::Gds => "GDS",
        }
    }
}

/// The five brand/channel products, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brand {
    Brand1,
    Brand2,
    Gds1,
    Brand3,
    Gds2,
}

impl Brand {
    /// Cascade order. Never reordered: every tier prices off the ones before it.
    pub const ALL: [Brand; 5] = [
        Brand::Brand1,
        Brand::Brand2,
        Brand::Gds1,
        Brand::Brand3,
        Brand::Gds2,
    ];

    /// Brands that may carry a GH ancillary fare.
    pub const ANCILLARY: [Brand; 3] = [Brand::Brand1, Brand::Brand2, Brand::Brand3];

    /// Product-type label, as keyed in the existing-fares table.
    pub fn label(self) -> &'static str {
        match self {
            Brand::Brand1 => "Brand 1",
            Brand::Brand2 => "Brand 2",
            Brand::Gds1   => "GDS 1",
            Brand::Brand3 => "Brand 3",
            Brand::Gds2   => "GDS 2",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Brand::ALL.into_iter().find(|b| b.label() == label.trim())
    }

    pub fn channel(self) -> Channel {
        match self {
            Brand::Gds1 | Brand::Gds2 => Channel::Gds,
            _ => Channel::Web,
        }
    }

    /// 0-based position in the cascade.
    pub fn index(self) -> usize {
        match self {
            Brand::Brand1 => 0,
            Brand::Brand2 => 1,
            Brand::Gds1   => 2,
            Brand::Brand3 => 3,
            Brand::Gds2   => 4,
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An origin/destination pair, as entered on the input sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub origin:      String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { origin: origin.into(), destination: destination.into() }
    }

    /// Concatenated OD key, e.g. "DOHDXB".
    pub fn od(&self) -> String {
        format!("{}{}", self.origin, self.destination)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}

/// A base/total fare pair in filing currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub base:  f64,
    pub total: f64,
}

impl Fare {
    pub fn new(base: f64, total: f64) -> Self {
        Self { base, total }
    }
}
