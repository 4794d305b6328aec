//! Row outcomes: the skip taxonomy and the COMPLETED annotation.

use crate::error::FilingError;
use thiserror::Error;

/// A condition that excludes one input row from pricing.
/// The Display string is written verbatim into the COMPLETED column.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    #[error("missing input data")]
    MissingInputData,
    #[error("incorrect filed fare")]
    IncorrectFiledFare,
    #[error("restricted route")]
    RestrictedRoute,
    #[error("incorrect origin")]
    IncorrectOrigin,
    #[error("incorrect destination")]
    IncorrectDestination,
    #[error("incorrect trip type")]
    IncorrectTripType,
    #[error("incorrect fare class")]
    IncorrectFareClass,
    #[error("incorrect currency")]
    IncorrectCurrency,
    #[error("missing ATPCO baggage data")]
    MissingBaggageData,
    #[error("missing tax data")]
    MissingTaxData,
    #[error("incorrect total fare")]
    IncorrectTotalFare,
    #[error("missing ticketing-fee data")]
    MissingTicketingFee,
}

/// Why a row stopped: skipped (recorded, batch continues) or fatal
/// (aborts the batch).
#[derive(Debug)]
pub enum RowFailure {
    Skip(RowSkip),
    Fatal(FilingError),
}

impl From<RowSkip> for RowFailure {
    fn from(skip: RowSkip) -> Self {
        RowFailure::Skip(skip)
    }
}

impl From<FilingError> for RowFailure {
    fn from(err: FilingError) -> Self {
        RowFailure::Fatal(err)
    }
}

pub const DONE: &str = "YES";
pub const SAME_FARE: &str = "not amended as same fare";
pub const NO_EXISTING_FARE: &str = "not amended as no existing fare";
pub const STRUCTURE_RBD: &str = "structure RBD";

/// The COMPLETED annotation of one input row.
///
/// Notes accumulate: "YES" joins with a space, everything else with "//".
/// Nothing is ever overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    text: String,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped(reason: RowSkip) -> Self {
        Self { text: reason.to_string() }
    }

    pub fn mark_done(&mut self) {
        self.append(" ", DONE);
    }

    pub fn note(&mut self, note: &str) {
        self.append("//", note);
    }

    fn append(&mut self, separator: &str, note: &str) {
        if !self.text.is_empty() {
            self.text.push_str(separator);
        }
        self.text.push_str(note);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_concatenate_instead_of_overwriting() {
        let mut c = Completion::new();
        c.mark_done();
        c.note(STRUCTURE_RBD);
        assert_eq!(c.as_str(), "YES//structure RBD");
    }

    #[test]
    fn first_note_has_no_separator() {
        let mut c = Completion::new();
        c.note(SAME_FARE);
        assert_eq!(c.as_str(), "not amended as same fare");
    }

    #[test]
    fn skip_reason_is_the_status_string() {
        let c = Completion::skipped(RowSkip::MissingBaggageData);
        assert_eq!(c.as_str(), "missing ATPCO baggage data");
    }
}
