pub mod ancillary;
pub mod config;
pub mod error;
pub mod event;
pub mod fare_basis;
pub mod fare_level;
pub mod filing_engine;
pub mod output;
pub mod reference;
pub mod state_machine;
pub mod status;
pub mod store;
pub mod tables;
pub mod tier_cascade;
pub mod types;
pub mod validation;
