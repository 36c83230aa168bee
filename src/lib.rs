//! Manpower Contribution - per-employee cost & profit analysis
//!
//! Turns a spreadsheet extract with a free-form layout into clean employee
//! records with derived cost, profit and efficiency figures.

pub mod config;
pub mod data;
pub mod export;
pub mod stats;

pub use config::PipelineSettings;
pub use data::{CanonicalColumn, DataProcessor, RawGrid, RecordFilter, RecordSet};
pub use stats::{DerivationEngine, StatsCalculator};
