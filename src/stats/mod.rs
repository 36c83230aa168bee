//! Stats module - derived columns and aggregate figures

mod calculator;
pub mod derive;

pub use calculator::{ColumnStats, CostComponent, EmployeeBreakdown, KpiSummary, StatsCalculator};
pub use derive::{DerivationEngine, Derivation, DERIVATIONS};
