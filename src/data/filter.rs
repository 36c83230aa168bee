//! Record Filter Module
//! Caller-driven views over a record set.

use super::columns::CanonicalColumn;
use super::record::{EmployeeRecord, RecordSet};
use crate::stats::derive::is_efficient_band;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum profit applied unless the caller overrides it.
pub const DEFAULT_MIN_PROFIT: f64 = 0.0;

/// Predicates combined with logical AND. The default hides negative profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// Case-insensitive substring of the employee name.
    pub name_contains: Option<String>,
    /// Minimum profit per employee; missing profit compares as 0. `None`
    /// disables the check.
    pub min_profit: Option<f64>,
    /// Keep only records banded as efficient.
    pub efficient_only: bool,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            name_contains: None,
            min_profit: Some(DEFAULT_MIN_PROFIT),
            efficient_only: false,
        }
    }
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn min_profit(mut self, threshold: f64) -> Self {
        self.min_profit = Some(threshold);
        self
    }

    pub fn any_profit(mut self) -> Self {
        self.min_profit = None;
        self
    }

    pub fn efficient_only(mut self, on: bool) -> Self {
        self.efficient_only = on;
        self
    }

    /// Matching records in their original order. The source set is untouched.
    ///
    /// Profit and band predicates are skipped when the set lacks that column.
    pub fn apply(&self, records: &RecordSet) -> RecordSet {
        let needle = self
            .name_contains
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let min_profit = self
            .min_profit
            .filter(|_| records.has_column(CanonicalColumn::ProfitPerEmployee));
        let efficient_only =
            self.efficient_only && records.has_column(CanonicalColumn::EfficiencyBand);

        let view = records.select(|record| {
            needle.as_deref().map_or(true, |n| name_matches(record, n))
                && min_profit.map_or(true, |t| profit_or_zero(record) >= t)
                && (!efficient_only || is_efficient(record))
        });

        debug!(kept = view.len(), total = records.len(), "records filtered");
        view
    }
}

fn name_matches(record: &EmployeeRecord, needle: &str) -> bool {
    record
        .name()
        .is_some_and(|name| name.to_lowercase().contains(needle))
}

fn profit_or_zero(record: &EmployeeRecord) -> f64 {
    record
        .number(CanonicalColumn::ProfitPerEmployee)
        .unwrap_or(0.0)
}

fn is_efficient(record: &EmployeeRecord) -> bool {
    record
        .text(CanonicalColumn::EfficiencyBand)
        .is_some_and(is_efficient_band)
}
