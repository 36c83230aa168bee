//! Derivation Engine Module
//! Fills in derived financial columns missing from the source sheet.
//!
//! The derived columns form a small fixed DAG; [`DERIVATIONS`] lists its nodes
//! in dependency order and each node fires only when its target column is
//! absent and all of its input columns are present.

use crate::data::{CanonicalColumn, Cell, EmployeeRecord, RecordSet};
use tracing::debug;

/// Ratio at or above which an employee counts as efficient.
pub const EFFICIENCY_THRESHOLD: f64 = 1.0;

pub const BAND_EFFICIENT: &str = "Efficient";
pub const BAND_NOT_EFFICIENT: &str = "Not Efficient";

/// Computes one column for all records, or `None` to leave it absent.
type DeriveFn = fn(&[EmployeeRecord]) -> Option<Vec<Cell>>;

/// A node of the derivation graph.
pub struct Derivation {
    pub target: CanonicalColumn,
    pub inputs: &'static [CanonicalColumn],
    compute: DeriveFn,
}

const COST_COMPONENTS: &[CanonicalColumn] = &[
    CanonicalColumn::AnnualSalary,
    CanonicalColumn::OverheadCostPerYear,
    CanonicalColumn::TaxPensionPerYear,
];

/// Derivation nodes in dependency order.
pub const DERIVATIONS: &[Derivation] = &[
    Derivation {
        target: CanonicalColumn::TotalCostPerEmployee,
        inputs: COST_COMPONENTS,
        compute: total_cost,
    },
    Derivation {
        target: CanonicalColumn::ProfitPerEmployee,
        inputs: &[
            CanonicalColumn::RevenuePerEmployee,
            CanonicalColumn::TotalCostPerEmployee,
        ],
        compute: profit,
    },
    Derivation {
        target: CanonicalColumn::EfficiencyRatio,
        inputs: &[
            CanonicalColumn::ProfitPerEmployee,
            CanonicalColumn::TotalCostPerEmployee,
        ],
        compute: efficiency_ratio,
    },
    Derivation {
        target: CanonicalColumn::EfficiencyBand,
        inputs: &[CanonicalColumn::EfficiencyRatio],
        compute: efficiency_band,
    },
    Derivation {
        target: CanonicalColumn::ContributionToProfitPercent,
        inputs: &[CanonicalColumn::ProfitPerEmployee],
        compute: contribution,
    },
];

fn number_cell(value: Option<f64>) -> Cell {
    value.filter(|v| v.is_finite()).map_or(Cell::Empty, Cell::Number)
}

/// Row sum of the cost components; missing components count as zero.
fn total_cost(records: &[EmployeeRecord]) -> Option<Vec<Cell>> {
    Some(
        records
            .iter()
            .map(|r| {
                let sum: f64 = COST_COMPONENTS.iter().filter_map(|c| r.number(*c)).sum();
                Cell::Number(sum)
            })
            .collect(),
    )
}

fn profit(records: &[EmployeeRecord]) -> Option<Vec<Cell>> {
    Some(
        records
            .iter()
            .map(|r| {
                let revenue = r.number(CanonicalColumn::RevenuePerEmployee);
                let cost = r.number(CanonicalColumn::TotalCostPerEmployee);
                number_cell(revenue.zip(cost).map(|(rev, cost)| rev - cost))
            })
            .collect(),
    )
}

/// Profit over total cost; zero cost gives a missing ratio.
fn efficiency_ratio(records: &[EmployeeRecord]) -> Option<Vec<Cell>> {
    Some(
        records
            .iter()
            .map(|r| {
                let profit = r.number(CanonicalColumn::ProfitPerEmployee);
                let cost = r
                    .number(CanonicalColumn::TotalCostPerEmployee)
                    .filter(|c| *c != 0.0);
                number_cell(profit.zip(cost).map(|(p, c)| p / c))
            })
            .collect(),
    )
}

fn efficiency_band(records: &[EmployeeRecord]) -> Option<Vec<Cell>> {
    Some(
        records
            .iter()
            .map(|r| match r.number(CanonicalColumn::EfficiencyRatio) {
                Some(ratio) if ratio >= EFFICIENCY_THRESHOLD => Cell::text(BAND_EFFICIENT),
                Some(_) => Cell::text(BAND_NOT_EFFICIENT),
                None => Cell::Empty,
            })
            .collect(),
    )
}

/// Each row's share of the summed profit; left absent when the sum is zero.
fn contribution(records: &[EmployeeRecord]) -> Option<Vec<Cell>> {
    let total: f64 = records
        .iter()
        .filter_map(|r| r.number(CanonicalColumn::ProfitPerEmployee))
        .sum();

    if total == 0.0 || !total.is_finite() {
        return None;
    }

    Some(
        records
            .iter()
            .map(|r| {
                number_cell(
                    r.number(CanonicalColumn::ProfitPerEmployee)
                        .map(|p| p / total * 100.0),
                )
            })
            .collect(),
    )
}

/// Applies [`DERIVATIONS`] to a record set.
pub struct DerivationEngine;

impl DerivationEngine {
    /// Return a copy of `records` with every derivable column filled in.
    /// Running it on its own output changes nothing.
    pub fn derive(records: &RecordSet) -> RecordSet {
        let mut current = records.clone();

        for node in DERIVATIONS {
            if current.has_column(node.target) {
                continue;
            }
            if !node.inputs.iter().all(|c| current.has_column(*c)) {
                debug!(target_column = %node.target, "inputs absent, not derived");
                continue;
            }

            match (node.compute)(current.records()) {
                Some(cells) => {
                    debug!(target_column = %node.target, rows = cells.len(), "column derived");
                    current = current.with_column(node.target, cells);
                }
                None => {
                    debug!(target_column = %node.target, "derivation declined, column left absent");
                }
            }
        }

        current
    }
}

/// Whether a band label, derived or from the source sheet, means efficient.
pub fn is_efficient_band(label: &str) -> bool {
    let label = label.trim();
    label.eq_ignore_ascii_case(BAND_EFFICIENT) || label.eq_ignore_ascii_case("efisien")
}
