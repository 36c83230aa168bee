//! Statistics Calculator Module
//! Aggregates over a record set: column statistics, KPI summary, top
//! contributors and per-employee cost breakdowns.

use crate::data::{CanonicalColumn, EmployeeRecord, RecordSet};
use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};
use std::collections::HashSet;

/// Descriptive statistics of one numeric column, missing values skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: CanonicalColumn,
    pub count: usize,
    pub missing: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Headline figures of the dashboard. `None` when the column is absent or has
/// no values to average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_cost: Option<f64>,
    pub total_profit: Option<f64>,
    pub avg_profit: Option<f64>,
    pub avg_efficiency: Option<f64>,
    pub employee_count: usize,
    pub record_count: usize,
}

/// One slice of an employee's cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostComponent {
    pub column: CanonicalColumn,
    pub amount: f64,
    /// Share of the summed components, in percent.
    pub share_percent: f64,
}

/// Detail view of a single employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeBreakdown {
    pub name: String,
    pub components: Vec<CostComponent>,
    pub total_cost: Option<f64>,
    pub revenue: Option<f64>,
    pub profit: Option<f64>,
    pub efficiency_ratio: Option<f64>,
    pub contribution_percent: Option<f64>,
}

const COST_COLUMNS: [CanonicalColumn; 3] = [
    CanonicalColumn::AnnualSalary,
    CanonicalColumn::OverheadCostPerYear,
    CanonicalColumn::TaxPensionPerYear,
];

/// Handles aggregate calculations over records.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Sum of present values; `None` when the column is absent.
    pub fn sum(records: &RecordSet, column: CanonicalColumn) -> Option<f64> {
        records
            .has_column(column)
            .then(|| records.present_numbers(column).iter().sum())
    }

    /// Mean of present values; `None` when absent or nothing is present.
    pub fn mean(records: &RecordSet, column: CanonicalColumn) -> Option<f64> {
        let values = records.present_numbers(column);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().mean())
    }

    /// Compute descriptive statistics for a numeric column.
    pub fn compute_column_stats(records: &RecordSet, column: CanonicalColumn) -> Option<ColumnStats> {
        if !records.has_column(column) || !column.is_numeric() {
            return None;
        }

        let values = records.present_numbers(column);
        let n = values.len();
        let missing = records.len() - n;
        if n == 0 {
            return Some(ColumnStats {
                column,
                count: 0,
                missing,
                sum: 0.0,
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            });
        }

        let sum: f64 = values.iter().sum();
        let std = if n > 1 { values.iter().std_dev() } else { 0.0 };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let median = Data::new(values.clone()).median();

        Some(ColumnStats {
            column,
            count: n,
            missing,
            sum,
            mean: sum / n as f64,
            median,
            std,
            min,
            max,
        })
    }

    /// Statistics for every numeric canonical column present in the set.
    pub fn compute_all_column_stats(records: &RecordSet) -> Vec<ColumnStats> {
        CanonicalColumn::ALL
            .iter()
            .filter_map(|c| Self::compute_column_stats(records, *c))
            .collect()
    }

    pub fn kpi_summary(records: &RecordSet) -> KpiSummary {
        let employee_count = records
            .iter()
            .filter_map(EmployeeRecord::name)
            .map(str::trim)
            .collect::<HashSet<_>>()
            .len();

        KpiSummary {
            total_cost: Self::sum(records, CanonicalColumn::TotalCostPerEmployee),
            total_profit: Self::sum(records, CanonicalColumn::ProfitPerEmployee),
            avg_profit: Self::mean(records, CanonicalColumn::ProfitPerEmployee),
            avg_efficiency: Self::mean(records, CanonicalColumn::EfficiencyRatio),
            employee_count,
            record_count: records.len(),
        }
    }

    /// The `n` highest contributors to profit, best first. Records with a
    /// missing contribution sort last; ties keep source order.
    pub fn top_contributors(records: &RecordSet, n: usize) -> Vec<&EmployeeRecord> {
        if !records.has_column(CanonicalColumn::ContributionToProfitPercent) {
            return Vec::new();
        }

        let mut ranked: Vec<&EmployeeRecord> = records.iter().collect();
        ranked.sort_by(|a, b| {
            let a = a.number(CanonicalColumn::ContributionToProfitPercent);
            let b = b.number(CanonicalColumn::ContributionToProfitPercent);
            match (a, b) {
                (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        ranked.truncate(n);
        ranked
    }

    /// Cost breakdown of the first record named `name` (exact match).
    pub fn employee_breakdown(records: &RecordSet, name: &str) -> Option<EmployeeBreakdown> {
        let record = records.iter().find(|r| r.name() == Some(name))?;

        let present: Vec<(CanonicalColumn, f64)> = COST_COLUMNS
            .iter()
            .filter_map(|c| record.number(*c).map(|v| (*c, v)))
            .collect();
        let component_sum: f64 = present.iter().map(|(_, v)| v).sum();

        let components = present
            .into_iter()
            .map(|(column, amount)| CostComponent {
                column,
                amount,
                share_percent: if component_sum != 0.0 {
                    amount / component_sum * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Some(EmployeeBreakdown {
            name: name.to_string(),
            components,
            total_cost: record.number(CanonicalColumn::TotalCostPerEmployee),
            revenue: record.number(CanonicalColumn::RevenuePerEmployee),
            profit: record.number(CanonicalColumn::ProfitPerEmployee),
            efficiency_ratio: record.number(CanonicalColumn::EfficiencyRatio),
            contribution_percent: record.number(CanonicalColumn::ContributionToProfitPercent),
        })
    }
}
