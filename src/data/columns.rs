//! Column Normalizer Module
//! Maps free-form header labels onto the canonical column vocabulary.

use super::grid::{Cell, RawGrid};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Value kind of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// Recognized financial / identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CanonicalColumn {
    EmployeeName,
    AnnualSalary,
    OverheadCostPerYear,
    TaxPensionPerYear,
    TotalCostPerEmployee,
    RevenuePerEmployee,
    ProfitPerEmployee,
    EfficiencyRatio,
    EfficiencyBand,
    ContributionToProfitPercent,
    TotalCompanyRevenue,
    EmployeeCount,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 12] = [
        CanonicalColumn::EmployeeName,
        CanonicalColumn::AnnualSalary,
        CanonicalColumn::OverheadCostPerYear,
        CanonicalColumn::TaxPensionPerYear,
        CanonicalColumn::TotalCostPerEmployee,
        CanonicalColumn::RevenuePerEmployee,
        CanonicalColumn::ProfitPerEmployee,
        CanonicalColumn::EfficiencyRatio,
        CanonicalColumn::EfficiencyBand,
        CanonicalColumn::ContributionToProfitPercent,
        CanonicalColumn::TotalCompanyRevenue,
        CanonicalColumn::EmployeeCount,
    ];

    /// Label used in exported tables.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalColumn::EmployeeName => "Nama Karyawan",
            CanonicalColumn::AnnualSalary => "Gaji Tahunan (Rp)",
            CanonicalColumn::OverheadCostPerYear => "BOP MP/tahun (Rp)",
            CanonicalColumn::TaxPensionPerYear => "TAX + PENSIUN/tahun",
            CanonicalColumn::TotalCostPerEmployee => "Total Cost per-MP (Rp)",
            CanonicalColumn::RevenuePerEmployee => "Revenue/MP (dynamic)",
            CanonicalColumn::ProfitPerEmployee => "Profit per-MP (Rp)",
            CanonicalColumn::EfficiencyRatio => "Rasio Efisiensi",
            CanonicalColumn::EfficiencyBand => "Range Efisiensi",
            CanonicalColumn::ContributionToProfitPercent => "Kontribusi to Profit (%)",
            CanonicalColumn::TotalCompanyRevenue => "Total Revenue Perusahaan",
            CanonicalColumn::EmployeeCount => "Jumlah Karyawan",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            CanonicalColumn::EmployeeName | CanonicalColumn::EfficiencyBand => ColumnKind::Text,
            _ => ColumnKind::Numeric,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    /// Rupiah amounts, formatted as currency on export.
    pub fn is_monetary(self) -> bool {
        matches!(
            self,
            CanonicalColumn::AnnualSalary
                | CanonicalColumn::OverheadCostPerYear
                | CanonicalColumn::TaxPensionPerYear
                | CanonicalColumn::TotalCostPerEmployee
                | CanonicalColumn::RevenuePerEmployee
                | CanonicalColumn::ProfitPerEmployee
                | CanonicalColumn::TotalCompanyRevenue
        )
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized column: either canonical or an unrecognized source label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Canonical(CanonicalColumn),
    Other(String),
}

impl ColumnKey {
    pub fn canonical(&self) -> Option<CanonicalColumn> {
        match self {
            ColumnKey::Canonical(c) => Some(*c),
            ColumnKey::Other(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ColumnKey::Canonical(c) => c.label(),
            ColumnKey::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<CanonicalColumn> for ColumnKey {
    fn from(c: CanonicalColumn) -> Self {
        ColumnKey::Canonical(c)
    }
}

/// Keyword rule: every `all_of` keyword must occur, and at least one of
/// `any_of` when it is non-empty.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub all_of: &'static [&'static str],
    pub any_of: &'static [&'static str],
    pub column: CanonicalColumn,
}

impl KeywordRule {
    const fn all(all_of: &'static [&'static str], column: CanonicalColumn) -> Self {
        Self {
            all_of,
            any_of: &[],
            column,
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        self.all_of.iter().all(|k| label.contains(k))
            && (self.any_of.is_empty() || self.any_of.iter().any(|k| label.contains(k)))
    }
}

/// Ordered rule table, first match wins.
pub const RULES: &[KeywordRule] = &[
    KeywordRule::all(&["nama", "karyawan"], CanonicalColumn::EmployeeName),
    KeywordRule::all(&["gaji", "tahun"], CanonicalColumn::AnnualSalary),
    KeywordRule::all(&["bop"], CanonicalColumn::OverheadCostPerYear),
    KeywordRule {
        all_of: &[],
        any_of: &["tax", "pensiun"],
        column: CanonicalColumn::TaxPensionPerYear,
    },
    KeywordRule::all(&["total cost"], CanonicalColumn::TotalCostPerEmployee),
    KeywordRule::all(&["profit per"], CanonicalColumn::ProfitPerEmployee),
    KeywordRule::all(&["rasio efisiensi"], CanonicalColumn::EfficiencyRatio),
    KeywordRule::all(&["range efisiensi"], CanonicalColumn::EfficiencyBand),
    KeywordRule::all(&["revenue/mp"], CanonicalColumn::RevenuePerEmployee),
    KeywordRule::all(&["kontribusi", "profit"], CanonicalColumn::ContributionToProfitPercent),
    KeywordRule::all(&["total revenue perusahaan"], CanonicalColumn::TotalCompanyRevenue),
    KeywordRule::all(&["jumlah karyawan"], CanonicalColumn::EmployeeCount),
];

/// Header labels resolved to columns plus the body rows beneath them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub columns: Vec<ColumnKey>,
    /// Body rows, each padded or cut to `columns.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl NormalizedTable {
    pub fn position(&self, column: CanonicalColumn) -> Option<usize> {
        self.columns
            .iter()
            .position(|key| key.canonical() == Some(column))
    }
}

/// Resolves source labels through [`RULES`].
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    /// Canonical column for a raw label, if any rule matches.
    pub fn classify(raw_label: &str) -> Option<CanonicalColumn> {
        let label = raw_label.trim().to_lowercase();
        RULES
            .iter()
            .find(|rule| rule.matches(&label))
            .map(|rule| rule.column)
    }

    /// Take `header_row` as labels and every later row as the body.
    ///
    /// A header row past the end of the grid yields an empty table.
    pub fn normalize(grid: &RawGrid, header_row: usize) -> NormalizedTable {
        let Some(header) = grid.row(header_row) else {
            return NormalizedTable {
                columns: Vec::new(),
                rows: Vec::new(),
            };
        };

        let mut bound: HashSet<CanonicalColumn> = HashSet::new();
        let columns: Vec<ColumnKey> = header
            .iter()
            .map(|cell| {
                let raw = cell.to_string();
                match Self::classify(&raw) {
                    Some(column) if bound.insert(column) => ColumnKey::Canonical(column),
                    Some(column) => {
                        warn!(label = %raw, canonical = %column, "duplicate canonical column left unrenamed");
                        ColumnKey::Other(raw)
                    }
                    None => ColumnKey::Other(raw),
                }
            })
            .collect();

        let width = columns.len();
        let rows: Vec<Vec<Cell>> = grid.rows()[header_row + 1..]
            .iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.iter().take(width).cloned().collect();
                cells.resize(width, Cell::Empty);
                cells
            })
            .collect();

        debug!(
            columns = width,
            canonical = bound.len(),
            rows = rows.len(),
            "columns normalized"
        );

        NormalizedTable { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_ignores_case_and_whitespace() {
        assert_eq!(
            ColumnNormalizer::classify(" Gaji Tahunan (Rp) "),
            Some(CanonicalColumn::AnnualSalary)
        );
        assert_eq!(
            ColumnNormalizer::classify("NAMA KARYAWAN"),
            Some(CanonicalColumn::EmployeeName)
        );
        assert_eq!(
            ColumnNormalizer::classify("bop mp/tahun (rp)"),
            Some(CanonicalColumn::OverheadCostPerYear)
        );
        assert_eq!(
            ColumnNormalizer::classify("Rasio Efisiensi"),
            Some(CanonicalColumn::EfficiencyRatio)
        );
    }

    #[test]
    fn every_canonical_label_maps_back_to_itself() {
        for column in CanonicalColumn::ALL {
            assert_eq!(
                ColumnNormalizer::classify(column.label()),
                Some(column),
                "label {:?}",
                column.label()
            );
        }
    }

    #[test]
    fn tax_rule_needs_either_keyword() {
        assert_eq!(
            ColumnNormalizer::classify("Pensiun per tahun"),
            Some(CanonicalColumn::TaxPensionPerYear)
        );
        assert_eq!(
            ColumnNormalizer::classify("Tax/tahun"),
            Some(CanonicalColumn::TaxPensionPerYear)
        );
        assert_eq!(
            ColumnNormalizer::classify("TAX + PENSIUN"),
            Some(CanonicalColumn::TaxPensionPerYear)
        );
        assert_eq!(ColumnNormalizer::classify("Pajak"), None);
    }

    #[test]
    fn order_decides_overlapping_labels() {
        // "bop" precedes "total cost" in the table.
        assert_eq!(
            ColumnNormalizer::classify("Total Cost BOP"),
            Some(CanonicalColumn::OverheadCostPerYear)
        );
        // Mentions "karyawan" without "nama".
        assert_eq!(
            ColumnNormalizer::classify("Jumlah Karyawan"),
            Some(CanonicalColumn::EmployeeCount)
        );
    }

    #[test]
    fn unknown_labels_pass_through() {
        let grid = RawGrid::new(vec![
            vec![Cell::from("No"), Cell::from("Nama Karyawan"), Cell::from("Divisi")],
            vec![Cell::from("1"), Cell::from("Budi"), Cell::from("IT")],
        ]);
        let table = ColumnNormalizer::normalize(&grid, 0);
        assert_eq!(
            table.columns,
            vec![
                ColumnKey::Other("No".to_string()),
                ColumnKey::Canonical(CanonicalColumn::EmployeeName),
                ColumnKey::Other("Divisi".to_string()),
            ]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.position(CanonicalColumn::EmployeeName), Some(1));
    }

    #[test]
    fn duplicate_canonical_label_stays_raw() {
        let grid = RawGrid::new(vec![vec![
            Cell::from("Nama Karyawan"),
            Cell::from("Gaji Tahunan"),
            Cell::from("Gaji Tahunan Lama"),
        ]]);
        let table = ColumnNormalizer::normalize(&grid, 0);
        assert_eq!(
            table.columns[2],
            ColumnKey::Other("Gaji Tahunan Lama".to_string())
        );
    }

    #[test]
    fn body_rows_are_padded_and_cut_to_header_width() {
        let grid = RawGrid::new(vec![
            vec![Cell::from("Nama Karyawan"), Cell::from("Gaji Tahunan")],
            vec![Cell::from("Budi")],
            vec![Cell::from("Ani"), Cell::from("5"), Cell::from("extra")],
        ]);
        let table = ColumnNormalizer::normalize(&grid, 0);
        assert_eq!(table.rows[0], vec![Cell::from("Budi"), Cell::Empty]);
        assert_eq!(table.rows[1], vec![Cell::from("Ani"), Cell::from("5")]);
    }

    #[test]
    fn header_past_end_is_empty_table() {
        let grid = RawGrid::new(vec![vec![Cell::from("x")]]);
        let table = ColumnNormalizer::normalize(&grid, 3);
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }
}
