//! Export Module
//! Presentation formatting and CSV / JSON serialization of a record set.

use crate::data::{CanonicalColumn, Cell, ColumnKey, RecordSet};
use crate::stats::{KpiSummary, StatsCalculator};
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Placeholder for missing values in formatted output.
pub const MISSING: &str = "-";

/// How numeric columns are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStyle {
    /// Currency, ratio and percent strings.
    #[default]
    Formatted,
    /// Plain numbers, missing as empty fields.
    Raw,
}

/// Rupiah with "." grouping and no decimals, e.g. `Rp1.234.567`.
pub fn currency_idr(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return MISSING.to_string();
    };
    let digits = format!("{:.0}", v.abs());
    let sign = if v < 0.0 && digits != "0" { "-" } else { "" };
    format!("Rp{}{}", sign, group_thousands(&digits, '.'))
}

pub fn ratio(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}", v),
        None => MISSING.to_string(),
    }
}

pub fn percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}%", v),
        None => MISSING.to_string(),
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Display string of a cell under its column's presentation rule.
pub fn format_cell(key: &ColumnKey, cell: &Cell) -> String {
    let Some(column) = key.canonical().filter(|c| c.is_numeric()) else {
        return cell.to_string();
    };
    let value = cell.as_number();
    match column {
        c if c.is_monetary() => currency_idr(value),
        CanonicalColumn::EfficiencyRatio => ratio(value),
        CanonicalColumn::ContributionToProfitPercent => percent(value),
        _ => value.map_or_else(|| MISSING.to_string(), |v| format!("{}", v)),
    }
}

/// Writes record sets out of the pipeline.
pub struct Exporter;

impl Exporter {
    /// Column-per-field DataFrame of the records, in set column order.
    pub fn to_dataframe(records: &RecordSet, style: ExportStyle) -> Result<DataFrame, ExportError> {
        let mut used: HashSet<String> = HashSet::new();
        let mut columns: Vec<Column> = Vec::with_capacity(records.columns().len());

        for (position, key) in records.columns().iter().enumerate() {
            let name = unique_name(key.label(), &mut used);

            let column = match (style, key.canonical()) {
                (ExportStyle::Raw, Some(c)) if c.is_numeric() => {
                    let values: Vec<Option<f64>> = records.iter().map(|r| r.number(c)).collect();
                    Column::new(name.into(), values)
                }
                (ExportStyle::Raw, _) => {
                    let values: Vec<Option<String>> = records
                        .iter()
                        .map(|r| {
                            let cell = r.value_at(position, key);
                            (!cell.is_blank()).then(|| cell.to_string())
                        })
                        .collect();
                    Column::new(name.into(), values)
                }
                (ExportStyle::Formatted, _) => {
                    let values: Vec<String> = records
                        .iter()
                        .map(|r| format_cell(key, r.value_at(position, key)))
                        .collect();
                    Column::new(name.into(), values)
                }
            };
            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv<W: std::io::Write>(
        records: &RecordSet,
        style: ExportStyle,
        writer: &mut W,
    ) -> Result<(), ExportError> {
        let mut df = Self::to_dataframe(records, style)?;
        CsvWriter::new(writer).include_header(true).finish(&mut df)?;
        Ok(())
    }

    pub fn write_csv_file(
        records: &RecordSet,
        style: ExportStyle,
        path: &Path,
    ) -> Result<(), ExportError> {
        let mut file = File::create(path)?;
        Self::write_csv(records, style, &mut file)?;
        info!(path = %path.display(), rows = records.len(), "CSV exported");
        Ok(())
    }

    /// KPI summary, top contributors and all records as one JSON document.
    pub fn to_json(records: &RecordSet, top_n: usize) -> Value {
        let summary: KpiSummary = StatsCalculator::kpi_summary(records);
        let top: Vec<Value> = StatsCalculator::top_contributors(records, top_n)
            .into_iter()
            .map(|r| {
                json!({
                    "name": r.name(),
                    "profit": r.number(CanonicalColumn::ProfitPerEmployee),
                    "contribution_percent": r.number(CanonicalColumn::ContributionToProfitPercent),
                })
            })
            .collect();

        let rows: Vec<Value> = records
            .iter()
            .map(|r| {
                let object: Map<String, Value> = records
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(position, key)| {
                        (key.label().to_string(), cell_to_json(r.value_at(position, key)))
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();

        json!({
            "summary": summary,
            "top_contributors": top,
            "records": rows,
        })
    }

    pub fn write_json_file(records: &RecordSet, top_n: usize, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &Self::to_json(records, top_n))?;
        info!(path = %path.display(), "JSON report exported");
        Ok(())
    }
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Null,
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Number(v) => Value::from(*v),
    }
}

/// Column names must be unique in a DataFrame; repeats get a numeric suffix.
fn unique_name(label: &str, used: &mut HashSet<String>) -> String {
    let mut name = label.to_string();
    let mut n = 1;
    while !used.insert(name.clone()) {
        n += 1;
        name = format!("{}_{}", label, n);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NormalizedTable;
    use crate::stats::DerivationEngine;

    fn sample() -> RecordSet {
        let columns = vec![
            ColumnKey::Canonical(CanonicalColumn::EmployeeName),
            ColumnKey::Canonical(CanonicalColumn::TotalCostPerEmployee),
            ColumnKey::Canonical(CanonicalColumn::RevenuePerEmployee),
            ColumnKey::Other("Divisi".to_string()),
        ];
        let rows = vec![
            vec![Cell::from("Budi"), Cell::Number(1_000_000.0), Cell::Number(3_500_000.0), Cell::from("IT")],
            vec![Cell::from("Ani"), Cell::Number(2_000_000.0), Cell::Empty, Cell::Empty],
        ];
        DerivationEngine::derive(&RecordSet::from_table(&NormalizedTable { columns, rows }))
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(currency_idr(Some(1234567.0)), "Rp1.234.567");
        assert_eq!(currency_idr(Some(999.0)), "Rp999");
        assert_eq!(currency_idr(Some(1000.0)), "Rp1.000");
        assert_eq!(currency_idr(Some(-2500000.4)), "Rp-2.500.000");
        assert_eq!(currency_idr(Some(0.0)), "Rp0");
        assert_eq!(currency_idr(None), "-");
        assert_eq!(currency_idr(Some(f64::NAN)), "-");
    }

    #[test]
    fn ratio_and_percent_formatting() {
        assert_eq!(ratio(Some(1.23456)), "1.23");
        assert_eq!(percent(Some(33.3333)), "33.33%");
        assert_eq!(percent(None), "-");
    }

    #[test]
    fn format_cell_by_column() {
        let ratio_key = ColumnKey::Canonical(CanonicalColumn::EfficiencyRatio);
        assert_eq!(format_cell(&ratio_key, &Cell::Number(2.5)), "2.50");
        let name_key = ColumnKey::Canonical(CanonicalColumn::EmployeeName);
        assert_eq!(format_cell(&name_key, &Cell::from("Budi")), "Budi");
        let other = ColumnKey::Other("Catatan".to_string());
        assert_eq!(format_cell(&other, &Cell::Empty), "");
    }

    #[test]
    fn formatted_csv() {
        let mut buf: Vec<u8> = Vec::new();
        Exporter::write_csv(&sample(), ExportStyle::Formatted, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<Vec<&str>> = text
            .lines()
            .map(|l| l.split(',').map(|f| f.trim_matches('"')).collect())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            vec![
                "Nama Karyawan",
                "Total Cost per-MP (Rp)",
                "Revenue/MP (dynamic)",
                "Divisi",
                "Profit per-MP (Rp)",
                "Rasio Efisiensi",
                "Range Efisiensi",
                "Kontribusi to Profit (%)",
            ]
        );
        assert_eq!(
            lines[1],
            vec!["Budi", "Rp1.000.000", "Rp3.500.000", "IT", "Rp2.500.000", "2.50", "Efficient", "100.00%"]
        );
        assert_eq!(lines[2], vec!["Ani", "Rp2.000.000", "-", "", "-", "-", "", "-"]);
    }

    #[test]
    fn raw_dataframe_keeps_numbers() {
        let df = Exporter::to_dataframe(&sample(), ExportStyle::Raw).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8);
        let profit = df.column("Profit per-MP (Rp)").unwrap();
        assert_eq!(profit.dtype(), &DataType::Float64);
        assert_eq!(profit.null_count(), 1);
    }

    #[test]
    fn duplicate_labels_are_suffixed() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("", &mut used), "");
        assert_eq!(unique_name("", &mut used), "_2");
        assert_eq!(unique_name("x", &mut used), "x");
    }

    #[test]
    fn json_report_shape() {
        let report = Exporter::to_json(&sample(), 5);
        assert_eq!(report["summary"]["record_count"], 2);
        assert_eq!(report["records"][0]["Nama Karyawan"], "Budi");
        assert_eq!(report["records"][1]["Revenue/MP (dynamic)"], Value::Null);
        assert_eq!(report["top_contributors"][0]["name"], "Budi");
    }

    #[test]
    fn blank_header_columns_export_their_own_values() {
        let blank = ColumnKey::Other(String::new());
        let set = RecordSet::from_table(&NormalizedTable {
            columns: vec![
                ColumnKey::Canonical(CanonicalColumn::EmployeeName),
                blank.clone(),
                blank,
            ],
            rows: vec![vec![Cell::from("Budi"), Cell::from("note-a"), Cell::from("note-b")]],
        });
        let df = Exporter::to_dataframe(&set, ExportStyle::Formatted).unwrap();
        let text_at = |name: &str| {
            let series = df.column(name).unwrap().as_materialized_series().clone();
            series.str().unwrap().get(0).map(str::to_string)
        };
        let first = text_at("");
        let second = text_at("_2");
        assert_eq!(first.as_deref(), Some("note-a"));
        assert_eq!(second.as_deref(), Some("note-b"));
    }

    #[test]
    fn formatted_currency_reads_back_unchanged() {
        use crate::data::NumericCoercer;

        for amount in [500_000.0, 1_000.0, 999.0, 1_234_567.0, -2_500_000.0, 0.0] {
            let text = currency_idr(Some(amount));
            assert_eq!(NumericCoercer::parse_text(&text), Some(amount), "{}", text);
        }
    }
}
