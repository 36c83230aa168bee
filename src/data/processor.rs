//! Data Processor Module
//! Runs a raw grid through header location, normalization, coercion and
//! derivation to produce a clean record set.

use super::coerce::NumericCoercer;
use super::columns::{CanonicalColumn, ColumnNormalizer};
use super::grid::{Cell, RawGrid};
use super::header::HeaderLocator;
use super::record::RecordSet;
use crate::config::PipelineSettings;
use crate::stats::DerivationEngine;
use thiserror::Error;
use tracing::{debug, info};

/// Body rows kept in an error for inspection.
const PREVIEW_ROWS: usize = 20;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Unrecognized layout: no employee name column in header row {header_row} (columns: {columns:?})")]
    UnrecognizedLayout {
        header_row: usize,
        columns: Vec<String>,
        preview: Vec<Vec<Cell>>,
    },
}

/// Turns a raw sheet grid into a derived [`RecordSet`].
pub struct DataProcessor {
    locator: HeaderLocator,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new(HeaderLocator::default())
    }
}

impl DataProcessor {
    pub fn new(locator: HeaderLocator) -> Self {
        Self { locator }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            HeaderLocator::new(settings.header_scan_limit)
                .with_fallback_row(settings.fallback_header_row),
        )
    }

    /// Run the full pipeline.
    ///
    /// A header row past the end of the grid means there is nothing to read
    /// and yields an empty set. A header row that exists but has no employee
    /// name column is an [`ProcessorError::UnrecognizedLayout`].
    pub fn process(&self, grid: &RawGrid) -> Result<RecordSet, ProcessorError> {
        let header_row = self.locator.locate(grid);
        if header_row >= grid.len() {
            info!(header_row, rows = grid.len(), "header row beyond sheet, no records");
            return Ok(RecordSet::empty());
        }

        let table = ColumnNormalizer::normalize(grid, header_row);
        if table.position(CanonicalColumn::EmployeeName).is_none() {
            return Err(ProcessorError::UnrecognizedLayout {
                header_row,
                columns: table.columns.iter().map(|c| c.to_string()).collect(),
                preview: table.rows.into_iter().take(PREVIEW_ROWS).collect(),
            });
        }

        let table = NumericCoercer::coerce(&table);
        let records = RecordSet::from_table(&table);
        debug!(
            body_rows = table.rows.len(),
            records = records.len(),
            "records built"
        );

        let derived = DerivationEngine::derive(&records);
        info!(
            records = derived.len(),
            columns = derived.columns().len(),
            "sheet processed"
        );
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::from(*s)).collect()
    }

    #[test]
    fn processes_sheet_with_preamble() {
        let grid = RawGrid::new(vec![
            row(&["CONTRIBUTION MANPOWER TO PROFIT"]),
            row(&["Periode 2025"]),
            row(&[]),
            row(&["No", "Nama Karyawan", "Gaji Tahunan (Rp)", "BOP MP/tahun (Rp)", "TAX + PENSIUN/tahun", "Revenue/MP (dynamic)"]),
            row(&["1", "Budi", "Rp100", "Rp10", "Rp5", "Rp200"]),
            row(&["2", "Ani", "Rp200", "Rp10", "Rp5", "Rp300"]),
            row(&["3", "Citra", "Rp300", "Rp10", "Rp5", "Rp400"]),
            row(&["", "", "", "", "", ""]),
            row(&["", "Total Revenue Perusahaan", "", "", "", ""]),
        ]);

        let set = DataProcessor::default().process(&grid).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(
            set.present_numbers(CanonicalColumn::TotalCostPerEmployee),
            vec![115.0, 215.0, 315.0, 0.0]
        );
        assert_eq!(
            set.present_numbers(CanonicalColumn::ProfitPerEmployee),
            vec![85.0, 85.0, 85.0]
        );
    }

    #[test]
    fn short_sheet_without_header_is_empty() {
        let grid = RawGrid::new(vec![row(&["a", "b"]), row(&["1", "2"])]);
        let set = DataProcessor::default().process(&grid).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn fallback_row_without_name_column_is_rejected() {
        let grid = RawGrid::new(vec![
            row(&["x"]),
            row(&["y"]),
            row(&["z"]),
            row(&["Kolom A", "Kolom B"]),
            row(&["1", "2"]),
        ]);
        let err = DataProcessor::default().process(&grid).unwrap_err();
        match err {
            ProcessorError::UnrecognizedLayout {
                header_row,
                columns,
                preview,
            } => {
                assert_eq!(header_row, 3);
                assert_eq!(columns, vec!["Kolom A", "Kolom B"]);
                assert_eq!(preview.len(), 1);
            }
        }
    }
}
