//! Header Locator Module
//! Finds the row holding the column labels in a sheet with a free-form preamble.

use super::grid::RawGrid;
use tracing::{debug, warn};

/// Label that marks the header row (matched lowercase, as a substring).
pub const EMPLOYEE_NAME_LABEL: &str = "nama karyawan";

/// Default number of leading rows searched for the header.
pub const DEFAULT_SCAN_LIMIT: usize = 25;

/// Row assumed to be the header when none is recognized.
pub const FALLBACK_HEADER_ROW: usize = 3;

/// Locates the header row of a raw grid.
#[derive(Debug, Clone, Copy)]
pub struct HeaderLocator {
    scan_limit: usize,
    fallback_row: usize,
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_LIMIT)
    }
}

impl HeaderLocator {
    pub fn new(scan_limit: usize) -> Self {
        Self {
            scan_limit,
            fallback_row: FALLBACK_HEADER_ROW,
        }
    }

    pub fn with_fallback_row(mut self, fallback_row: usize) -> Self {
        self.fallback_row = fallback_row;
        self
    }

    /// Index of the first row within the scan limit containing the
    /// employee-name label, otherwise the fallback row.
    ///
    /// The fallback may point past the end of the grid; callers treat that as
    /// a sheet with zero records.
    pub fn locate(&self, grid: &RawGrid) -> usize {
        let limit = self.scan_limit.min(grid.len());

        let found = grid.rows()[..limit].iter().position(|row| {
            row.iter()
                .any(|cell| cell.normalized().contains(EMPLOYEE_NAME_LABEL))
        });

        match found {
            Some(index) => {
                debug!(row = index, "header row located");
                index
            }
            None => {
                warn!(
                    scanned = limit,
                    fallback = self.fallback_row,
                    "no header row recognized, using positional fallback"
                );
                self.fallback_row
            }
        }
    }
}
