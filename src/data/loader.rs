//! Sheet Loader Module
//! Reads an exported sheet (CSV) into a raw grid using Polars, and memoizes
//! the parse result for the current session.

use super::grid::{Cell, RawGrid};
use polars::prelude::*;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads sheets without any header inference; the header row is located later.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV export of the first sheet. Every cell is read as text.
    pub fn load_csv(file_path: &Path) -> Result<RawGrid, LoaderError> {
        let df = LazyCsvReader::new(file_path)
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let grid = Self::dataframe_to_grid(&df);
        info!(
            path = %file_path.display(),
            rows = grid.len(),
            width = grid.width(),
            "sheet loaded"
        );
        Ok(grid)
    }

    /// Row-major copy of a DataFrame, nulls as empty cells.
    pub fn dataframe_to_grid(df: &DataFrame) -> RawGrid {
        let columns = df.get_columns();
        let rows = (0..df.height())
            .map(|i| {
                columns
                    .iter()
                    .map(|col| {
                        col.get(i)
                            .map(|v| Self::any_value_to_cell(&v))
                            .unwrap_or(Cell::Empty)
                    })
                    .collect()
            })
            .collect();
        RawGrid::new(rows)
    }

    fn any_value_to_cell(value: &AnyValue) -> Cell {
        match value {
            AnyValue::Null => Cell::Empty,
            AnyValue::String(s) => Cell::text(*s),
            AnyValue::StringOwned(s) => Cell::text(s.as_str()),
            other => match other.extract::<f64>() {
                Some(v) => Cell::Number(v),
                None => Cell::text(other.to_string().trim_matches('"')),
            },
        }
    }
}

/// Hex SHA-256 of file content, the cache identity of an upload.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

struct CachedSheet {
    digest: String,
    file_path: PathBuf,
    grid: Arc<RawGrid>,
}

/// Holds the parse result of the most recent upload.
///
/// Loading content identical to the cached upload returns the cached grid;
/// anything else replaces it. There is no other eviction.
#[derive(Default)]
pub struct SessionCache {
    current: Option<CachedSheet>,
    hits: usize,
    misses: usize,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, file_path: &Path) -> Result<Arc<RawGrid>, LoaderError> {
        let bytes = fs::read(file_path)?;
        let digest = content_digest(&bytes);

        if let Some(cached) = self.current.as_ref().filter(|c| c.digest == digest) {
            self.hits += 1;
            info!(path = %file_path.display(), "sheet served from session cache");
            return Ok(Arc::clone(&cached.grid));
        }

        let grid = Arc::new(DataLoader::load_csv(file_path)?);
        self.misses += 1;
        self.current = Some(CachedSheet {
            digest,
            file_path: file_path.to_path_buf(),
            grid: Arc::clone(&grid),
        });
        Ok(grid)
    }

    /// Get the cached grid, if any.
    pub fn get_grid(&self) -> Option<Arc<RawGrid>> {
        self.current.as_ref().map(|c| Arc::clone(&c.grid))
    }

    /// Get file path of the cached upload.
    pub fn get_file_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.file_path.as_path())
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const SHEET: &str = "\
LAPORAN,,
,,
Nama Karyawan,Gaji Tahunan (Rp),Divisi
Budi,\"Rp1.000.000\",IT
";

    #[test]
    fn csv_is_read_without_header_inference() {
        let file = csv_file(SHEET);
        let grid = DataLoader::load_csv(file.path()).unwrap();

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell(0, 0), &Cell::from("LAPORAN"));
        assert_eq!(grid.cell(1, 1), &Cell::Empty);
        assert_eq!(grid.cell(2, 0), &Cell::from("Nama Karyawan"));
        assert_eq!(grid.cell(3, 1), &Cell::from("Rp1.000.000"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DataLoader::load_csv(Path::new("/definitely/not/here.csv"));
        assert!(err.is_err());
    }

    #[test]
    fn identical_content_hits_the_cache() {
        let file = csv_file(SHEET);
        let mut cache = SessionCache::new();

        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.get_file_path(), Some(file.path()));
    }

    #[test]
    fn new_content_replaces_cached_sheet() {
        let a = csv_file(SHEET);
        let b = csv_file("Nama Karyawan,Gaji Tahunan\nAni,5\n");
        let mut cache = SessionCache::new();

        cache.load(a.path()).unwrap();
        let grid = cache.load(b.path()).unwrap();

        assert_eq!(cache.misses(), 2);
        assert_eq!(grid.len(), 2);
        assert_eq!(cache.get_grid().map(|g| g.len()), Some(2));

        cache.clear();
        assert!(cache.get_grid().is_none());
    }

    #[test]
    fn digest_is_stable_hex() {
        assert_eq!(content_digest(b"abc").len(), 64);
        assert_eq!(content_digest(b"abc"), content_digest(b"abc"));
        assert_ne!(content_digest(b"abc"), content_digest(b"abd"));
    }
}
