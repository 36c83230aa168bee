//! Data module - sheet loading, normalization and filtering

mod coerce;
mod columns;
mod filter;
mod grid;
pub mod header;
mod loader;
mod processor;
mod record;

pub use coerce::NumericCoercer;
pub use columns::{
    CanonicalColumn, ColumnKey, ColumnKind, ColumnNormalizer, KeywordRule, NormalizedTable, RULES,
};
pub use filter::RecordFilter;
pub use grid::{Cell, RawGrid};
pub use header::HeaderLocator;
pub use loader::{DataLoader, LoaderError, SessionCache};
pub use processor::{DataProcessor, ProcessorError};
pub use record::{EmployeeRecord, RecordSet};
