//! Pipeline settings, loadable from a JSON file.

use crate::data::header::{DEFAULT_SCAN_LIMIT, FALLBACK_HEADER_ROW};
use crate::data::RecordFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Default number of top contributors reported.
pub const DEFAULT_TOP_N: usize = 5;

/// User settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub header_scan_limit: usize,
    pub fallback_header_row: usize,
    pub filter: RecordFilter,
    pub top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            header_scan_limit: DEFAULT_SCAN_LIMIT,
            fallback_header_row: FALLBACK_HEADER_ROW,
            filter: RecordFilter::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineSettings {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
