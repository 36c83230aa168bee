//! Numeric Coercer Module
//! Turns currency-formatted text cells into floating point values.

use super::columns::NormalizedTable;
use super::grid::Cell;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static NON_NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static pattern compiles"));

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(rp|idr)").expect("static pattern compiles"));

/// Parses designated columns to numbers; unparseable cells become empty.
pub struct NumericCoercer;

impl NumericCoercer {
    /// Coerce a single cell. Missing stays distinct from zero.
    pub fn coerce_cell(cell: &Cell) -> Cell {
        match cell {
            Cell::Number(v) if v.is_finite() => Cell::Number(*v),
            Cell::Number(_) | Cell::Empty => Cell::Empty,
            Cell::Text(text) => Self::parse_text(text).map_or(Cell::Empty, Cell::Number),
        }
    }

    /// Strip everything but digits, dots and minus signs, then parse.
    ///
    /// Dots are thousands separators ("Rp500.000", "1.234.567") when every
    /// one of them starts a group of three digits and the text either has a
    /// currency marker or more than one dot. A comma not starting such a
    /// group is a decimal comma and leaves the value missing.
    pub fn parse_text(text: &str) -> Option<f64> {
        if text.contains(',') && !grouped_by_three(text, ',') {
            return None;
        }

        let stripped = NON_NUMERIC_RE.replace_all(text, "");
        let dots = stripped.matches('.').count();
        let thousands = dots > 0
            && grouped_by_three(&stripped, '.')
            && (dots > 1 || CURRENCY_RE.is_match(text));
        let digits = if thousands {
            stripped.replace('.', "")
        } else {
            stripped.into_owned()
        };

        if digits.is_empty() {
            return None;
        }

        digits.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Coerce every column whose canonical kind is numeric, leaving the rest
    /// untouched.
    pub fn coerce(table: &NormalizedTable) -> NormalizedTable {
        let numeric: Vec<bool> = table
            .columns
            .iter()
            .map(|key| key.canonical().is_some_and(|c| c.is_numeric()))
            .collect();

        let mut missing = 0usize;
        let rows: Vec<Vec<Cell>> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&numeric)
                    .map(|(cell, &is_numeric)| {
                        if !is_numeric {
                            return cell.clone();
                        }
                        let coerced = Self::coerce_cell(cell);
                        if coerced == Cell::Empty && !cell.is_blank() {
                            missing += 1;
                        }
                        coerced
                    })
                    .collect::<Vec<Cell>>()
            })
            .collect();

        debug!(
            columns = numeric.iter().filter(|n| **n).count(),
            unparseable = missing,
            "numeric columns coerced"
        );

        NormalizedTable {
            columns: table.columns.clone(),
            rows,
        }
    }
}

fn grouped_by_three(text: &str, separator: char) -> bool {
    text.split(separator)
        .skip(1)
        .all(|group| group.chars().take_while(char::is_ascii_digit).count() == 3)
}
