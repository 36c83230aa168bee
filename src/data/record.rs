//! Record Module
//! Typed employee records built from a normalized, coerced table.

use super::columns::{CanonicalColumn, ColumnKey, NormalizedTable};
use super::grid::Cell;
use std::collections::BTreeMap;

/// One employee row. Absent and missing fields both read as `None` through the
/// typed accessors; use [`EmployeeRecord::get`] to tell them apart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmployeeRecord {
    canonical: BTreeMap<CanonicalColumn, Cell>,
    /// Unrecognized cells keyed by column position; labels may repeat.
    extra: BTreeMap<usize, Cell>,
}

impl EmployeeRecord {
    pub fn name(&self) -> Option<&str> {
        self.text(CanonicalColumn::EmployeeName)
    }

    /// `None` only when the column is absent; a missing cell is `Cell::Empty`.
    pub fn get(&self, column: CanonicalColumn) -> Option<&Cell> {
        self.canonical.get(&column)
    }

    pub fn number(&self, column: CanonicalColumn) -> Option<f64> {
        self.get(column).and_then(Cell::as_number)
    }

    pub fn text(&self, column: CanonicalColumn) -> Option<&str> {
        self.get(column).and_then(Cell::as_text)
    }

    /// Value of the column `key` at `position` in the owning set's layout,
    /// empty when not populated.
    pub fn value_at(&self, position: usize, key: &ColumnKey) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        let found = match key {
            ColumnKey::Canonical(c) => self.canonical.get(c),
            ColumnKey::Other(_) => self.extra.get(&position),
        };
        found.unwrap_or(&EMPTY)
    }

    pub(crate) fn set(&mut self, column: CanonicalColumn, cell: Cell) {
        self.canonical.insert(column, cell);
    }
}

/// Ordered employee records sharing one column layout.
///
/// Every record carries exactly the canonical columns listed in `columns`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    columns: Vec<ColumnKey>,
    records: Vec<EmployeeRecord>,
}

impl RecordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build records from table rows in source order, skipping rows without an
    /// employee name.
    pub fn from_table(table: &NormalizedTable) -> Self {
        let name_idx = table.position(CanonicalColumn::EmployeeName);

        let records = table
            .rows
            .iter()
            .filter(|row| {
                name_idx.map_or(true, |i| row.get(i).is_some_and(|c| !c.is_blank()))
            })
            .map(|row| {
                let mut record = EmployeeRecord::default();
                for (position, key) in table.columns.iter().enumerate() {
                    let cell = row.get(position).cloned().unwrap_or_default();
                    match key {
                        ColumnKey::Canonical(c) => {
                            record.canonical.insert(*c, cell);
                        }
                        ColumnKey::Other(_) => {
                            record.extra.insert(position, cell);
                        }
                    }
                }
                record
            })
            .collect();

        Self {
            columns: table.columns.clone(),
            records,
        }
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmployeeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns
            .iter()
            .any(|key| key.canonical() == Some(column))
    }

    /// Per-row values of a numeric column (missing as `None`).
    pub fn numbers(&self, column: CanonicalColumn) -> impl Iterator<Item = Option<f64>> + '_ {
        self.records.iter().map(move |r| r.number(column))
    }

    /// Present values of a numeric column, missing ones skipped.
    pub fn present_numbers(&self, column: CanonicalColumn) -> Vec<f64> {
        self.numbers(column).flatten().collect()
    }

    /// Copy of this set with `column` appended, one cell per record.
    pub(crate) fn with_column(&self, column: CanonicalColumn, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), self.records.len());
        let mut next = self.clone();
        next.columns.push(ColumnKey::Canonical(column));
        for (record, cell) in next.records.iter_mut().zip(cells) {
            record.set(column, cell);
        }
        next
    }

    /// New set with the records matching `keep`, in their original order.
    pub fn select<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&EmployeeRecord) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a EmployeeRecord;
    type IntoIter = std::slice::Iter<'a, EmployeeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
