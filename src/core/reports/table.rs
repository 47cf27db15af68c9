//! Tabular report output: ordered rows of typed cells
//!
//! The reports stop here; turning a [`ReportTable`] into bytes is the
//! exporter's job.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Decimal> for Cell {
    fn from(n: Decimal) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Detail,
    Subtotal,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push(&mut self, kind: RowKind, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(ReportRow { kind, cells });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` under the column headed `column`
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.cells.get(col)
    }

    /// First row whose leading cell reads `label`
    pub fn find_row(&self, label: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.cells.first().and_then(Cell::as_text) == Some(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_push_pads_rows() {
        let mut table = ReportTable::new("t", vec!["A".into(), "B".into(), "C".into()]);
        table.push(RowKind::Detail, vec!["x".into()]);
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.get(0, "C"), Some(&Cell::Empty));
    }

    #[test]
    fn test_lookup_by_label_and_column() {
        let mut table = ReportTable::new("t", vec!["Name".into(), "Hours".into()]);
        table.push(RowKind::Detail, vec!["Ada".into(), dec!(8).into()]);
        table.push(RowKind::Total, vec!["Total".into(), dec!(8).into()]);

        let row = table.find_row("Total").unwrap();
        assert_eq!(row, 1);
        assert_eq!(table.get(row, "Hours").and_then(Cell::as_number), Some(dec!(8)));
        assert_eq!(table.get(row, "Missing"), None);
    }

    #[test]
    fn test_cell_json_shape() {
        let json = serde_json::to_string(&Cell::Number(dec!(1.5))).unwrap();
        assert_eq!(json, r#"{"type":"number","value":"1.5"}"#);
        let json = serde_json::to_string(&Cell::Empty).unwrap();
        assert_eq!(json, r#"{"type":"empty"}"#);
    }
}
