//! Columnar table: an ordered list of equally long named columns.
//!
//! The table is the caller-owned side of every conversion. Encoding only reads
//! it (through [`Table::rows`]); decoding builds a fresh one row by row.

use crate::error::{Error, Result};
use crate::value::Value;

/// One named column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

/// A borrowed view of one table row, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    entries: Vec<(&'a str, &'a Value)>,
}

impl<'a> Row<'a> {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a Value)> for Row<'a> {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from ready-made columns.
    ///
    /// # Errors
    /// `SchemaMismatch` if the columns differ in length or a name repeats.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |c| c.values.len());
        for (i, col) in columns.iter().enumerate() {
            if col.values.len() != num_rows {
                return Err(Error::schema_mismatch(format!(
                    "column '{}' has {} values, expected {num_rows}",
                    col.name,
                    col.values.len()
                )));
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::schema_mismatch(format!(
                    "duplicate column '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Build a table from rows given as `(column, value)` pairs.
    ///
    /// Columns appear in first-seen order; cells a row does not mention are `Null`.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Declare a column up front (no-op if it already exists). Existing rows get `Null`.
    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.column_index(&name).is_none() {
            self.columns
                .push(Column::new(name, vec![Value::Null; self.num_rows]));
        }
    }

    /// Append one row. Unknown column names extend the table.
    pub fn push_row<R, S>(&mut self, row: R)
    where
        R: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        for col in &mut self.columns {
            col.values.push(Value::Null);
        }
        self.num_rows += 1;
        for (name, value) in row {
            let name = name.into();
            let idx = match self.column_index(&name) {
                Some(idx) => idx,
                None => {
                    self.columns
                        .push(Column::new(name, vec![Value::Null; self.num_rows]));
                    self.columns.len() - 1
                }
            };
            self.columns[idx].values[self.num_rows - 1] = value;
        }
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Row `idx`, or `None` past the end.
    #[must_use]
    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        (idx < self.num_rows).then(|| {
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), &c.values[idx]))
                .collect()
        })
    }

    /// Lazily iterate rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.num_rows).filter_map(move |idx| self.row(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_backfills_new_columns() {
        let mut t = Table::new();
        t.push_row([("a", Value::Int(1))]);
        t.push_row([("a", Value::Int(2)), ("b", Value::from("x"))]);

        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t.column("b").unwrap().values, vec![Value::Null, Value::from("x")]);
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![Value::Int(1)]),
            Column::new("b", vec![]),
        ])
        .unwrap_err();
        assert!(err.message.contains("'b'"));
    }

    #[test]
    fn test_rows_follow_column_order() {
        let t = Table::from_rows(vec![vec![("z", Value::Int(1)), ("a", Value::Int(2))]]);
        let row = t.row(0).unwrap();
        let names: Vec<_> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(row.get("a"), Some(&Value::Int(2)));
        assert!(t.row(1).is_none());
    }
}
