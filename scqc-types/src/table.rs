use crate::error::QcError;
use serde::{Deserialize, Serialize};

/// A single typed metadata column.
///
/// Metadata in the source ecosystem is an attribute bag of arbitrary named
/// columns; here that maps to an explicit name -> typed data pairing with no
/// reflection involved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Continuous values
    F64(Vec<f64>),
    /// Counts
    Int(Vec<i64>),
    /// Boolean flags
    Bool(Vec<bool>),
    /// Categorical labels
    Str(Vec<String>),
}

impl Column {
    /// Number of rows held by the column.
    pub fn len(&self) -> usize {
        match self {
            Column::F64(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    /// True if the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the column. `Int` columns are widened to `f64`;
    /// boolean and categorical columns return `None`.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::F64(v) => Some(v.clone()),
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Bool(_) | Column::Str(_) => None,
        }
    }

    /// Boolean view of the column, if it holds flags.
    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Column::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn select_rows(&self, rows: &[usize]) -> Column {
        match self {
            Column::F64(v) => Column::F64(rows.iter().map(|&r| v[r]).collect()),
            Column::Int(v) => Column::Int(rows.iter().map(|&r| v[r]).collect()),
            Column::Bool(v) => Column::Bool(rows.iter().map(|&r| v[r]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

/// Per-sample or per-feature metadata: an ordered mapping from column name
/// to typed column data, all columns sharing one row count.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaTable {
    n_rows: usize,
    columns: Vec<(String, Column)>,
}

impl MetaTable {
    /// An empty table with a fixed row count.
    pub fn new(n_rows: usize) -> MetaTable {
        MetaTable {
            n_rows,
            columns: Vec::new(),
        }
    }

    /// Row count shared by every column.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Insert a column, overwriting any column of the same name in place.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<(), QcError> {
        if column.len() != self.n_rows {
            return Err(QcError::DimensionMismatch {
                name: name.to_string(),
                expected: self.n_rows,
                actual: column.len(),
            });
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name.to_string(), column)),
        }
        Ok(())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// True if a column of this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Subset the table to the given rows, in the given order. Every column
    /// is carried over verbatim. Panics if a row index is out of range; the
    /// container validates indices before calling this.
    pub fn select_rows(&self, rows: &[usize]) -> MetaTable {
        MetaTable {
            n_rows: rows.len(),
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.select_rows(rows)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut t = MetaTable::new(3);
        t.set_column("total", Column::F64(vec![1.0, 2.0, 3.0])).unwrap();
        t.set_column("flag", Column::Bool(vec![true, false, true])).unwrap();
        assert_eq!(t.n_columns(), 2);
        assert!(t.has_column("total"));
        assert_eq!(t.column("total").unwrap().as_f64().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(t.column("flag").unwrap().as_bool().unwrap(), &[true, false, true]);
        assert!(t.column("missing").is_none());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut t = MetaTable::new(2);
        t.set_column("a", Column::Int(vec![1, 2])).unwrap();
        t.set_column("b", Column::Int(vec![3, 4])).unwrap();
        t.set_column("a", Column::F64(vec![9.0, 9.0])).unwrap();
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t.column("a").unwrap().as_f64().unwrap(), vec![9.0, 9.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let mut t = MetaTable::new(2);
        let err = t.set_column("a", Column::Int(vec![1, 2, 3])).unwrap_err();
        assert_eq!(
            err,
            QcError::DimensionMismatch {
                name: "a".to_string(),
                expected: 2,
                actual: 3,
            }
        );
        assert_eq!(t.n_columns(), 0);
    }

    #[test]
    fn test_select_rows() {
        let mut t = MetaTable::new(3);
        t.set_column("x", Column::Str(vec!["a".into(), "b".into(), "c".into()]))
            .unwrap();
        t.set_column("y", Column::F64(vec![0.5, 1.5, 2.5])).unwrap();
        let sub = t.select_rows(&[2, 0]);
        assert_eq!(sub.n_rows(), 2);
        assert_eq!(
            sub.column("x").unwrap(),
            &Column::Str(vec!["c".to_string(), "a".to_string()])
        );
        assert_eq!(sub.column("y").unwrap().as_f64().unwrap(), vec![2.5, 0.5]);
    }

    #[test]
    fn test_int_widens_to_f64() {
        let c = Column::Int(vec![1, 2, 3]);
        assert_eq!(c.as_f64().unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(Column::Str(vec![]).as_f64().is_none());
    }
}
