pub use crate::config::*;

/// A builder for respondent tables.
///
/// Columns can be added one at a time, or the header can be given first and
/// the respondents added row by row, which is what the file readers do.
///
/// ```
/// use turf_engine::builder::TableBuilder;
/// use turf_engine::{TurfError, Value};
///
/// let table = TableBuilder::new()
///     .column("Coffee", vec![1, 0, 1])?
///     .column("Tea", vec![Value::Number(0.0), Value::Missing, Value::Number(1.0)])?
///     .build();
///
/// assert_eq!(table.num_rows(), 3);
/// assert_eq!(table.column_names(), ["Coffee", "Tea"]);
///
/// # Ok::<(), TurfError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    pub(crate) _names: Vec<String>,
    pub(crate) _columns: Vec<Vec<Value>>,
    pub(crate) _num_rows: usize,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder::default()
    }

    /// Starts a table with the given column names and no rows.
    pub fn from_header(names: &[String]) -> Result<TableBuilder, TurfError> {
        let mut builder = TableBuilder::new();
        for name in names {
            builder.add_column(name, Vec::new())?;
        }
        Ok(builder)
    }

    pub fn column<V: Into<Value>>(
        mut self,
        name: &str,
        values: Vec<V>,
    ) -> Result<TableBuilder, TurfError> {
        self.add_column(name, values.into_iter().map(|v| v.into()).collect())?;
        Ok(self)
    }

    /// Adds a column.
    ///
    /// The name must be new, and the number of values must match the columns
    /// already present.
    pub fn add_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), TurfError> {
        if self._names.iter().any(|n| n == name) {
            return Err(TurfError::MalformedTable {
                message: format!("duplicate column name {:?}", name),
            });
        }
        if !self._names.is_empty() && values.len() != self._num_rows {
            return Err(TurfError::MalformedTable {
                message: format!(
                    "column {:?} has {} values, the other columns have {}",
                    name,
                    values.len(),
                    self._num_rows
                ),
            });
        }
        self._num_rows = values.len();
        self._names.push(name.to_string());
        self._columns.push(values);
        Ok(())
    }

    /// Adds one respondent. The values follow the column order.
    pub fn add_row(&mut self, row: Vec<Value>) -> Result<(), TurfError> {
        if row.len() != self._names.len() {
            return Err(TurfError::MalformedTable {
                message: format!(
                    "row {} has {} values for {} columns",
                    self._num_rows + 1,
                    row.len(),
                    self._names.len()
                ),
            });
        }
        for (col, v) in self._columns.iter_mut().zip(row) {
            col.push(v);
        }
        self._num_rows += 1;
        Ok(())
    }

    pub fn build(self) -> RespondentTable {
        RespondentTable {
            names: self._names,
            columns: self._columns,
            num_rows: self._num_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_columns_agree() {
        let mut builder = TableBuilder::from_header(&["A".to_string(), "B".to_string()]).unwrap();
        builder.add_row(vec![Value::from(1), Value::Missing]).unwrap();
        builder.add_row(vec![Value::from("x"), Value::from(0.5)]).unwrap();
        let table = builder.build();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.column("B").unwrap(),
            &[Value::Missing, Value::Number(0.5)]
        );
        assert!(table.column("C").is_none());
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let res = TableBuilder::new()
            .column("A", vec![1, 0])
            .and_then(|b| b.column("B", vec![1]));
        assert!(matches!(res, Err(TurfError::MalformedTable { .. })));
    }

    #[test]
    fn short_rows_are_rejected() {
        let mut builder = TableBuilder::from_header(&["A".to_string(), "B".to_string()]).unwrap();
        let res = builder.add_row(vec![Value::from(1)]);
        assert!(matches!(res, Err(TurfError::MalformedTable { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let res = TableBuilder::new()
            .column("A", vec![1])
            .and_then(|b| b.column("A", vec![0]));
        assert!(matches!(res, Err(TurfError::MalformedTable { .. })));
    }
}
