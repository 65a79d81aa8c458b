//! Dashboard Table Implementation
//!
//! A Table is a collection of columns with a schema.
//! Provides row-level construction and query operations. Tables are built by
//! appending rows and are never modified after they are shared; derived tables
//! are produced as fresh tables by views and `take_rows`.
//!
//! # Examples
//!
//! ```
//! use covid_dashboard::{Table, Schema, ColumnType, ColumnValue};
//! use std::collections::HashMap;
//!
//! let schema = Schema::new(vec![
//!     ("country".to_string(), ColumnType::String, false),
//!     ("population".to_string(), ColumnType::Int64, false),
//! ]);
//!
//! let mut table = Table::new("countries".to_string(), schema);
//!
//! let mut row = HashMap::new();
//! row.insert("country".to_string(), ColumnValue::String("Chile".to_string()));
//! row.insert("population".to_string(), ColumnValue::Int64(19_116_201));
//! table.append_row(row).unwrap();
//!
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.get_value(0, "country").unwrap().as_string(), Some("Chile"));
//! ```

use crate::column::{Column, ColumnType, ColumnValue};
use std::collections::HashMap;

/// Schema definition with column names and types.
///
/// A schema defines the structure of a table, specifying the name, type,
/// and nullability of each column.
///
/// # Examples
///
/// ```
/// use covid_dashboard::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("country".to_string(), ColumnType::String, false),
///     ("total_tests".to_string(), ColumnType::Int64, true),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("total_tests"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    /// Creates a new schema with the specified columns.
    ///
    /// # Arguments
    ///
    /// * `columns` - Vector of tuples: (column_name, column_type, is_nullable)
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    /// Returns the number of columns in the schema.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns a list of all column names.
    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Returns the index of a column by name, or None if not found.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// Returns information about a column at the given index.
    ///
    /// Returns a tuple of (name, type, nullable) or None if index is out of bounds.
    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType, bool)> {
        self.columns.get(index).map(|(name, ty, nullable)| (name.as_str(), *ty, *nullable))
    }

    fn iter(&self) -> impl Iterator<Item = &(String, ColumnType, bool)> {
        self.columns.iter()
    }
}

/// Root table owning its data.
///
/// A Table is a collection of typed columns that can be queried. Views borrow
/// a table through an `Arc` and materialize their results into new tables.
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create a new, empty table for the given schema.
    pub fn new(name: String, schema: Schema) -> Self {
        let columns = schema
            .iter()
            .map(|(col_name, col_type, nullable)| Column::new(col_name.clone(), *col_type, *nullable))
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Build a table from a list of rows, failing on the first invalid row.
    pub fn from_rows(
        name: String,
        schema: Schema,
        rows: impl IntoIterator<Item = HashMap<String, ColumnValue>>,
    ) -> Result<Self, String> {
        let mut table = Table::new(name, schema);
        for (i, row) in rows.into_iter().enumerate() {
            table.append_row(row).map_err(|e| format!("Row {}: {}", i, e))?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the column with the given name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.get_column_index(name).map(|i| &self.columns[i])
    }

    /// Names of the Int64 and Float64 columns, in schema order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.column_type().is_numeric())
            .map(|c| c.name())
            .collect()
    }

    /// Append a row to the end of the table.
    ///
    /// Every schema column is validated before any column is written, so a
    /// rejected row leaves the table unchanged. Missing columns are stored as
    /// Null (and rejected when the column is not nullable). Keys not present in
    /// the schema are ignored.
    pub fn append_row(&mut self, row: HashMap<String, ColumnValue>) -> Result<(), String> {
        let mut staged = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let value = row.get(col.name()).cloned().unwrap_or(ColumnValue::Null);
            if value.is_null() && !col.is_nullable() {
                return Err(format!("Column '{}' is not nullable", col.name()));
            }
            if !value.fits(col.column_type()) {
                return Err(format!(
                    "Type mismatch in column '{}': expected {:?}, got {:?}",
                    col.name(),
                    col.column_type(),
                    value
                ));
            }
            staged.push(value);
        }

        for (col, value) in self.columns.iter_mut().zip(staged) {
            col.append(value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    pub fn get_row(&self, index: usize) -> Result<HashMap<String, ColumnValue>, String> {
        if index >= self.row_count {
            return Err(format!("Index {} out of range [0, {})", index, self.row_count));
        }

        let mut row = HashMap::with_capacity(self.columns.len());
        for col in &self.columns {
            row.insert(col.name().to_string(), col.get(index)?);
        }
        Ok(row)
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue, String> {
        if row >= self.row_count {
            return Err(format!("Row {} out of range [0, {})", row, self.row_count));
        }
        let col = self
            .column(column)
            .ok_or_else(|| format!("Column '{}' not found", column))?;
        col.get(row)
    }

    /// Smallest non-null value of an Int64 column.
    pub fn min_i64(&self, column: &str) -> Option<i64> {
        self.column(column).and_then(|c| c.min_i64())
    }

    /// Largest non-null value of an Int64 column.
    pub fn max_i64(&self, column: &str) -> Option<i64> {
        self.column(column).and_then(|c| c.max_i64())
    }

    /// Creates a new table holding the rows at `indices`, in that order.
    pub fn take_rows(&self, name: String, indices: &[usize]) -> Table {
        let columns: Vec<Column> = self.columns.iter().map(|c| c.take(indices)).collect();
        let row_count = columns.first().map_or(0, |c| c.len());
        Table {
            name,
            schema: self.schema.clone(),
            columns,
            row_count,
        }
    }

    pub fn iter(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = HashMap<String, ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.row_count {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}
