//! Dashboard Column Implementation
//!
//! A Column is an array-like random-access data container indexed by integer.
//! Each Column has a type specifying the type of every value stored, and a
//! nullability flag. Columns are append-only: once a table is shared, its
//! columns are never modified in place.

use serde::Serialize;
use std::fmt::Debug;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
}

impl ColumnType {
    /// Returns true for columns that take part in numeric aggregation.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

/// Column value enum to support multiple types
///
/// Serializes untagged, so `Int64(3)` becomes `3`, `String("a")` becomes `"a"`
/// and `Null` becomes `null`. Non-finite floats also serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    String(String),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Widens any numeric value to f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ColumnValue::Int64(v) => Some(*v as f64),
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns true if this value can be stored in a column of the given type.
    /// Null is accepted here; nullability is checked by the column.
    pub fn fits(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (ColumnValue::Null, _)
                | (ColumnValue::Int64(_), ColumnType::Int64)
                | (ColumnValue::Float64(_), ColumnType::Float64)
                | (ColumnValue::String(_), ColumnType::String)
        )
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Int64(_) => "Int64",
            ColumnValue::Float64(_) => "Float64",
            ColumnValue::String(_) => "String",
            ColumnValue::Null => "Null",
        }
    }
}

/// A typed, optionally nullable column of values.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<ColumnValue, String> {
        self.values.get(index).cloned().ok_or_else(|| {
            format!(
                "Index {} out of range [0, {}) in column '{}'",
                index,
                self.len(),
                self.name
            )
        })
    }

    /// Borrowing variant of `get` used by the chart builders.
    pub fn get_ref(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<(), String> {
        self.validate(&value)?;
        self.values.push(value);
        Ok(())
    }

    fn validate(&self, value: &ColumnValue) -> Result<(), String> {
        if value.is_null() {
            if !self.nullable {
                return Err(format!("Column '{}' is not nullable", self.name));
            }
            return Ok(());
        }
        if !value.fits(self.column_type) {
            return Err(format!(
                "Type mismatch in column '{}': expected {:?}, got {}",
                self.name,
                self.column_type,
                value.type_name()
            ));
        }
        Ok(())
    }

    /// Builds a new column holding the values at `indices`, in that order.
    /// Out-of-range indices are skipped.
    pub fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            column_type: self.column_type,
            nullable: self.nullable,
            values: indices
                .iter()
                .filter_map(|&i| self.values.get(i).cloned())
                .collect(),
        }
    }

    /// Sums the values at `indices`, skipping nulls. An Int64 column sums to
    /// Int64 and a Float64 column to Float64; an all-null selection sums to 0.
    /// Returns Null for string columns.
    pub fn sum_at(&self, indices: &[usize]) -> ColumnValue {
        let values = indices.iter().filter_map(|&i| self.values.get(i));
        match self.column_type {
            ColumnType::Int64 => {
                ColumnValue::Int64(values.filter_map(|v| v.as_i64()).sum())
            }
            ColumnType::Float64 => {
                ColumnValue::Float64(values.filter_map(|v| v.as_f64()).sum())
            }
            ColumnType::String => ColumnValue::Null,
        }
    }

    pub fn sum(&self) -> ColumnValue {
        let all: Vec<usize> = (0..self.len()).collect();
        self.sum_at(&all)
    }

    /// Smallest non-null Int64 value. Compared as integers, so values past
    /// 2^53 keep their exact magnitude.
    pub fn min_i64(&self) -> Option<i64> {
        self.values.iter().filter_map(|v| v.as_i64()).min()
    }

    /// Largest non-null Int64 value.
    pub fn max_i64(&self) -> Option<i64> {
        self.values.iter().filter_map(|v| v.as_i64()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_append_and_get() {
        let mut col = Column::new("cases".to_string(), ColumnType::Int64, false);
        col.append(ColumnValue::Int64(10)).unwrap();
        col.append(ColumnValue::Int64(20)).unwrap();

        assert_eq!(col.len(), 2);
        assert_eq!(col.get(1).unwrap().as_i64(), Some(20));
        assert!(col.get(2).is_err());
    }

    #[test]
    fn test_column_rejects_type_mismatch() {
        let mut col = Column::new("country".to_string(), ColumnType::String, false);
        let err = col.append(ColumnValue::Int64(1)).unwrap_err();
        assert!(err.contains("Type mismatch"));
        assert!(col.is_empty());
    }

    #[test]
    fn test_column_null_handling() {
        let mut required = Column::new("population".to_string(), ColumnType::Int64, false);
        assert!(required.append(ColumnValue::Null).is_err());

        let mut optional = Column::new("total_tests".to_string(), ColumnType::Int64, true);
        optional.append(ColumnValue::Null).unwrap();
        assert!(optional.get(0).unwrap().is_null());
    }

    #[test]
    fn test_column_sum_skips_nulls() {
        let mut col = Column::new("total_tests".to_string(), ColumnType::Int64, true);
        col.append(ColumnValue::Int64(5)).unwrap();
        col.append(ColumnValue::Null).unwrap();
        col.append(ColumnValue::Int64(7)).unwrap();

        assert_eq!(col.sum(), ColumnValue::Int64(12));
        assert_eq!(col.sum_at(&[1]), ColumnValue::Int64(0));
        assert_eq!(col.sum_at(&[0, 2]), ColumnValue::Int64(12));
    }

    #[test]
    fn test_column_take_and_extremes() {
        let mut col = Column::new("school".to_string(), ColumnType::Float64, true);
        col.append(ColumnValue::Float64(12.5)).unwrap();
        col.append(ColumnValue::Null).unwrap();
        col.append(ColumnValue::Float64(9.0)).unwrap();

        let taken = col.take(&[2, 0]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.get(0).unwrap().as_f64(), Some(9.0));

        assert_eq!(col.min_i64(), None);

        let mut pop = Column::new("population".to_string(), ColumnType::Int64, true);
        pop.append(ColumnValue::Int64(9_007_199_254_740_993)).unwrap();
        pop.append(ColumnValue::Null).unwrap();
        pop.append(ColumnValue::Int64(9_007_199_254_740_992)).unwrap();
        assert_eq!(pop.min_i64(), Some(9_007_199_254_740_992));
        assert_eq!(pop.max_i64(), Some(9_007_199_254_740_993));
        assert_eq!(Column::new("x".to_string(), ColumnType::Int64, false).min_i64(), None);
    }

    #[test]
    fn test_column_value_serializes_plainly() {
        let values = vec![
            ColumnValue::Int64(3),
            ColumnValue::String("High income".to_string()),
            ColumnValue::Null,
            ColumnValue::Float64(f64::NAN),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[3,"High income",null,null]"#);
    }
}
