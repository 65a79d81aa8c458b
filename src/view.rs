//! Dashboard View Implementation
//!
//! Views are read-only derived tables computed from a parent table.
//! A view never writes to its parent; its results are materialized into a
//! fresh `Table` so that every recomputation produces a new derived table.

use crate::column::{Column, ColumnType, ColumnValue};
use crate::table::{Schema, Table};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A FilterView filters rows from the parent table based on a predicate.
/// Maintains a mapping from view indices to parent indices, in parent order.
pub struct FilterView {
    name: String,
    parent: Arc<Table>,
    predicate: Box<dyn Fn(&HashMap<String, ColumnValue>) -> bool>,
    view_to_parent: Vec<usize>,
}

impl FilterView {
    pub fn new<F>(name: String, parent: Arc<Table>, predicate: F) -> Self
    where
        F: Fn(&HashMap<String, ColumnValue>) -> bool + 'static,
    {
        let mut view = FilterView {
            name,
            parent,
            predicate: Box::new(predicate),
            view_to_parent: Vec::new(),
        };
        view.rebuild_index();
        view
    }

    fn rebuild_index(&mut self) {
        self.view_to_parent = self
            .parent
            .iter()
            .enumerate()
            .filter(|(_, row)| (self.predicate)(row))
            .map(|(i, _)| i)
            .collect();
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    pub fn get_row(&self, index: usize) -> Result<HashMap<String, ColumnValue>, String> {
        if index >= self.view_to_parent.len() {
            return Err(format!("Index {} out of range [0, {})", index, self.len()));
        }
        let parent_index = self.view_to_parent[index];
        self.parent.get_row(parent_index)
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue, String> {
        if row >= self.view_to_parent.len() {
            return Err(format!("Row {} out of range [0, {})", row, self.len()));
        }
        let parent_index = self.view_to_parent[row];
        self.parent.get_value(parent_index, column)
    }

    /// Parent row indices selected by the predicate.
    pub fn parent_indices(&self) -> &[usize] {
        &self.view_to_parent
    }

    /// Copies the selected rows into a new table named after the view.
    pub fn materialize(&self) -> Table {
        self.parent.take_rows(self.name.clone(), self.parent_indices())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A GroupSumView groups the parent's rows by a string key column and sums
/// every numeric column within each group.
///
/// Groups are ordered ascending by key. Nulls in the key column form no group;
/// nulls in numeric columns are skipped by the sum. Non-numeric columns other
/// than the key are not carried into the result.
pub struct GroupSumView {
    name: String,
    group_column: String,
    schema: Schema,
    groups: BTreeMap<String, Vec<ColumnValue>>,
}

impl GroupSumView {
    pub fn new(name: String, parent: &Table, group_column: &str) -> Result<Self, String> {
        let key_col = parent
            .column(group_column)
            .ok_or_else(|| format!("Column '{}' not found in parent table", group_column))?;
        if key_col.column_type() != ColumnType::String {
            return Err(format!(
                "Group column '{}' must be a String column, found {:?}",
                group_column,
                key_col.column_type()
            ));
        }

        let numeric: Vec<&Column> = parent
            .numeric_column_names()
            .into_iter()
            .filter_map(|n| parent.column(n))
            .collect();

        let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for i in 0..parent.len() {
            if let Some(key) = key_col.get_ref(i).and_then(|v| v.as_string()) {
                members.entry(key.to_string()).or_default().push(i);
            }
        }

        let groups = members
            .into_iter()
            .map(|(key, rows)| {
                let sums = numeric.iter().map(|col| col.sum_at(&rows)).collect();
                (key, sums)
            })
            .collect();

        let mut schema_columns = vec![(group_column.to_string(), ColumnType::String, false)];
        schema_columns.extend(
            numeric
                .iter()
                .map(|col| (col.name().to_string(), col.column_type(), false)),
        );

        Ok(GroupSumView {
            name,
            group_column: group_column.to_string(),
            schema: Schema::new(schema_columns),
            groups,
        })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group keys in result order.
    pub fn keys(&self) -> Vec<&str> {
        self.groups.keys().map(|k| k.as_str()).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materializes one row per group into a new table.
    pub fn to_table(&self) -> Result<Table, String> {
        let names: Vec<&str> = self.schema.get_column_names();
        let rows = self.groups.iter().map(|(key, sums)| {
            let mut row = HashMap::with_capacity(names.len());
            row.insert(self.group_column.clone(), ColumnValue::String(key.clone()));
            for (name, value) in names.iter().skip(1).zip(sums) {
                row.insert(name.to_string(), value.clone());
            }
            row
        });
        Table::from_rows(self.name.clone(), self.schema.clone(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Arc<Table> {
        let schema = Schema::new(vec![
            ("country".to_string(), ColumnType::String, false),
            ("income_group".to_string(), ColumnType::String, false),
            ("population".to_string(), ColumnType::Int64, false),
            ("total_cases".to_string(), ColumnType::Int64, true),
            ("expected_years_of_school".to_string(), ColumnType::Float64, true),
        ]);

        let data = [
            ("Chad", "Low income", 16_000_000, Some(10), 7.5),
            ("Norway", "High income", 5_400_000, Some(5), 18.0),
            ("Niger", "Low income", 24_000_000, Some(20), 6.5),
            ("Peru", "Upper middle income", 33_000_000, None, 13.0),
        ];

        let rows = data.iter().map(|(country, income, pop, cases, school)| {
            let mut row = HashMap::new();
            row.insert("country".to_string(), ColumnValue::String(country.to_string()));
            row.insert("income_group".to_string(), ColumnValue::String(income.to_string()));
            row.insert("population".to_string(), ColumnValue::Int64(*pop));
            row.insert(
                "total_cases".to_string(),
                cases.map_or(ColumnValue::Null, ColumnValue::Int64),
            );
            row.insert("expected_years_of_school".to_string(), ColumnValue::Float64(*school));
            row
        });

        Arc::new(Table::from_rows("covid".to_string(), schema, rows).unwrap())
    }

    #[test]
    fn test_filter_view() {
        let table = sample_table();

        let view = FilterView::new("small".to_string(), table.clone(), |row| {
            matches!(row.get("population"), Some(ColumnValue::Int64(p)) if *p <= 20_000_000)
        });

        assert_eq!(view.len(), 2);
        assert_eq!(view.parent_indices(), &[0, 1]);
        assert_eq!(view.get_value(0, "country").unwrap().as_string(), Some("Chad"));
        assert_eq!(view.get_value(1, "country").unwrap().as_string(), Some("Norway"));
        assert!(view.get_row(2).is_err());
    }

    #[test]
    fn test_filter_view_materialize() {
        let table = sample_table();
        let view = FilterView::new("none".to_string(), table.clone(), |_| false);

        assert!(view.is_empty());
        let materialized = view.materialize();
        assert_eq!(materialized.name(), "none");
        assert!(materialized.is_empty());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_group_sum_view_sorted_groups() {
        let table = sample_table();
        let view = GroupSumView::new("by_income".to_string(), &table, "income_group").unwrap();

        assert_eq!(
            view.keys(),
            vec!["High income", "Low income", "Upper middle income"]
        );

        let grouped = view.to_table().unwrap();
        assert_eq!(grouped.len(), 3);
        assert_eq!(
            grouped.schema().get_column_names(),
            vec![
                "income_group",
                "population",
                "total_cases",
                "expected_years_of_school"
            ]
        );
        assert_eq!(grouped.get_value(1, "total_cases").unwrap().as_i64(), Some(30));
        assert_eq!(grouped.get_value(1, "population").unwrap().as_i64(), Some(40_000_000));
        assert_eq!(grouped.get_value(1, "expected_years_of_school").unwrap().as_f64(), Some(14.0));
        // all-null group sums to zero
        assert_eq!(grouped.get_value(2, "total_cases").unwrap().as_i64(), Some(0));
        assert!(grouped.column("country").is_none());
    }

    #[test]
    fn test_group_sum_view_rejects_bad_key() {
        let table = sample_table();
        assert!(GroupSumView::new("x".to_string(), &table, "continent").is_err());
        assert!(GroupSumView::new("x".to_string(), &table, "population").is_err());
    }
}
