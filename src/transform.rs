//! Derived tables built from the base table.
//!
//! Every function here returns a fresh table; inputs are never modified.

use crate::column::{ColumnType, ColumnValue};
use crate::dataset::{covid_schema, COUNTRY, INCOME_GROUP, POPULATION};
use crate::error::{DashboardError, Result};
use crate::table::{Schema, Table};
use crate::view::{FilterView, GroupSumView};
use std::collections::HashSet;
use std::sync::Arc;

/// Countries whose population dwarfs the rest of the dataset.
pub const OUTLIER_COUNTRIES: [&str; 4] = ["Brazil", "United States", "India", "China"];

pub fn outlier_set() -> HashSet<String> {
    OUTLIER_COUNTRIES.iter().map(|c| c.to_string()).collect()
}

/// Keeps the records whose country is not in `excluded_names`, in order.
pub fn exclude_outliers(table: &Arc<Table>, excluded_names: &HashSet<String>) -> Table {
    let excluded = excluded_names.clone();
    FilterView::new("outliers_excluded".to_string(), Arc::clone(table), move |row| {
        match row.get(COUNTRY).and_then(|v| v.as_string()) {
            Some(country) => !excluded.contains(country),
            None => true,
        }
    })
    .materialize()
}

/// Keeps the records with `population <= ceiling`, in order.
pub fn filter_by_population(table: &Arc<Table>, ceiling: i64) -> Table {
    FilterView::new("population_filtered".to_string(), Arc::clone(table), move |row| {
        matches!(row.get(POPULATION), Some(ColumnValue::Int64(p)) if *p <= ceiling)
    })
    .materialize()
}

/// Sums every numeric column per income group, one row per group, sorted
/// ascending by group name. An empty input yields an empty aggregate table.
pub fn aggregate_by_income(table: &Table) -> Table {
    match sum_by_group(table, INCOME_GROUP) {
        Ok(aggregated) => aggregated,
        Err(DashboardError::EmptyGroup) => {
            log::debug!("No rows to aggregate in '{}'", table.name());
            empty_aggregate(table)
        }
        Err(err) => {
            log::warn!("Aggregation of '{}' failed: {}", table.name(), err);
            empty_aggregate(table)
        }
    }
}

fn sum_by_group(table: &Table, group_column: &str) -> Result<Table> {
    if table.is_empty() {
        return Err(DashboardError::EmptyGroup);
    }
    let view = GroupSumView::new("income_aggregate".to_string(), table, group_column)
        .map_err(DashboardError::DataUnavailable)?;
    log::debug!("Grouped '{}' by {}: {:?}", table.name(), group_column, view.keys());
    view.to_table().map_err(DashboardError::DataUnavailable)
}

fn empty_aggregate(table: &Table) -> Table {
    // same column layout a non-empty aggregation would produce
    let mut columns = vec![(INCOME_GROUP.to_string(), ColumnType::String, false)];
    let source = if table.column(INCOME_GROUP).is_some() {
        table.schema().clone()
    } else {
        covid_schema()
    };
    for i in 0..source.len() {
        if let Some((name, ty, _)) = source.get_column_info(i) {
            if ty.is_numeric() {
                columns.push((name.to_string(), ty, false));
            }
        }
    }
    Table::new("income_aggregate".to_string(), Schema::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TOTAL_CASES;
    use std::collections::HashMap;

    fn record(country: &str, income: &str, population: i64, cases: i64) -> HashMap<String, ColumnValue> {
        let mut row = HashMap::new();
        row.insert(COUNTRY.to_string(), ColumnValue::String(country.to_string()));
        row.insert(POPULATION.to_string(), ColumnValue::Int64(population));
        row.insert(TOTAL_CASES.to_string(), ColumnValue::Int64(cases));
        row.insert(INCOME_GROUP.to_string(), ColumnValue::String(income.to_string()));
        row
    }

    fn table_of(rows: Vec<HashMap<String, ColumnValue>>) -> Arc<Table> {
        Arc::new(Table::from_rows("covid".to_string(), covid_schema(), rows).unwrap())
    }

    fn countries(table: &Table) -> Vec<String> {
        table
            .iter()
            .map(|r| r.get(COUNTRY).unwrap().as_string().unwrap().to_string())
            .collect()
    }

    #[test]
    fn exclude_outliers_keeps_only_other_countries() {
        let table = table_of(vec![
            record("Brazil", "Upper middle income", 212_000_000, 1),
            record("United States", "High income", 331_000_000, 1),
            record("India", "Lower middle income", 1_380_000_000, 1),
            record("China", "Upper middle income", 1_439_323_776, 1),
            record("Canada", "High income", 37_742_154, 1),
        ]);

        let result = exclude_outliers(&table, &outlier_set());
        assert_eq!(countries(&result), vec!["Canada"]);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn exclude_outliers_preserves_order_and_allows_empty() {
        let table = table_of(vec![
            record("Peru", "Upper middle income", 33_000_000, 1),
            record("India", "Lower middle income", 1_380_000_000, 1),
            record("Chad", "Low income", 16_000_000, 1),
        ]);
        let result = exclude_outliers(&table, &outlier_set());
        assert_eq!(countries(&result), vec!["Peru", "Chad"]);

        let only_outliers = table_of(vec![record("China", "Upper middle income", 1, 1)]);
        assert!(exclude_outliers(&only_outliers, &outlier_set()).is_empty());
    }

    #[test]
    fn filter_by_population_is_inclusive() {
        let table = table_of(vec![
            record("A", "Low income", 100, 1),
            record("B", "Low income", 200, 1),
            record("C", "Low income", 300, 1),
        ]);

        assert_eq!(countries(&filter_by_population(&table, 200)), vec!["A", "B"]);
        assert!(filter_by_population(&table, 99).is_empty());
        assert_eq!(filter_by_population(&table, i64::MAX).len(), 3);
    }

    #[test]
    fn aggregate_by_income_sums_per_group() {
        let table = table_of(vec![
            record("A", "Low income", 1, 10),
            record("B", "High income", 1, 5),
            record("C", "Low income", 1, 20),
        ]);

        let aggregated = aggregate_by_income(&table);
        assert_eq!(aggregated.len(), 2);
        assert_eq!(
            aggregated.get_value(0, INCOME_GROUP).unwrap().as_string(),
            Some("High income")
        );
        assert_eq!(aggregated.get_value(0, TOTAL_CASES).unwrap().as_i64(), Some(5));
        assert_eq!(
            aggregated.get_value(1, INCOME_GROUP).unwrap().as_string(),
            Some("Low income")
        );
        assert_eq!(aggregated.get_value(1, TOTAL_CASES).unwrap().as_i64(), Some(30));
    }

    #[test]
    fn aggregate_of_empty_table_is_empty_not_error() {
        let table = table_of(vec![]);
        let aggregated = aggregate_by_income(&table);
        assert!(aggregated.is_empty());
        assert!(aggregated.column(TOTAL_CASES).is_some());
        assert!(aggregated.column(INCOME_GROUP).is_some());
        assert!(matches!(
            sum_by_group(&table, INCOME_GROUP),
            Err(DashboardError::EmptyGroup)
        ));
    }
}
