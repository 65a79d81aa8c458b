//! Dataset loader.
//!
//! Fetches the per-country COVID-19 CSV once at startup and parses it into the
//! base table. Any failure is reported as `DashboardError::DataUnavailable`.

use crate::column::{ColumnType, ColumnValue};
use crate::error::{DashboardError, Result};
use crate::table::{Schema, Table};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

pub const DATASET_URL: &str = concat!(
    "https://gist.githubusercontent.com/ThiagoFPMR/",
    "fea32b8082a54889ba7470ac63252299/raw/",
    "aea145700257ffa89d924073189a0e3804bd987c/",
    "covid_worldwide.csv"
);

const MAX_DATASET_BYTES: usize = 16 * 1024 * 1024;

pub const COUNTRY: &str = "country";
pub const POPULATION: &str = "population";
pub const TOTAL_CASES: &str = "total_cases";
pub const TOTAL_TESTS: &str = "total_tests";
pub const TOTAL_DEATHS: &str = "total_deaths";
pub const TOTAL_RECOVERED: &str = "total_recovered";
pub const INCOME_GROUP: &str = "income_group";
pub const EXPECTED_YEARS_OF_SCHOOL: &str = "expected_years_of_school";

/// Schema of the base table, in column order.
pub fn covid_schema() -> Schema {
    Schema::new(vec![
        (COUNTRY.to_string(), ColumnType::String, false),
        (POPULATION.to_string(), ColumnType::Int64, false),
        (TOTAL_CASES.to_string(), ColumnType::Int64, true),
        (TOTAL_TESTS.to_string(), ColumnType::Int64, true),
        (TOTAL_DEATHS.to_string(), ColumnType::Int64, true),
        (TOTAL_RECOVERED.to_string(), ColumnType::Int64, true),
        (INCOME_GROUP.to_string(), ColumnType::String, false),
        (EXPECTED_YEARS_OF_SCHOOL.to_string(), ColumnType::Float64, true),
    ])
}

/// One CSV line. Counts are read as floats because the published file is
/// not consistent about writing `1234` versus `1234.0`.
#[derive(Debug, Deserialize)]
struct CovidRecord {
    country: String,
    population: f64,
    total_cases: Option<f64>,
    total_tests: Option<f64>,
    total_deaths: Option<f64>,
    total_recovered: Option<f64>,
    income_group: String,
    expected_years_of_school: Option<f64>,
}

impl CovidRecord {
    fn into_row(self, line: usize) -> Result<HashMap<String, ColumnValue>> {
        let population = count(POPULATION, Some(self.population), line)?;
        if population.is_null() {
            return Err(DashboardError::DataUnavailable(format!(
                "line {line}: population is required"
            )));
        }

        let mut row = HashMap::with_capacity(8);
        row.insert(COUNTRY.to_string(), ColumnValue::String(self.country));
        row.insert(POPULATION.to_string(), population);
        row.insert(TOTAL_CASES.to_string(), count(TOTAL_CASES, self.total_cases, line)?);
        row.insert(TOTAL_TESTS.to_string(), count(TOTAL_TESTS, self.total_tests, line)?);
        row.insert(TOTAL_DEATHS.to_string(), count(TOTAL_DEATHS, self.total_deaths, line)?);
        row.insert(
            TOTAL_RECOVERED.to_string(),
            count(TOTAL_RECOVERED, self.total_recovered, line)?,
        );
        row.insert(INCOME_GROUP.to_string(), ColumnValue::String(self.income_group));
        row.insert(
            EXPECTED_YEARS_OF_SCHOOL.to_string(),
            match self.expected_years_of_school {
                Some(v) if v.is_finite() && v >= 0.0 => ColumnValue::Float64(v),
                Some(v) if v.is_nan() => ColumnValue::Null,
                Some(v) => {
                    return Err(DashboardError::DataUnavailable(format!(
                        "line {line}: {EXPECTED_YEARS_OF_SCHOOL} must be non-negative, got {v}"
                    )))
                }
                None => ColumnValue::Null,
            },
        );
        Ok(row)
    }
}

fn count(field: &str, value: Option<f64>, line: usize) -> Result<ColumnValue> {
    match value {
        None => Ok(ColumnValue::Null),
        Some(v) if v.is_nan() => Ok(ColumnValue::Null),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= i64::MAX as f64 => {
            Ok(ColumnValue::Int64(v as i64))
        }
        Some(v) => Err(DashboardError::DataUnavailable(format!(
            "line {line}: {field} must be a non-negative integer, got {v}"
        ))),
    }
}

/// Parses CSV text into the base table. Unknown columns are ignored.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = Table::new("covid_worldwide".to_string(), covid_schema());
    for (i, result) in rdr.deserialize::<CovidRecord>().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result?;
        let row = record.into_row(line)?;
        table
            .append_row(row)
            .map_err(|e| DashboardError::DataUnavailable(format!("line {line}: {e}")))?;
    }
    Ok(table)
}

/// Downloads and parses the dataset. No retry: the caller treats failure as
/// fatal.
pub fn fetch_dataset(url: &str, timeout: Duration) -> Result<Table> {
    fetch_dataset_with_limit(url, timeout, MAX_DATASET_BYTES)
}

pub(crate) fn fetch_dataset_with_limit(url: &str, timeout: Duration, max_bytes: usize) -> Result<Table> {
    log::info!("Loading dataset from {}", url);

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .build();

    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(code, _) => {
            DashboardError::DataUnavailable(format!("HTTP status {code} from {url}"))
        }
        ureq::Error::Transport(transport) => {
            DashboardError::DataUnavailable(format!("request to {url} failed: {transport}"))
        }
    })?;

    let body = read_bounded(response, max_bytes)?;
    let table = parse_dataset(body.as_slice())?;
    log::info!("Loaded {} countries", table.len());
    Ok(table)
}

fn read_bounded(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>> {
    let mut limited = response.into_reader().take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(DashboardError::DataUnavailable(format!(
            "response exceeded {max_bytes} bytes"
        )));
    }
    Ok(bytes)
}
