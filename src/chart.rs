//! Chart specifications
//!
//! A `ChartSpec` is a renderer-agnostic description of a chart: its kind, its
//! titles and axis labels, and one trace per color group holding the values to
//! plot. The browser page hands it to plotly.js; nothing here draws pixels.
//!
//! Builders are pure: the same table and interest variable always produce an
//! equal `ChartSpec`.

use crate::column::{Column, ColumnValue};
use crate::dataset::{
    COUNTRY, EXPECTED_YEARS_OF_SCHOOL, INCOME_GROUP, POPULATION, TOTAL_CASES, TOTAL_DEATHS,
    TOTAL_RECOVERED, TOTAL_TESTS,
};
use crate::error::DashboardError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const TEMPLATE: &str = "plotly_white";
const SCATTER_TRANSITION_MS: u32 = 500;

/// The measurement column that drives the y-values of every chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestVariable {
    #[default]
    TotalCases,
    TotalTests,
    TotalDeaths,
    TotalRecovered,
}

impl InterestVariable {
    pub const ALL: [InterestVariable; 4] = [
        InterestVariable::TotalCases,
        InterestVariable::TotalTests,
        InterestVariable::TotalDeaths,
        InterestVariable::TotalRecovered,
    ];

    /// Column name in the base table.
    pub fn column(&self) -> &'static str {
        match self {
            InterestVariable::TotalCases => TOTAL_CASES,
            InterestVariable::TotalTests => TOTAL_TESTS,
            InterestVariable::TotalDeaths => TOTAL_DEATHS,
            InterestVariable::TotalRecovered => TOTAL_RECOVERED,
        }
    }
}

impl fmt::Display for InterestVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for InterestVariable {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InterestVariable::ALL
            .into_iter()
            .find(|v| v.column() == s)
            .ok_or_else(|| DashboardError::UnknownInterestVariable(s.to_string()))
    }
}

/// Where a label is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelContext {
    /// y-axis of the per-capita scatter plot
    ScatterAxis,
    /// y-axis of the bar charts, and the dropdown option text
    BarAxis,
}

pub fn label_for(variable: InterestVariable, context: LabelContext) -> &'static str {
    use InterestVariable::*;
    match (context, variable) {
        (LabelContext::ScatterAxis, TotalCases) => "Percentage Infected",
        (LabelContext::ScatterAxis, TotalTests) => "Percentage Tested",
        (LabelContext::ScatterAxis, TotalDeaths) => "Percentage Dead",
        (LabelContext::ScatterAxis, TotalRecovered) => "Percentage Recovered",
        (LabelContext::BarAxis, TotalCases) => "Total Cases",
        (LabelContext::BarAxis, TotalTests) => "Total Tests",
        (LabelContext::BarAxis, TotalDeaths) => "Total Deaths",
        (LabelContext::BarAxis, TotalRecovered) => "Total Recovered",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Scatter,
    Bar,
}

/// One color group of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<ColumnValue>,
    /// `None` where the source value is missing; serialized as `null`.
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<Vec<String>>,
}

impl Trace {
    fn new(name: String, with_size: bool, with_hover: bool) -> Self {
        Trace {
            name,
            x: Vec::new(),
            y: Vec::new(),
            size: with_size.then(Vec::new),
            hover: with_hover.then(Vec::new),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_duration_ms: Option<u32>,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    /// Total number of plotted points or bars across traces.
    pub fn point_count(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

/// Source of the y-values.
#[derive(Debug, Clone, PartialEq)]
pub enum YField {
    Column(String),
    /// numerator / denominator, per row
    Ratio { numerator: String, denominator: String },
}

/// Field mapping from a table to a chart.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    pub kind: ChartKind,
    pub x: String,
    pub y: YField,
    pub size: Option<String>,
    pub color: String,
    pub hover: Option<String>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub transition_duration_ms: Option<u32>,
}

impl ChartBuilder {
    pub fn build(&self, table: &Table) -> ChartSpec {
        ChartSpec {
            kind: self.kind,
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            legend_title: self.legend_title.clone(),
            template: TEMPLATE.to_string(),
            transition_duration_ms: self.transition_duration_ms,
            traces: self.traces(table),
        }
    }

    fn traces(&self, table: &Table) -> Vec<Trace> {
        let required = |name: &str| {
            let col = table.column(name);
            if col.is_none() {
                log::warn!("Column '{}' missing from '{}', chart left empty", name, table.name());
            }
            col
        };

        let (Some(x_col), Some(color_col)) = (required(self.x.as_str()), required(self.color.as_str())) else {
            return Vec::new();
        };
        let y_cols = match &self.y {
            YField::Column(name) => match required(name.as_str()) {
                Some(col) => (col, None),
                None => return Vec::new(),
            },
            YField::Ratio { numerator, denominator } => {
                match (required(numerator.as_str()), required(denominator.as_str())) {
                    (Some(num), Some(den)) => (num, Some(den)),
                    _ => return Vec::new(),
                }
            }
        };
        let size_col = self.size.as_deref().and_then(|n| table.column(n));
        let hover_col = self.hover.as_deref().and_then(|n| table.column(n));

        let mut traces: Vec<Trace> = Vec::new();
        let mut trace_index: HashMap<String, usize> = HashMap::new();

        for i in 0..table.len() {
            let hover = hover_col.map(|c| display(c, i));
            let y = match y_value(y_cols, i) {
                Ok(y) => y,
                Err(err) => {
                    let country = hover.clone().unwrap_or_else(|| format!("row {i}"));
                    let err = match err {
                        DashboardError::UndefinedRatio { .. } => {
                            DashboardError::UndefinedRatio { country }
                        }
                        other => other,
                    };
                    log::debug!("Skipping point: {}", err);
                    continue;
                }
            };

            let group = display(color_col, i);
            let idx = *trace_index.entry(group.clone()).or_insert_with(|| {
                traces.push(Trace::new(group, size_col.is_some(), hover_col.is_some()));
                traces.len() - 1
            });
            let trace = &mut traces[idx];

            trace.x.push(x_col.get_ref(i).cloned().unwrap_or(ColumnValue::Null));
            trace.y.push(y);
            if let (Some(sizes), Some(col)) = (trace.size.as_mut(), size_col) {
                sizes.push(col.get_ref(i).and_then(|v| v.as_number()).unwrap_or(0.0));
            }
            if let (Some(names), Some(name)) = (trace.hover.as_mut(), hover) {
                names.push(name);
            }
        }

        traces
    }
}

fn display(col: &Column, i: usize) -> String {
    match col.get_ref(i) {
        Some(ColumnValue::String(s)) => s.clone(),
        Some(ColumnValue::Int64(v)) => v.to_string(),
        Some(ColumnValue::Float64(v)) => v.to_string(),
        Some(ColumnValue::Null) | None => String::new(),
    }
}

fn y_value(cols: (&Column, Option<&Column>), i: usize) -> Result<Option<f64>, DashboardError> {
    let numerator = cols.0.get_ref(i).and_then(|v| v.as_number());
    match cols.1 {
        None => Ok(numerator),
        Some(den) => {
            let denominator = den.get_ref(i).and_then(|v| v.as_number());
            per_capita(numerator, denominator)
        }
    }
}

/// Divides a count by a population. A zero population is `UndefinedRatio`;
/// missing inputs give a missing ratio.
pub fn per_capita(value: Option<f64>, population: Option<f64>) -> Result<Option<f64>, DashboardError> {
    match (value, population) {
        (_, Some(p)) if p == 0.0 => Err(DashboardError::UndefinedRatio {
            country: String::new(),
        }),
        (Some(v), Some(p)) => Ok(Some(v / p)),
        _ => Ok(None),
    }
}

/// Interest variable per capita against expected years of school, one point
/// per country sized by population. Countries with zero population are left
/// out.
pub fn scatter_chart(table: &Table, interest: InterestVariable) -> ChartSpec {
    ChartBuilder {
        kind: ChartKind::Scatter,
        x: EXPECTED_YEARS_OF_SCHOOL.to_string(),
        y: YField::Ratio {
            numerator: interest.column().to_string(),
            denominator: POPULATION.to_string(),
        },
        size: Some(POPULATION.to_string()),
        color: INCOME_GROUP.to_string(),
        hover: Some(COUNTRY.to_string()),
        title: format!(
            "{} VS Education Level",
            label_for(interest, LabelContext::BarAxis)
        ),
        x_label: "Expected Years of School".to_string(),
        y_label: label_for(interest, LabelContext::ScatterAxis).to_string(),
        legend_title: Some("Income Group".to_string()),
        transition_duration_ms: Some(SCATTER_TRANSITION_MS),
    }
    .build(table)
}

/// Summed interest variable per income group. Expects an aggregated table.
pub fn income_bar_chart(aggregated: &Table, interest: InterestVariable) -> ChartSpec {
    ChartBuilder {
        kind: ChartKind::Bar,
        x: INCOME_GROUP.to_string(),
        y: YField::Column(interest.column().to_string()),
        size: None,
        color: INCOME_GROUP.to_string(),
        hover: None,
        title: format!(
            "{} By Income Group",
            label_for(interest, LabelContext::BarAxis)
        ),
        x_label: "Income Group".to_string(),
        y_label: label_for(interest, LabelContext::BarAxis).to_string(),
        legend_title: Some("Income Group".to_string()),
        transition_duration_ms: None,
    }
    .build(aggregated)
}

/// Raw interest variable per country, colored by income group.
pub fn country_bar_chart(table: &Table, interest: InterestVariable) -> ChartSpec {
    ChartBuilder {
        kind: ChartKind::Bar,
        x: COUNTRY.to_string(),
        y: YField::Column(interest.column().to_string()),
        size: None,
        color: INCOME_GROUP.to_string(),
        hover: None,
        title: format!(
            "{} per Country",
            label_for(interest, LabelContext::BarAxis)
        ),
        x_label: "Country".to_string(),
        y_label: label_for(interest, LabelContext::BarAxis).to_string(),
        legend_title: Some("Income Group".to_string()),
        transition_duration_ms: None,
    }
    .build(table)
}
