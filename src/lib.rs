//! Covid Dashboard - COVID-19 statistics against education and income
//!
//! Loads a per-country dataset into a columnar table, derives filtered and
//! aggregated views, and renders three chart specifications that a browser
//! page updates live as the population slider and interest-variable dropdown
//! change.

pub mod column;
pub mod table;
pub mod view;
pub mod changeset;
pub mod error;
pub mod config;
pub mod dataset;
pub mod transform;
pub mod chart;
pub mod controls;
pub mod reactive;

pub use column::{Column, ColumnType, ColumnValue};
pub use table::{Schema, Table};
pub use view::{FilterView, GroupSumView};
pub use changeset::{Changeset, InputChange, InputId, DependentOutput};
pub use error::DashboardError;
pub use config::DashboardConfig;
pub use dataset::{covid_schema, fetch_dataset, parse_dataset, DATASET_URL};
pub use transform::{aggregate_by_income, exclude_outliers, filter_by_population, outlier_set, OUTLIER_COUNTRIES};
pub use chart::{
    country_bar_chart, income_bar_chart, label_for, scatter_chart, ChartKind, ChartSpec,
    InterestVariable, LabelContext, Trace,
};
pub use controls::{page_layout, PageLayout};
pub use reactive::{render_all, render_overview, Dashboard, InputValue, InteractionState, OutputId, OutputUpdate};

// WebSocket server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod messages;
#[cfg(feature = "server")]
pub mod websocket;
#[cfg(feature = "server")]
pub mod server;
