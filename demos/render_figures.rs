/// Offline Figure Rendering Example
///
/// This example demonstrates:
/// - Parsing a small CSV into the base table
/// - Building the outlier-excluded and income-aggregated tables
/// - Driving a dashboard session and printing the chart specs it produces

use covid_dashboard::{
    aggregate_by_income, exclude_outliers, outlier_set, parse_dataset, Dashboard, InputValue,
    InterestVariable,
};
use std::sync::Arc;

const CSV: &str = "\
country,population,total_cases,total_tests,total_deaths,total_recovered,income_group,expected_years_of_school
Brazil,212559417,5000,10000,150,4000,Upper middle income,15.4
Canada,37742154,200,9000,10,180,High income,16.2
Chad,16425864,10,100,1,8,Low income,7.5
Norway,5421241,50,2000,1,45,High income,18.1
Seychelles,98347,3,500,0,3,High income,14.1
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Covid Dashboard Figure Example ===\n");

    // 1. Load the base table
    let base = Arc::new(parse_dataset(CSV.as_bytes())?);
    println!("1. Loaded {} countries\n", base.len());

    // 2. Startup views
    let trimmed = exclude_outliers(&base, &outlier_set());
    println!("2. Without outliers: {} countries", trimmed.len());
    let by_income = aggregate_by_income(&trimmed);
    for row in by_income.iter() {
        println!(
            "   {:<22} total_cases = {:?}",
            row["income_group"].as_string().unwrap_or("?"),
            row["total_cases"].as_i64()
        );
    }
    println!();

    // 3. A session reacting to input changes
    let mut dashboard = Dashboard::new(base);
    println!("3. Initial state: {:?}", dashboard.state());

    let updates = dashboard.apply([
        InputValue::Population(300_000_000),
        InputValue::Interest(InterestVariable::TotalDeaths),
    ]);
    for update in &updates {
        println!(
            "   {:?}: '{}' with {} points",
            update.output,
            update.figure.title,
            update.figure.point_count()
        );
    }
    println!();

    // 4. Chart spec as sent to the browser
    if let Some(update) = updates.last() {
        println!("4. {}", serde_json::to_string_pretty(&update.figure)?);
    }

    Ok(())
}
