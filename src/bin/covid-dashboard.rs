//! Covid Dashboard Server
//!
//! Loads the dataset once, then serves the dashboard page, its WebSocket
//! endpoint and the JSON API.

use covid_dashboard::config::DashboardConfig;
use covid_dashboard::dataset::fetch_dataset;
use covid_dashboard::server::run_server;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_filter()));

    // The dashboard cannot render without data
    let url = config.dataset_url.clone();
    let timeout = config.dataset_timeout;
    let table = match tokio::task::spawn_blocking(move || fetch_dataset(&url, timeout)).await {
        Ok(Ok(table)) => table,
        Ok(Err(e)) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("Dataset loader panicked: {}", e);
            std::process::exit(1);
        }
    };

    run_server(Arc::new(table), &config.host, config.port).await
}
