//! HTTP server with WebSocket support for live chart updates

use actix_web::{middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use serde::Deserialize;
use std::sync::Arc;

use crate::chart::InterestVariable;
use crate::reactive::{render_all, InteractionState};
use crate::table::Table;
use crate::websocket::{AppState, DashboardSocket};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// WebSocket endpoint handler
async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let resp = ws::start(DashboardSocket::new(state), &req, stream)?;
    Ok(resp)
}

/// Dashboard page
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Covid dashboard server is running",
        "countries": state.base.len()
    }))
}

async fn layout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.layout)
}

/// Startup charts without the four most populous countries
async fn overview(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.overview)
}

#[derive(Debug, Deserialize)]
struct FigureQuery {
    population: Option<f64>,
    interest: Option<String>,
}

/// Stateless render of all three charts for the given inputs
async fn figures(state: web::Data<AppState>, query: web::Query<FigureQuery>) -> HttpResponse {
    let query = query.into_inner();
    let mut inputs = InteractionState::initial(&state.base);

    if let Some(population) = query.population {
        if !population.is_finite() {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Population must be a finite number, got {}", population)
            }));
        }
        inputs.population_ceiling = population.floor() as i64;
    }
    if let Some(interest) = query.interest {
        match interest.parse::<InterestVariable>() {
            Ok(v) => inputs.interest_variable = v,
            Err(e) => {
                return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }));
            }
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "state": inputs,
        "figures": render_all(&state.base, &inputs),
    }))
}

/// Registers every route on an app or test service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/ws", web::get().to(ws_index))
        .route("/api/layout", web::get().to(layout))
        .route("/api/figures", web::get().to(figures))
        .route("/api/overview", web::get().to(overview))
        .route("/health", web::get().to(health_check));
}

/// Start the HTTP server with WebSocket support
pub async fn run_server(base: Arc<Table>, host: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(base));

    log::info!("Covid dashboard serving {} countries", state.base.len());
    log::info!("Dashboard: http://{}:{}/", host, port);
    log::info!("WebSocket: ws://{}:{}/ws", host, port);
    log::info!("Health check: http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable logger
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
