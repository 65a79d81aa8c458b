//! WebSocket session for live chart updates

use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chart::InterestVariable;
use crate::controls::{page_layout, PageLayout};
use crate::messages::{ClientMessage, ServerMessage};
use crate::reactive::{render_overview, Dashboard, InputValue, OutputUpdate};
use crate::table::Table;

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared, read-only state for all connections
pub struct AppState {
    pub base: Arc<Table>,
    pub layout: PageLayout,
    /// Charts over the outlier-excluded table, built once
    pub overview: Vec<OutputUpdate>,
}

impl AppState {
    pub fn new(base: Arc<Table>) -> Self {
        let layout = page_layout(&base);
        let overview = render_overview(&base);
        Self {
            base,
            layout,
            overview,
        }
    }
}

fn figure_message(update: OutputUpdate) -> ServerMessage {
    ServerMessage::Figure {
        output: update.output,
        figure: update.figure,
        generation: update.generation,
    }
}

/// Computes the replies to one client message. Errors are reported to the
/// client and leave the session state untouched.
pub fn respond(dashboard: &mut Dashboard, layout: &PageLayout, msg: ClientMessage) -> Vec<ServerMessage> {
    match msg {
        ClientMessage::GetLayout => vec![ServerMessage::Layout {
            layout: layout.clone(),
        }],

        ClientMessage::SetPopulation { value } => {
            if !value.is_finite() {
                return vec![ServerMessage::Error {
                    message: format!("Population must be a finite number, got {}", value),
                }];
            }
            dashboard
                .apply([InputValue::Population(value.floor() as i64)])
                .into_iter()
                .map(figure_message)
                .collect()
        }

        ClientMessage::SetInterestVariable { value } => match value.parse::<InterestVariable>() {
            Ok(interest) => dashboard
                .apply([InputValue::Interest(interest)])
                .into_iter()
                .map(figure_message)
                .collect(),
            Err(e) => vec![ServerMessage::Error {
                message: e.to_string(),
            }],
        },

        ClientMessage::Refresh => dashboard.snapshot().into_iter().map(figure_message).collect(),
    }
}

/// WebSocket connection actor, one dashboard per browser session
pub struct DashboardSocket {
    hb: Instant,
    state: actix_web::web::Data<AppState>,
    dashboard: Dashboard,
}

impl DashboardSocket {
    pub fn new(state: actix_web::web::Data<AppState>) -> Self {
        let dashboard = Dashboard::new(Arc::clone(&state.base));
        Self {
            hb: Instant::now(),
            state,
            dashboard,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::info!("WebSocket client heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => ctx.text(text),
            Err(e) => log::error!("Failed to serialize server message: {}", e),
        }
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        for reply in respond(&mut self.dashboard, &self.state.layout, msg) {
            Self::send(ctx, &reply);
        }
    }
}

impl Actor for DashboardSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
        self.handle_client_message(ClientMessage::GetLayout, ctx);
        self.handle_client_message(ClientMessage::Refresh, ctx);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for DashboardSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    self.hb = Instant::now();
                    self.handle_client_message(client_msg, ctx);
                }
                Err(e) => {
                    Self::send(
                        ctx,
                        &ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        },
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Unexpected binary message");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_dataset;
    use crate::dataset::tests::SAMPLE_CSV;
    use crate::reactive::OutputId;

    fn session() -> (Dashboard, PageLayout) {
        let base = Arc::new(parse_dataset(SAMPLE_CSV.as_bytes()).unwrap());
        let state = AppState::new(base);
        (Dashboard::new(Arc::clone(&state.base)), state.layout)
    }

    #[test]
    fn set_population_sends_three_figures() {
        let (mut dashboard, layout) = session();
        let replies = respond(
            &mut dashboard,
            &layout,
            ClientMessage::SetPopulation { value: 20_000_000.7 },
        );

        assert_eq!(replies.len(), 3);
        assert_eq!(dashboard.state().population_ceiling, 20_000_000);
        match &replies[2] {
            ServerMessage::Figure { output, figure, generation } => {
                assert_eq!(*output, OutputId::CountryBar);
                assert_eq!(figure.point_count(), 2);
                assert_eq!(*generation, 1);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn repeated_value_sends_nothing() {
        let (mut dashboard, layout) = session();
        let ceiling = dashboard.state().population_ceiling as f64;
        let replies = respond(&mut dashboard, &layout, ClientMessage::SetPopulation { value: ceiling });
        assert!(replies.is_empty());
    }

    #[test]
    fn bad_input_is_reported_not_fatal() {
        let (mut dashboard, layout) = session();
        let before = dashboard.state();

        let replies = respond(
            &mut dashboard,
            &layout,
            ClientMessage::SetInterestVariable {
                value: "total_vaccinations".to_string(),
            },
        );
        assert!(matches!(&replies[..], [ServerMessage::Error { .. }]));

        let replies = respond(
            &mut dashboard,
            &layout,
            ClientMessage::SetPopulation { value: f64::NAN },
        );
        assert!(matches!(&replies[..], [ServerMessage::Error { .. }]));
        assert_eq!(dashboard.state(), before);
    }

    #[test]
    fn layout_and_refresh() {
        let (mut dashboard, layout) = session();
        let replies = respond(&mut dashboard, &layout, ClientMessage::GetLayout);
        assert!(matches!(&replies[..], [ServerMessage::Layout { .. }]));

        let replies = respond(&mut dashboard, &layout, ClientMessage::Refresh);
        assert_eq!(replies.len(), 3);
    }
}
