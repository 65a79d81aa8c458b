//! WebSocket message types for client-server communication

use crate::chart::ChartSpec;
use crate::controls::PageLayout;
use crate::reactive::OutputId;
use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request the page layout
    GetLayout,

    /// The population slider moved
    SetPopulation { value: f64 },

    /// A new interest variable was picked from the dropdown
    SetInterestVariable { value: String },

    /// Resend every current figure
    Refresh,
}

/// Messages sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Page layout in response to GetLayout, and on connect
    Layout { layout: PageLayout },

    /// A chart slot was (re)rendered
    Figure {
        output: OutputId,
        figure: ChartSpec,
        generation: u64,
    },

    /// Error occurred
    Error { message: String },
}
