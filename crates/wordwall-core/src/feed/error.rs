//! Live feed errors

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that end a live feed subscription
///
/// None of these reach the display: the subscriber logs them and the wall
/// keeps running from the entries it already has.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Base URL cannot be turned into a websocket URL
    #[error("Invalid feed URL '{0}': expected http(s):// or ws(s)://")]
    InvalidUrl(String),

    /// Websocket connection could not be opened
    #[error("Failed to connect to live feed '{url}': {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// Server refused the access token
    #[error("Live feed rejected credentials: {0}")]
    AuthRejected(String),

    /// Server refused the subscription
    #[error("Live feed rejected subscription to '{collection}': {message}")]
    SubscribeRejected { collection: String, message: String },

    /// No answer to the handshake in time
    #[error("Timed out waiting for live feed {0}")]
    Timeout(&'static str),

    /// Server closed the connection
    #[error("Live feed closed the connection")]
    Closed,

    /// Transport error during the subscription
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Outgoing message could not be serialized
    #[error("Failed to encode feed message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FeedError {
    /// Whether the failure points at configuration rather than the network
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FeedError::InvalidUrl(_)
                | FeedError::AuthRejected(_)
                | FeedError::SubscribeRejected { .. }
        )
    }
}
