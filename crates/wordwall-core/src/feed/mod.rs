//! Live feed of newly created entries
//!
//! Subscribes to creation events on the item store's realtime websocket and
//! hands each new entry to a callback.
//!
//! ## Protocol
//!
//! JSON text frames:
//! 1. Connect to `ws(s)://<host>/websocket`
//! 2. Authenticate with the static access token
//! 3. Subscribe to `create` events of one collection
//! 4. Receive `subscription` messages, answer `ping` with `pong`
//!
//! ## Usage
//!
//! ```ignore
//! let mut feed = FeedSubscriber::new();
//! feed.start(&config.feed_settings(), "texts", move |entry| {
//!     let _ = tx.send(entry);
//! });
//! // ...
//! feed.stop();
//! ```

mod client;
mod error;
mod message;

pub use client::{FeedEndpoint, FeedSettings, FeedStatus, FeedSubscriber, StartOutcome};
pub use error::FeedError;
pub use message::{entry_from_payload, websocket_url, ClientMessage, ServerError, ServerMessage};
