//! Word Wall Core Library
//!
//! This crate provides the core functionality for the word wall: a
//! continuously growing wall of short texts that types out new entries as
//! they arrive from an item store, keeps everything fitted to the screen, and
//! announces each arrival in a full-screen overlay.
//!
//! # Architecture
//!
//! - **Wall**: single-threaded engine driven by its own timer scheduler
//! - **Feed**: websocket subscription that hands new entries to the host
//! - **Items**: REST client for the snapshot and for creating entries
//!
//! The engine never touches the network. The host loads a snapshot, mounts
//! it, forwards feed entries to `Wall::on_create`, and calls `Wall::advance`
//! whenever `Wall::next_deadline` passes.
//!
//! # Quick Start
//!
//! ```text
//! let clock = Arc::new(SystemClock::new());
//! let mut wall = Wall::new(clock, WallTimings::default());
//! wall.mount(items.list_entries("texts").await?);
//!
//! wall.on_create(entry);
//! wall.advance();
//! let frame = wall.frame(wall.now());
//! ```
//!
//! # Modules
//!
//! - `wall`: The engine (main entry point)
//! - `models`: Entries and their identifiers
//! - `store`: Ordered, deduplicated entry collection
//! - `reveal`: Per-entry typing animation
//! - `decay`: Character weight decay and layout
//! - `fit`: Font size fitting and easing
//! - `overlay`: Announcement queue
//! - `clock`: Time sources and the timer scheduler
//! - `feed`: Live feed subscriber
//! - `items`: Item store REST client
//! - `config`: Application configuration

pub mod clock;
pub mod config;
pub mod decay;
pub mod feed;
pub mod fit;
pub mod items;
pub mod models;
pub mod overlay;
pub mod reveal;
pub mod store;
pub mod wall;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use decay::{EntryLayout, StyledChar, HEAVY_WEIGHT, NORMAL_WEIGHT};
pub use feed::{FeedEndpoint, FeedError, FeedSettings, FeedStatus, FeedSubscriber, StartOutcome};
pub use fit::{FitParams, Viewport};
pub use items::{ItemsClient, ItemsError};
pub use models::{Entry, EntryId};
pub use overlay::{OverlayPhase, OverlayTimings, OverlayView};
pub use store::EntryStore;
pub use wall::{Wall, WallEvent, WallFrame, WallTimings};
