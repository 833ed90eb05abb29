//! Live feed subscriber
//!
//! Owns at most one websocket subscription at a time. The subscription runs
//! as a spawned task that decodes creation events and calls back into the
//! host; failures are logged and end the subscription without retrying.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use super::error::FeedError;
use super::message::{entry_from_payload, websocket_url, ClientMessage, ServerMessage, CREATE_EVENT};
use crate::models::Entry;

/// Time allowed for authentication after connecting
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for unsubscribe and close on shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Where to reach the item store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    /// Base URL (http(s) or ws(s))
    pub url: String,
    /// Static access token
    pub token: String,
}

/// Connection settings, or the reason there are none
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSettings {
    Configured(FeedEndpoint),
    /// A required setting is absent; the feed stays inert
    Unconfigured { missing: &'static str },
}

/// Result of `FeedSubscriber::start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Subscription task spawned
    Started,
    /// No settings; nothing was started
    Unconfigured,
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Never started, or unconfigured
    Idle,
    /// Connecting and authenticating
    Connecting,
    /// Receiving creation events
    Subscribed,
    /// Stopped or closed cleanly
    Closed,
    /// Ended by an error
    Failed,
}

struct FeedTask {
    shutdown_tx: Option<oneshot::Sender<()>>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FeedTask {
    /// Stop delivering entries and ask the task to unsubscribe
    fn signal(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Live feed subscriber
pub struct FeedSubscriber {
    task: Option<FeedTask>,
    /// A stopped task that may still be unsubscribing
    retiring: Option<JoinHandle<()>>,
    status_tx: Arc<watch::Sender<FeedStatus>>,
    status_rx: watch::Receiver<FeedStatus>,
}

impl Default for FeedSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSubscriber {
    pub fn new() -> Self {
        let (status_tx, status_rx) = watch::channel(FeedStatus::Idle);
        Self {
            task: None,
            retiring: None,
            status_tx: Arc::new(status_tx),
            status_rx,
        }
    }

    /// Open a subscription to creation events in `source_id`
    ///
    /// `on_create` is called once per creation event, in arrival order. A
    /// running subscription is stopped first, and the new one connects only
    /// after the old one has unsubscribed (or been aborted). Must be called
    /// from within a tokio runtime.
    pub fn start<F>(&mut self, settings: &FeedSettings, source_id: &str, on_create: F) -> StartOutcome
    where
        F: FnMut(Entry) + Send + 'static,
    {
        self.stop();

        let endpoint = match settings {
            FeedSettings::Configured(endpoint) => endpoint.clone(),
            FeedSettings::Unconfigured { missing } => {
                warn!(
                    "Live feed not configured (missing {}); showing snapshot only",
                    missing
                );
                let _ = self.status_tx.send(FeedStatus::Idle);
                return StartOutcome::Unconfigured;
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _ = self.status_tx.send(FeedStatus::Connecting);

        let handle = tokio::spawn(run_subscription(
            self.retiring.take(),
            endpoint,
            source_id.to_string(),
            on_create,
            shutdown_rx,
            cancelled.clone(),
            self.status_tx.clone(),
        ));

        self.task = Some(FeedTask {
            shutdown_tx: Some(shutdown_tx),
            cancelled,
            handle,
        });
        StartOutcome::Started
    }

    /// Release the subscription. Does nothing if none is active.
    ///
    /// No entries are delivered and no status is published by the task after
    /// this returns. The task unsubscribes and closes the socket in the
    /// background; it is aborted if it has not finished within two seconds
    /// of the next `start` or `shutdown`.
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            debug!("Stopping live feed");
            task.signal();
            let _ = self.status_tx.send(FeedStatus::Closed);
            if let Some(older) = self.retiring.replace(task.handle) {
                older.abort();
            }
        }
    }

    /// Like `stop`, but waits (briefly) for the unsubscribe to go out
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(handle) = self.retiring.take() {
            retire(handle).await;
        }
    }

    /// Whether a subscription task is running
    pub fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn status(&self) -> FeedStatus {
        *self.status_rx.borrow()
    }

    /// Watch status changes
    pub fn subscribe_status(&self) -> watch::Receiver<FeedStatus> {
        self.status_rx.clone()
    }
}

/// Wait for a stopped task, aborting it if it takes too long
async fn retire(mut handle: JoinHandle<()>) {
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handle)
        .await
        .is_err()
    {
        warn!("Live feed did not shut down in time");
        handle.abort();
    }
}

/// Publish a status unless the task has been stopped
fn publish(status_tx: &watch::Sender<FeedStatus>, cancelled: &AtomicBool, status: FeedStatus) {
    status_tx.send_if_modified(|current| {
        if cancelled.load(Ordering::SeqCst) {
            return false;
        }
        *current = status;
        true
    });
}

impl Drop for FeedSubscriber {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Subscription task: runs until shutdown, close or error
async fn run_subscription<F>(
    previous: Option<JoinHandle<()>>,
    endpoint: FeedEndpoint,
    collection: String,
    on_create: F,
    shutdown_rx: oneshot::Receiver<()>,
    cancelled: Arc<AtomicBool>,
    status_tx: Arc<watch::Sender<FeedStatus>>,
) where
    F: FnMut(Entry) + Send + 'static,
{
    // one subscription per host: the old one unsubscribes first
    if let Some(previous) = previous {
        retire(previous).await;
    }

    let result = subscribe(
        &endpoint,
        &collection,
        on_create,
        shutdown_rx,
        &cancelled,
        &status_tx,
    )
    .await;

    match result {
        Ok(()) => {
            info!("Live feed for '{}' closed", collection);
            publish(&status_tx, &cancelled, FeedStatus::Closed);
        }
        Err(e) => {
            warn!("Live feed for '{}' failed: {}", collection, e);
            publish(&status_tx, &cancelled, FeedStatus::Failed);
        }
    }
}

async fn subscribe<F>(
    endpoint: &FeedEndpoint,
    collection: &str,
    mut on_create: F,
    mut shutdown_rx: oneshot::Receiver<()>,
    cancelled: &AtomicBool,
    status_tx: &watch::Sender<FeedStatus>,
) -> Result<(), FeedError>
where
    F: FnMut(Entry),
{
    let url = websocket_url(&endpoint.url)?;
    debug!("Connecting to {}", url);

    let ws_stream = tokio::select! {
        biased;
        _ = &mut shutdown_rx => return Ok(()),
        connected = connect_async(url.as_str()) => {
            let (stream, _response) = connected.map_err(|source| FeedError::Connect {
                url: url.clone(),
                source,
            })?;
            stream
        }
    };
    let (mut write, mut read) = ws_stream.split();

    send(&mut write, &ClientMessage::auth(&endpoint.token)).await?;

    let uid = uuid::Uuid::new_v4().to_string();
    let handshake_deadline = tokio::time::Instant::now() + HANDSHAKE_TIMEOUT;
    let mut subscribed = false;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                if subscribed {
                    send(&mut write, &ClientMessage::unsubscribe(&uid)).await.ok();
                }
                write.close().await.ok();
                return Ok(());
            }

            _ = tokio::time::sleep_until(handshake_deadline), if !subscribed => {
                return Err(FeedError::Timeout("authentication"));
            }

            msg = read.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return Err(FeedError::Closed),
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(_)) => continue,
                };

                let message = match ServerMessage::decode(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        trace!("Ignoring undecodable feed frame: {}", e);
                        continue;
                    }
                };

                match message {
                    ServerMessage::Auth { ref status, .. } if status == "ok" => {
                        if !subscribed {
                            send(&mut write, &ClientMessage::subscribe_creates(collection, &uid)).await?;
                            subscribed = true;
                            publish(status_tx, cancelled, FeedStatus::Subscribed);
                            info!("Subscribed to new entries in '{}'", collection);
                        }
                    }
                    ServerMessage::Auth { .. } => {
                        let reason = message.rejection().unwrap_or_default();
                        return Err(FeedError::AuthRejected(reason));
                    }
                    ServerMessage::Subscribe { .. } => {
                        if let Some(reason) = message.rejection() {
                            return Err(FeedError::SubscribeRejected {
                                collection: collection.to_string(),
                                message: reason,
                            });
                        }
                    }
                    ServerMessage::Subscription { event, data, .. } => {
                        if event != CREATE_EVENT {
                            trace!("Ignoring '{}' subscription event", event);
                            continue;
                        }
                        match data.as_ref().and_then(entry_from_payload) {
                            Some(entry) if !cancelled.load(Ordering::SeqCst) => {
                                debug!("Received entry {}", entry.id);
                                on_create(entry);
                            }
                            Some(_) => {}
                            None => trace!("Dropping malformed create event"),
                        }
                    }
                    ServerMessage::Ping => {
                        send(&mut write, &ClientMessage::Pong).await?;
                    }
                    ServerMessage::Unknown => {}
                }
            }
        }
    }
}

async fn send<S>(write: &mut S, message: &ClientMessage) -> Result<(), FeedError>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    write.send(Message::Text(message.encode()?)).await?;
    Ok(())
}
