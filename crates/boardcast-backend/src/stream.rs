use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::consts::EVENTS_PATH;
use crate::types::MoveEvent;

/// Where the move stream currently stands. `Connected` is the only state in
/// which inbound events are expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Error,
}

/// What the supervisor reports back to the session that owns it.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    /// The event stream is open; moves now arrive without polling.
    Opened,
    /// One well-formed move event.
    Event(MoveEvent),
    /// An open stream dropped. Sent once per drop, never for a connect
    /// attempt that failed before the stream was open.
    Lost { reason: String },
}

/// How a dropped stream is reopened before the supervisor gives up and waits
/// for an explicit `connect()`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Consecutive failed reopen attempts tolerated after a drop.
    pub attempts: u32,
    /// Delay before the first reopen; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, failures: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(failures)
    }
}

/// Long-lived push channel for move events.
#[async_trait]
pub trait PushStream: Send + Sync {
    async fn state(&self) -> StreamState;

    /// Arm the stream. No-op while a connection attempt is running or the
    /// stream is already open; from `Idle` or `Error` it starts fresh.
    async fn connect(&self);

    /// Close the stream if open. Safe to call any number of times.
    async fn disconnect(&self);
}

/// Owns the single reader task for one session's move stream and funnels
/// everything it sees into an update channel. At most one reader exists at a
/// time; `connect()` tears down any stale one before starting over.
pub struct StreamSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    events_url: String,
    client: Client,
    updates: mpsc::Sender<StreamUpdate>,
    retry: RetryPolicy,
    shared: Mutex<Shared>,
}

#[derive(Default)]
struct Shared {
    state: StreamState,
    reader: Option<JoinHandle<()>>,
    // Bumped on every connect()/disconnect(). A reader spawned under an older
    // value no longer owns the state and must exit instead of touching it.
    epoch: u64,
}

impl Inner {
    /// Move to `next` if `epoch` still owns the connection. False means a
    /// newer connect()/disconnect() took over and the caller must stop.
    async fn transition(&self, epoch: u64, next: StreamState) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.epoch != epoch {
            return false;
        }
        shared.state = next;
        true
    }
}

impl StreamSupervisor {
    /// `client` should carry a connect timeout but no overall request
    /// deadline, otherwise the open stream would be cut off mid-flight.
    pub fn new(
        base_url: &str,
        client: Client,
        updates: mpsc::Sender<StreamUpdate>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                events_url: format!("{}{EVENTS_PATH}", base_url.trim_end_matches('/')),
                client,
                updates,
                retry,
                shared: Mutex::new(Shared::default()),
            }),
        }
    }
}

#[async_trait]
impl PushStream for StreamSupervisor {
    async fn state(&self) -> StreamState {
        self.inner.shared.lock().await.state
    }

    async fn connect(&self) {
        let mut shared = self.inner.shared.lock().await;
        if matches!(
            shared.state,
            StreamState::Connecting | StreamState::Connected
        ) {
            tracing::debug!(state = ?shared.state, "connect ignored, stream already live");
            return;
        }

        // A previous reader may still be sleeping out its retry budget. It
        // has to be gone before a new connection may exist.
        if let Some(old) = shared.reader.take() {
            old.abort();
        }
        shared.epoch += 1;
        shared.state = StreamState::Connecting;
        tracing::info!(url = %self.inner.events_url, "opening move stream");
        shared.reader = Some(tokio::spawn(run_reader(self.inner.clone(), shared.epoch)));
    }

    async fn disconnect(&self) {
        let mut shared = self.inner.shared.lock().await;
        shared.epoch += 1;
        shared.state = StreamState::Idle;
        if let Some(reader) = shared.reader.take() {
            reader.abort();
            tracing::info!("move stream closed");
        }
    }
}

enum ReadEnd {
    /// A newer connect()/disconnect() owns the state now, or the session is
    /// gone. Exit without touching anything.
    Superseded,
    Dropped { reason: String, was_connected: bool },
}

async fn run_reader(inner: Arc<Inner>, epoch: u64) {
    let mut failures: u32 = 0;
    loop {
        match read_once(&inner, epoch).await {
            ReadEnd::Superseded => return,
            ReadEnd::Dropped {
                reason,
                was_connected,
            } => {
                tracing::warn!(%reason, "move stream dropped");
                // State flips before Lost goes out, so a button pressed right
                // after the notice already sees a reconnectable stream.
                if !inner.transition(epoch, StreamState::Error).await {
                    return;
                }
                if was_connected {
                    // The drop ends a healthy connection, so the retry budget
                    // starts over.
                    failures = 0;
                    if inner
                        .updates
                        .send(StreamUpdate::Lost { reason })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                if failures >= inner.retry.attempts {
                    tracing::warn!(
                        attempts = inner.retry.attempts,
                        "reopen budget exhausted, waiting for a manual reconnect"
                    );
                    return;
                }
                let delay = inner.retry.delay(failures);
                failures += 1;
                tokio::time::sleep(delay).await;
                if !inner.transition(epoch, StreamState::Connecting).await {
                    return;
                }
                tracing::info!(attempt = failures, "reopening move stream");
            }
        }
    }
}

/// One full connect-and-read pass over the event stream.
async fn read_once(inner: &Inner, epoch: u64) -> ReadEnd {
    let response = match inner
        .client
        .get(&inner.events_url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return ReadEnd::Dropped {
                reason: e.to_string(),
                was_connected: false,
            };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return ReadEnd::Dropped {
            reason: format!("HTTP {status}"),
            was_connected: false,
        };
    }

    if !inner.transition(epoch, StreamState::Connected).await {
        return ReadEnd::Superseded;
    }
    if inner.updates.send(StreamUpdate::Opened).await.is_err() {
        return ReadEnd::Superseded;
    }
    tracing::info!(url = %inner.events_url, "move stream open");

    let mut events = response.bytes_stream().eventsource();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => match serde_json::from_str::<MoveEvent>(&event.data) {
                Ok(move_event) => {
                    if inner
                        .updates
                        .send(StreamUpdate::Event(move_event))
                        .await
                        .is_err()
                    {
                        return ReadEnd::Superseded;
                    }
                }
                Err(e) => {
                    // One bad event is dropped; the stream stays up.
                    tracing::warn!(error = %e, data = %event.data, "dropping malformed stream event");
                }
            },
            Err(e) => {
                return ReadEnd::Dropped {
                    reason: e.to_string(),
                    was_connected: true,
                };
            }
        }
    }

    ReadEnd::Dropped {
        reason: "stream closed by server".to_string(),
        was_connected: true,
    }
}
