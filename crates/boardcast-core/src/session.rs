//! Per-session control loop. Everything that happens to one wearer's session
//! flows through a single event queue, so handlers never race each other.

use std::sync::Arc;
use std::time::Duration;

use boardcast_backend::gateway::Gateway;
use boardcast_backend::stream::{PushStream, StreamState, StreamUpdate};
use tokio::sync::mpsc;

use crate::DeliveryMode;
use crate::announce::Announcer;
use crate::device::{ButtonEvent, Capabilities, TextDisplay};

pub const WELCOME_BANNER: &str = "Boardcast ready";
pub const NOTICE_STREAM_ACTIVE: &str = "Move stream active";
pub const NOTICE_RECONNECTING: &str = "Reconnecting to move stream...";
pub const NOTICE_STREAM_OPEN: &str = "Move stream connected";
pub const NOTICE_STREAM_LOST: &str = "Move stream connection lost";
pub const NOTICE_CALLING_BACKEND: &str = "Fetching latest move...";
pub const NOTICE_BACKEND_FAILED: &str = "Backend connection failed";

/// The `message` field sent to the backend for a manual trigger.
pub const BUTTON_TRIGGER_REASON: &str = "button_press";

const NOTICE_DURATION: Duration = Duration::from_millis(2000);

/// Everything that can happen to one session, in the order it happened.
#[derive(Debug)]
pub enum SessionEvent {
    Button(ButtonEvent),
    Stream(StreamUpdate),
    Stop { reason: String },
}

/// What the platform hands over when a device joins.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    pub capabilities: Capabilities,
}

/// Drives one wearer's session: button presses and stream events in,
/// announcements and notices out.
pub struct SessionController<G, P> {
    info: SessionInfo,
    mode: DeliveryMode,
    gateway: Arc<G>,
    stream: Option<P>,
    announcer: Announcer,
    display: Arc<dyn TextDisplay>,
}

impl<G: Gateway, P: PushStream> SessionController<G, P> {
    pub fn new(
        info: SessionInfo,
        mode: DeliveryMode,
        gateway: Arc<G>,
        stream: Option<P>,
        announcer: Announcer,
        display: Arc<dyn TextDisplay>,
    ) -> Self {
        Self {
            info,
            mode,
            gateway,
            stream,
            announcer,
            display,
        }
    }

    /// Consume the session's event queue until a stop arrives or the queue
    /// closes, then release the stream.
    pub async fn run(self, mut events: mpsc::Receiver<SessionEvent>) {
        self.start().await;
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Button(press) => self.on_button(press).await,
                SessionEvent::Stream(update) => self.on_stream_update(update).await,
                SessionEvent::Stop { reason } => {
                    tracing::info!(session_id = %self.info.session_id, %reason, "session stopping");
                    break;
                }
            }
        }
        self.teardown().await;
    }

    async fn start(&self) {
        // Audio capability is informational. A device without audio still
        // gets every announcement as text.
        tracing::info!(
            session_id = %self.info.session_id,
            user_id = %self.info.user_id,
            audio = self.info.capabilities.audio_output,
            model = ?self.info.capabilities.model,
            "session started"
        );
        self.display.show_text_wall(WELCOME_BANNER, NOTICE_DURATION);
        if let Some(stream) = &self.stream {
            stream.connect().await;
        }
    }

    async fn on_button(&self, press: ButtonEvent) {
        // Button identity and press length don't matter: any press means
        // "give me the latest move" or "fix the stream".
        tracing::debug!(button = %press.id, kind = ?press.kind, "button pressed");
        match self.mode {
            DeliveryMode::PushStream => self.check_stream().await,
            DeliveryMode::OnDemand => self.fetch_and_announce().await,
        }
    }

    async fn check_stream(&self) {
        let Some(stream) = &self.stream else {
            tracing::warn!("push-stream session without a stream handle");
            return;
        };
        if stream.state().await == StreamState::Connected {
            self.display
                .show_text_wall(NOTICE_STREAM_ACTIVE, NOTICE_DURATION);
        } else {
            self.display
                .show_text_wall(NOTICE_RECONNECTING, NOTICE_DURATION);
            stream.connect().await;
        }
    }

    async fn fetch_and_announce(&self) {
        self.display
            .show_text_wall(NOTICE_CALLING_BACKEND, NOTICE_DURATION);
        match self
            .gateway
            .request_announcement(&self.info.user_id, BUTTON_TRIGGER_REASON)
            .await
        {
            Ok(text) => {
                let outcome = self.announcer.announce(&text).await;
                tracing::debug!(?outcome, "manual announcement rendered");
            }
            Err(e) => {
                // No automatic retry. The next press is the retry.
                tracing::warn!(error = %e, "backend request failed");
                self.display
                    .show_text_wall(NOTICE_BACKEND_FAILED, NOTICE_DURATION);
            }
        }
    }

    async fn on_stream_update(&self, update: StreamUpdate) {
        match update {
            StreamUpdate::Opened => {
                self.display
                    .show_text_wall(NOTICE_STREAM_OPEN, NOTICE_DURATION);
            }
            StreamUpdate::Event(event) => {
                tracing::debug!(timestamp = ?event.timestamp, "move event received");
                let outcome = self.announcer.announce(&event.message).await;
                tracing::debug!(?outcome, "move announcement rendered");
            }
            StreamUpdate::Lost { reason } => {
                tracing::warn!(%reason, "move stream lost");
                self.display
                    .show_text_wall(NOTICE_STREAM_LOST, NOTICE_DURATION);
            }
        }
    }

    async fn teardown(&self) {
        if let Some(stream) = &self.stream {
            stream.disconnect().await;
        }
        tracing::info!(session_id = %self.info.session_id, "session closed");
    }
}
