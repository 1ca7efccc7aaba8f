//! The app-server surface the device platform drives, plus the registry that
//! maps live sessions to their event queues.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use boardcast_backend::gateway::Gateway;
use boardcast_backend::stream::{PushStream, StreamUpdate};
use tokio::sync::{RwLock, mpsc};

use crate::DeliveryMode;
use crate::announce::Announcer;
use crate::device::{ButtonEvent, Speaker, TextDisplay};
use crate::session::{SessionController, SessionEvent};

pub use crate::session::SessionInfo;

const EVENT_QUEUE_CAPACITY: usize = 32;

/// The two lifecycle hooks every glasses app provides. The platform owns the
/// listener and calls these as devices come and go.
#[async_trait]
pub trait GlassesApp: Send + Sync {
    async fn on_session(&self, info: SessionInfo) -> Result<()>;
    async fn on_stop(&self, session_id: &str, user_id: &str, reason: &str) -> Result<()>;
}

struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
}

/// The chess announcement app. One controller task per live session; button
/// presses are routed to the session they belong to.
pub struct BoardcastApp<G, P, F> {
    mode: DeliveryMode,
    gateway: Arc<G>,
    stream_factory: F,
    speaker: Arc<dyn Speaker>,
    display: Arc<dyn TextDisplay>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    _stream: std::marker::PhantomData<fn() -> P>,
}

impl<G, P, F> BoardcastApp<G, P, F>
where
    G: Gateway + 'static,
    P: PushStream + 'static,
    F: Fn(mpsc::Sender<StreamUpdate>) -> P + Send + Sync,
{
    pub fn new(
        mode: DeliveryMode,
        gateway: Arc<G>,
        stream_factory: F,
        speaker: Arc<dyn Speaker>,
        display: Arc<dyn TextDisplay>,
    ) -> Self {
        Self {
            mode,
            gateway,
            stream_factory,
            speaker,
            display,
            sessions: RwLock::new(HashMap::new()),
            _stream: std::marker::PhantomData,
        }
    }

    /// Hand a button press to the session it belongs to. False means the
    /// session is unknown or already gone.
    pub async fn route_button(&self, session_id: &str, press: ButtonEvent) -> bool {
        let events = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(handle) => handle.events.clone(),
                None => {
                    tracing::warn!(%session_id, "button press for unknown session");
                    return false;
                }
            }
        };
        if events.send(SessionEvent::Button(press)).await.is_err() {
            tracing::warn!(%session_id, "session event queue is closed");
            return false;
        }
        true
    }
}

#[async_trait]
impl<G, P, F> GlassesApp for BoardcastApp<G, P, F>
where
    G: Gateway + 'static,
    P: PushStream + 'static,
    F: Fn(mpsc::Sender<StreamUpdate>) -> P + Send + Sync,
{
    async fn on_session(&self, info: SessionInfo) -> Result<()> {
        let session_id = info.session_id.clone();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let stream = match self.mode {
            DeliveryMode::PushStream => {
                let (update_tx, mut update_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
                // Stream updates join the same queue as button presses, so
                // one task handles everything for the session, in order.
                let stream_events = event_tx.clone();
                tokio::spawn(async move {
                    while let Some(update) = update_rx.recv().await {
                        if stream_events
                            .send(SessionEvent::Stream(update))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                });
                Some((self.stream_factory)(update_tx))
            }
            DeliveryMode::OnDemand => None,
        };

        let controller = SessionController::new(
            info,
            self.mode,
            self.gateway.clone(),
            stream,
            Announcer::new(self.speaker.clone(), self.display.clone()),
            self.display.clone(),
        );
        tokio::spawn(controller.run(event_rx));

        let mut sessions = self.sessions.write().await;
        if let Some(old) = sessions.insert(session_id.clone(), SessionHandle { events: event_tx }) {
            // The platform reused a session id. The older controller gets a
            // stop so its stream is released.
            tracing::warn!(%session_id, "replacing an existing session");
            let _ = old.events.try_send(SessionEvent::Stop {
                reason: "superseded".to_string(),
            });
        }
        Ok(())
    }

    async fn on_stop(&self, session_id: &str, user_id: &str, reason: &str) -> Result<()> {
        let handle = self.sessions.write().await.remove(session_id);
        match handle {
            Some(handle) => {
                tracing::info!(%session_id, %user_id, %reason, "stopping session");
                let _ = handle
                    .events
                    .send(SessionEvent::Stop {
                        reason: reason.to_string(),
                    })
                    .await;
            }
            // Stops can arrive twice; the second one has nothing to do.
            None => tracing::debug!(%session_id, "stop for unknown session"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Capabilities, PressKind, SpeechOutcome};
    use crate::session::{BUTTON_TRIGGER_REASON, NOTICE_STREAM_OPEN, WELCOME_BANNER};
    use boardcast_backend::BackendError;
    use boardcast_backend::stream::StreamState;
    use boardcast_backend::types::{HealthResponse, MoveEvent};
    use std::time::Duration;

    struct ProbeDisplay {
        walls: mpsc::UnboundedSender<String>,
    }

    impl TextDisplay for ProbeDisplay {
        fn show_text_wall(&self, text: &str, _duration: Duration) {
            let _ = self.walls.send(text.to_string());
        }
    }

    struct ProbeSpeaker;

    #[async_trait]
    impl Speaker for ProbeSpeaker {
        async fn speak(&self, _text: &str) -> Result<SpeechOutcome> {
            Ok(SpeechOutcome::success())
        }
    }

    struct ProbeGateway {
        calls: mpsc::UnboundedSender<(String, String)>,
    }

    #[async_trait]
    impl Gateway for ProbeGateway {
        async fn request_announcement(
            &self,
            user_id: &str,
            reason: &str,
        ) -> Result<String, BackendError> {
            let _ = self.calls.send((user_id.to_string(), reason.to_string()));
            Ok(format!("move for {user_id}"))
        }

        async fn health(&self) -> Result<HealthResponse, BackendError> {
            Ok(HealthResponse {
                status: "healthy".to_string(),
                message: "ok".to_string(),
            })
        }
    }

    /// Stream stand-in that pushes a canned opening sequence when armed.
    struct FakeStream {
        updates: mpsc::Sender<StreamUpdate>,
    }

    #[async_trait]
    impl PushStream for FakeStream {
        async fn state(&self) -> StreamState {
            StreamState::Connected
        }

        async fn connect(&self) {
            let _ = self.updates.send(StreamUpdate::Opened).await;
            let _ = self
                .updates
                .send(StreamUpdate::Event(MoveEvent {
                    message: "Queen to D4".to_string(),
                    timestamp: None,
                }))
                .await;
        }

        async fn disconnect(&self) {}
    }

    fn fake_stream(updates: mpsc::Sender<StreamUpdate>) -> FakeStream {
        FakeStream { updates }
    }

    fn press() -> ButtonEvent {
        ButtonEvent {
            id: "primary".to_string(),
            kind: PressKind::Short,
        }
    }

    fn session(id: &str, user: &str) -> SessionInfo {
        SessionInfo {
            session_id: id.to_string(),
            user_id: user.to_string(),
            capabilities: Capabilities::default(),
        }
    }

    async fn next_wall(walls: &mut mpsc::UnboundedReceiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(2), walls.recv())
            .await
            .expect("timed out waiting for a text wall")
            .expect("display channel closed")
    }

    type ProbeApp =
        BoardcastApp<ProbeGateway, FakeStream, fn(mpsc::Sender<StreamUpdate>) -> FakeStream>;

    fn on_demand_app(
        calls: mpsc::UnboundedSender<(String, String)>,
        walls: mpsc::UnboundedSender<String>,
    ) -> ProbeApp {
        BoardcastApp::new(
            DeliveryMode::OnDemand,
            Arc::new(ProbeGateway { calls }),
            fake_stream,
            Arc::new(ProbeSpeaker),
            Arc::new(ProbeDisplay { walls }),
        )
    }

    #[tokio::test]
    async fn button_reaches_the_session_it_belongs_to() {
        let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
        let (walls_tx, _walls_rx) = mpsc::unbounded_channel();
        let app = on_demand_app(calls_tx, walls_tx);

        app.on_session(session("s-1", "user-1")).await.unwrap();
        app.on_session(session("s-2", "user-2")).await.unwrap();

        assert!(app.route_button("s-1", press()).await);

        let (user, reason) = tokio::time::timeout(Duration::from_secs(2), calls_rx.recv())
            .await
            .expect("timed out waiting for the backend call")
            .expect("gateway channel closed");
        assert_eq!(user, "user-1");
        assert_eq!(reason, BUTTON_TRIGGER_REASON);
    }

    #[tokio::test]
    async fn button_for_an_unknown_session_is_dropped() {
        let (calls_tx, _calls_rx) = mpsc::unbounded_channel();
        let (walls_tx, _walls_rx) = mpsc::unbounded_channel();
        let app = on_demand_app(calls_tx, walls_tx);

        assert!(!app.route_button("nobody", press()).await);
    }

    #[tokio::test]
    async fn stop_unregisters_the_session_and_is_idempotent() {
        let (calls_tx, _calls_rx) = mpsc::unbounded_channel();
        let (walls_tx, _walls_rx) = mpsc::unbounded_channel();
        let app = on_demand_app(calls_tx, walls_tx);

        app.on_session(session("s-1", "user-1")).await.unwrap();
        app.on_stop("s-1", "user-1", "device went away").await.unwrap();

        assert!(!app.route_button("s-1", press()).await);
        app.on_stop("s-1", "user-1", "device went away").await.unwrap();
    }

    #[tokio::test]
    async fn push_sessions_receive_stream_updates_through_their_queue() {
        let (calls_tx, _calls_rx) = mpsc::unbounded_channel();
        let (walls_tx, mut walls_rx) = mpsc::unbounded_channel();
        let app = BoardcastApp::new(
            DeliveryMode::PushStream,
            Arc::new(ProbeGateway { calls: calls_tx }),
            |updates| FakeStream { updates },
            Arc::new(ProbeSpeaker),
            Arc::new(ProbeDisplay { walls: walls_tx }),
        );

        app.on_session(session("s-1", "user-1")).await.unwrap();

        assert_eq!(next_wall(&mut walls_rx).await, WELCOME_BANNER);
        assert_eq!(next_wall(&mut walls_rx).await, NOTICE_STREAM_OPEN);
        assert_eq!(next_wall(&mut walls_rx).await, "🔊 Queen to D4");
    }
}
