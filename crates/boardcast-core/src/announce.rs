//! Turns one move description into speech plus an on-lens confirmation.

use std::sync::Arc;
use std::time::Duration;

use crate::device::{Speaker, TextDisplay};

/// Shown when an announcement arrives with no text at all.
pub const EMPTY_MESSAGE_TEXT: &str = "(no message)";

/// How long a confirmation stays on the lens.
pub const DEFAULT_WALL_DURATION: Duration = Duration::from_millis(3000);

/// How the announcement went out. The wearer gets the text wall in every
/// case; only the audio half degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// Audio played; the wall mirrors what was said.
    Spoken,
    /// The engine answered but produced no audio; text only.
    SynthesisFailed,
    /// The speak call itself failed; text only.
    SpeechError,
}

/// Renders announcements. Speech failures never escape: whatever the audio
/// layer does, the wearer still gets a readable wall.
pub struct Announcer {
    speaker: Arc<dyn Speaker>,
    display: Arc<dyn TextDisplay>,
    wall_duration: Duration,
}

impl Announcer {
    pub fn new(speaker: Arc<dyn Speaker>, display: Arc<dyn TextDisplay>) -> Self {
        Self {
            speaker,
            display,
            wall_duration: DEFAULT_WALL_DURATION,
        }
    }

    pub fn with_wall_duration(mut self, wall_duration: Duration) -> Self {
        self.wall_duration = wall_duration;
        self
    }

    pub async fn announce(&self, text: &str) -> AnnounceOutcome {
        let text = text.trim();
        let text = if text.is_empty() {
            EMPTY_MESSAGE_TEXT
        } else {
            text
        };

        let (wall, outcome) = match self.speaker.speak(text).await {
            Ok(result) if result.success => (format!("🔊 {text}"), AnnounceOutcome::Spoken),
            Ok(result) => {
                tracing::warn!(error = ?result.error, "speech synthesis failed, falling back to text");
                (
                    format!("{text} (TTS failed)"),
                    AnnounceOutcome::SynthesisFailed,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "speak call failed, falling back to text");
                (format!("{text} (TTS error)"), AnnounceOutcome::SpeechError)
            }
        };

        self.display.show_text_wall(&wall, self.wall_duration);
        outcome
    }
}
