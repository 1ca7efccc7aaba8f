//! Traits over the glasses hardware. The real device platform provides these;
//! the console runtime fakes them for development.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// What the device told us it can do when the session started.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub audio_output: bool,
    pub model: Option<String>,
}

/// One press of a hardware button, as delivered by the device platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub id: String,
    pub kind: PressKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

/// What one speech attempt came back with, as the audio layer reports it.
#[derive(Debug, Clone)]
pub struct SpeechOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl SpeechOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Text-to-speech output on the device.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Speaker: Send + Sync {
    /// Synthesize and play `text`. `Ok` with `success: false` means the
    /// engine answered but could not produce audio; `Err` means the call
    /// itself failed.
    async fn speak(&self, text: &str) -> Result<SpeechOutcome>;
}

/// The lens display.
#[cfg_attr(test, automock)]
pub trait TextDisplay: Send + Sync {
    /// Put `text` on the lens for roughly `duration`, after which the device
    /// dismisses it on its own. Initiation only; never awaited further.
    fn show_text_wall(&self, text: &str, duration: Duration);
}
