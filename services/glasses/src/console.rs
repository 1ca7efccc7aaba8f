//! Console stand-ins for the glasses hardware, used when running the service
//! on a workstation instead of a device.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use boardcast_core::device::{Speaker, SpeechOutcome, TextDisplay};

/// Prints what the lens would show. The real lens dismisses the wall on its
/// own; the console just notes how long it would have stayed up.
pub struct ConsoleDisplay;

impl TextDisplay for ConsoleDisplay {
    fn show_text_wall(&self, text: &str, duration: Duration) {
        println!("  [lens {:>4}ms] {text}", duration.as_millis());
    }
}

/// Speaks by printing. With audio disabled it reports a synthesis failure the
/// way a speaker-less device would, which exercises the text-only fallback.
pub struct ConsoleSpeaker {
    pub audio_output: bool,
}

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<SpeechOutcome> {
        if self.audio_output {
            println!("  [audio] {text}");
            Ok(SpeechOutcome::success())
        } else {
            Ok(SpeechOutcome::failure("audio output disabled"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn speaker_reports_synthesis_failure_without_audio() {
        let muted = ConsoleSpeaker {
            audio_output: false,
        };
        let outcome = muted.speak("Rook to B1").await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.is_some());

        let audible = ConsoleSpeaker { audio_output: true };
        let outcome = audible.speak("Rook to B1").await.unwrap();
        assert!(outcome.success);
    }
}
