//! Scripted bridge
//!
//! A [`SpeechBridge`] whose transcripts are injected programmatically. Backs
//! the `savor listen` command (stdin lines become final transcripts) and the
//! integration tests; no audio hardware involved.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{Error, Result};

use super::{BridgeEvent, SpeechBridge, Transcript};

/// Bridge fed by the caller instead of a recognition engine
pub struct ScriptedBridge {
    events: mpsc::Sender<BridgeEvent>,
    available: bool,
}

impl ScriptedBridge {
    /// Create a bridge emitting on the given channel
    #[must_use]
    pub const fn new(events: mpsc::Sender<BridgeEvent>) -> Self {
        Self {
            events,
            available: true,
        }
    }

    /// A bridge that reports no speech capability
    #[must_use]
    pub const fn unavailable(events: mpsc::Sender<BridgeEvent>) -> Self {
        Self {
            events,
            available: false,
        }
    }

    /// Inject an interim recognition result
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recognition`] when the event channel is closed
    pub async fn interim(&self, text: &str) -> Result<()> {
        self.send(BridgeEvent::Result(Transcript::interim(text))).await
    }

    /// Inject a finalized recognition result
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recognition`] when the event channel is closed
    pub async fn final_transcript(&self, text: &str) -> Result<()> {
        self.send(BridgeEvent::Result(Transcript::finalized(text)))
            .await
    }

    /// Inject a recognition failure
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recognition`] when the event channel is closed
    pub async fn fail(&self, reason: &str) -> Result<()> {
        self.send(BridgeEvent::Error(reason.to_string())).await
    }

    async fn send(&self, event: BridgeEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| Error::Recognition("bridge channel closed".to_string()))
    }
}

#[async_trait]
impl SpeechBridge for ScriptedBridge {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn start(&self) -> Result<()> {
        if !self.available {
            return Err(Error::CapabilityUnavailable(
                "no speech recognition in this environment".to_string(),
            ));
        }
        self.send(BridgeEvent::Started).await
    }

    async fn stop(&self) -> Result<()> {
        self.send(BridgeEvent::Ended).await
    }
}
