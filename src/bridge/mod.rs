//! Capability bridge
//!
//! Abstraction over the host's speech capabilities: recognition (speech to
//! text) as an event stream, and synthesis (text to speech) as a stateless
//! best-effort call. The controller consumes [`BridgeEvent`]s from a single
//! channel; events for a given session arrive in the order the capability
//! emitted them.

mod scripted;
mod synth;

pub use scripted::ScriptedBridge;
pub use synth::BackendSynthesizer;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Text produced by speech recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Recognized text
    pub text: String,
    /// Whether the recognition engine considers this text final
    pub is_final: bool,
}

impl Transcript {
    /// An interim (partial) recognition result
    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// A finalized recognition result
    #[must_use]
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Event emitted by a speech recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Recognition session started
    Started,
    /// A recognition result, interim or final
    Result(Transcript),
    /// Recognition session ended; no further events for this session
    Ended,
    /// Recognition failed; the session is over
    Error(String),
}

/// Host speech-recognition capability
///
/// Implementations emit [`BridgeEvent`]s on the channel handed to them at
/// construction. `start` and `stop` bound a single recognition session; only
/// one session may be active at a time (enforced by the controller, not the
/// bridge).
#[async_trait]
pub trait SpeechBridge: Send + Sync {
    /// Whether speech recognition is available in this environment
    fn is_available(&self) -> bool;

    /// Begin a recognition session
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CapabilityUnavailable`] when the host has no
    /// recognition support, or [`crate::Error::Recognition`] when the session
    /// cannot start
    async fn start(&self) -> Result<()>;

    /// End the active recognition session; the bridge still delivers its
    /// `Ended` event afterwards
    async fn stop(&self) -> Result<()>;
}

/// Host speech-synthesis capability
///
/// Synthesis is stateless and best-effort: failures are logged by callers,
/// never surfaced to the user.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak the given text
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Synthesis`] when synthesis fails
    async fn speak(&self, text: &str) -> Result<()>;

    /// Cancel any in-flight utterance. Called on stop and teardown; synthesis
    /// is never queued across session boundaries.
    async fn cancel(&self);
}

/// Create the event channel connecting a bridge to the controller
#[must_use]
pub fn event_channel() -> (mpsc::Sender<BridgeEvent>, mpsc::Receiver<BridgeEvent>) {
    mpsc::channel(32)
}
