//! Backend-routed speech synthesis

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::backend::BackendClient;
use crate::{Error, Result};

use super::Synthesizer;

/// Synthesizer backed by the remote TTS endpoint
///
/// Audio bytes are fetched and handed to the host for playback elsewhere;
/// this type only guarantees that at most one utterance is in flight and that
/// `cancel` drops it.
pub struct BackendSynthesizer {
    backend: Arc<BackendClient>,
    lang: String,
    current: Mutex<Option<AbortHandle>>,
}

impl BackendSynthesizer {
    /// Create a synthesizer speaking the given language
    #[must_use]
    pub fn new(backend: Arc<BackendClient>, lang: impl Into<String>) -> Self {
        Self {
            backend,
            lang: lang.into(),
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Synthesizer for BackendSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        // A new utterance supersedes any in-flight one
        self.cancel().await;

        let backend = Arc::clone(&self.backend);
        let lang = self.lang.clone();
        let text = text.to_string();
        let task = tokio::spawn(async move { backend.speak(&text, &lang).await });

        *self.current.lock().await = Some(task.abort_handle());

        match task.await {
            Ok(Ok(audio)) => {
                tracing::debug!(bytes = audio.len(), "utterance synthesized");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Synthesis(e.to_string())),
            Err(e) if e.is_cancelled() => {
                tracing::debug!("utterance cancelled");
                Ok(())
            }
            Err(e) => Err(Error::Synthesis(e.to_string())),
        }
    }

    async fn cancel(&self) {
        if let Some(handle) = self.current.lock().await.take() {
            handle.abort();
        }
    }
}
