//! Interaction controller state machine

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::backend::{BackendClient, OrderAck, SearchResult};
use crate::bridge::{BridgeEvent, SpeechBridge, Synthesizer};
use crate::intent::{Intent, IntentParser};
use crate::{Error, Result};

use super::{ListeningState, Summary, UiEvent};

/// Maximum number of search results rendered
const MAX_RESULTS: usize = 3;

/// How long the order summary stays visible
const SUMMARY_VISIBLE: Duration = Duration::from_secs(5);

/// Backend operations the controller dispatches to
///
/// Seam over [`BackendClient`] so the state machine tests run without HTTP.
#[async_trait]
pub trait IntentBackend: Send + Sync {
    /// Search for the given query
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] when the request fails
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Forward an order phrase
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] when the request fails
    async fn submit_order(&self, text: &str) -> Result<OrderAck>;
}

#[async_trait]
impl IntentBackend for BackendClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        Self::search(self, query).await
    }

    async fn submit_order(&self, text: &str) -> Result<OrderAck> {
        Self::submit_order(self, text).await
    }
}

/// Drives one voice-interaction session at a time
///
/// Constructed once per page/process session. Consumes [`BridgeEvent`]s in
/// arrival order; no error propagates past this type.
pub struct InteractionController {
    state: ListeningState,
    bridge: Arc<dyn SpeechBridge>,
    synth: Arc<dyn Synthesizer>,
    backend: Arc<dyn IntentBackend>,
    parser: IntentParser,
    ui: mpsc::Sender<UiEvent>,
    summary: Option<Summary>,
    summary_generation: Arc<AtomicU64>,
    summary_visible: Duration,
    last_error: Option<String>,
    /// Whether any transcript text was displayed during the current session
    displayed_any: bool,
    /// A fresh session should start once the active one reports `Ended`
    restart_pending: bool,
    /// The capability-unavailable notice is shown at most once per session
    capability_notice_shown: bool,
}

impl InteractionController {
    /// Create a controller wired to the given capabilities and UI channel
    #[must_use]
    pub fn new(
        bridge: Arc<dyn SpeechBridge>,
        synth: Arc<dyn Synthesizer>,
        backend: Arc<dyn IntentBackend>,
        parser: IntentParser,
        ui: mpsc::Sender<UiEvent>,
    ) -> Self {
        Self {
            state: ListeningState::Idle,
            bridge,
            synth,
            backend,
            parser,
            ui,
            summary: None,
            summary_generation: Arc::new(AtomicU64::new(0)),
            summary_visible: SUMMARY_VISIBLE,
            last_error: None,
            displayed_any: false,
            restart_pending: false,
            capability_notice_shown: false,
        }
    }

    /// Override how long the summary stays visible (tests)
    #[must_use]
    pub const fn with_summary_visible(mut self, visible: Duration) -> Self {
        self.summary_visible = visible;
        self
    }

    /// Current listening state
    #[must_use]
    pub const fn state(&self) -> ListeningState {
        self.state
    }

    /// Latest order summary; retained even after its display expires
    #[must_use]
    pub const fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Most recent recognition error, if any
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The single visible control: starts listening when idle, stops when
    /// listening
    pub async fn toggle(&mut self) {
        match self.state {
            ListeningState::Idle => self.begin_session().await,
            ListeningState::Listening => self.end_session().await,
        }
    }

    /// Explicit start request. When a session is already active this performs
    /// exactly one stop-then-restart; two sessions never run concurrently.
    pub async fn start_listening(&mut self) {
        match self.state {
            ListeningState::Idle => self.begin_session().await,
            ListeningState::Listening => {
                if !self.restart_pending {
                    self.restart_pending = true;
                    self.end_session().await;
                }
            }
        }
    }

    /// Explicit stop request; also cancels any in-flight utterance
    pub async fn stop_listening(&mut self) {
        self.restart_pending = false;
        self.synth.cancel().await;
        if self.state == ListeningState::Listening {
            self.end_session().await;
        }
    }

    /// Consume bridge events until the channel closes
    pub async fn run(&mut self, mut events: mpsc::Receiver<BridgeEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!("bridge channel closed, controller stopping");
        self.synth.cancel().await;
    }

    /// Apply a single bridge event
    pub async fn handle_event(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Started => {
                tracing::debug!("recognition session started");
            }
            BridgeEvent::Result(transcript) => {
                self.displayed_any = true;
                self.emit(UiEvent::TranscriptUpdated(transcript.text.clone()))
                    .await;
                if transcript.is_final {
                    let intent = self.parser.classify(&transcript.text);
                    self.dispatch(intent).await;
                }
            }
            BridgeEvent::Ended => {
                self.state = ListeningState::Idle;
                self.emit(UiEvent::ListeningChanged(false)).await;
                if !self.displayed_any {
                    self.emit(UiEvent::PlaceholderRestored).await;
                }
                if self.restart_pending {
                    self.restart_pending = false;
                    self.begin_session().await;
                }
            }
            BridgeEvent::Error(reason) => {
                tracing::warn!(reason = %reason, "recognition error");
                self.last_error = Some(reason.clone());
                self.restart_pending = false;
                self.state = ListeningState::Idle;
                self.emit(UiEvent::Banner(format!("Recognition failed: {reason}")))
                    .await;
                self.emit(UiEvent::ListeningChanged(false)).await;
            }
        }
    }

    /// Start a recognition session, guarding the one-session invariant
    async fn begin_session(&mut self) {
        if self.state == ListeningState::Listening {
            return;
        }
        if !self.bridge.is_available() {
            if !self.capability_notice_shown {
                self.capability_notice_shown = true;
                self.emit(UiEvent::Banner(
                    "Speech recognition is not available here.".to_string(),
                ))
                .await;
            }
            return;
        }

        match self.bridge.start().await {
            Ok(()) => {
                self.state = ListeningState::Listening;
                self.displayed_any = false;
                self.emit(UiEvent::ListeningChanged(true)).await;
            }
            Err(Error::CapabilityUnavailable(reason)) => {
                tracing::warn!(reason = %reason, "speech capability unavailable");
                if !self.capability_notice_shown {
                    self.capability_notice_shown = true;
                    self.emit(UiEvent::Banner(
                        "Speech recognition is not available here.".to_string(),
                    ))
                    .await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start recognition");
                self.emit(UiEvent::Banner("Could not start listening.".to_string()))
                    .await;
            }
        }
    }

    /// Ask the bridge to stop; the state flips to idle on its `Ended` event
    async fn end_session(&mut self) {
        if let Err(e) = self.bridge.stop().await {
            tracing::warn!(error = %e, "failed to stop recognition");
        }
    }

    /// Dispatch a classified intent
    async fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Search { query } => self.dispatch_search(&query).await,
            Intent::Order {
                raw_text,
                dish,
                time,
            } => self.dispatch_order(raw_text, dish, time).await,
            Intent::Unclassified { raw_text } => {
                // Strict parsers only; echo locally so the input is never
                // dropped silently
                self.emit(UiEvent::Banner(format!("Heard: {raw_text}"))).await;
                self.speak_best_effort(&format!("I heard {raw_text}")).await;
            }
        }
    }

    async fn dispatch_search(&mut self, query: &str) {
        self.emit(UiEvent::LoadingChanged(true)).await;
        let outcome = self.backend.search(query).await;
        self.emit(UiEvent::LoadingChanged(false)).await;

        match outcome {
            Ok(results) if results.is_empty() => {
                self.emit(UiEvent::Banner("Nothing found.".to_string())).await;
                self.speak_best_effort("I found nothing for that.").await;
            }
            Ok(mut results) => {
                results.truncate(MAX_RESULTS);
                let count = results.len();
                self.emit(UiEvent::ResultsRendered(results)).await;
                self.speak_best_effort(&format!("I found {count} results."))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "search failed");
                self.emit(UiEvent::Banner("Search failed, please try again.".to_string()))
                    .await;
                self.speak_best_effort("Sorry, the search failed.").await;
            }
        }
    }

    async fn dispatch_order(
        &mut self,
        raw_text: String,
        dish: Option<String>,
        time: Option<String>,
    ) {
        let summary = Summary {
            dish: dish.clone(),
            place: None,
            time: time.clone(),
        };
        self.summary = Some(summary.clone());
        self.emit(UiEvent::SummaryShown(summary)).await;
        self.schedule_summary_hide();

        let confirmation = order_confirmation(dish.as_deref(), time.as_deref());
        self.speak_best_effort(&confirmation).await;

        // Fire and forget: the spoken confirmation is provisional UI
        // feedback, not a delivery guarantee
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            match backend.submit_order(&raw_text).await {
                Ok(ack) => tracing::debug!(reply = %ack.reply, "order forwarded"),
                Err(e) => tracing::warn!(error = %e, "order forwarding failed"),
            }
        });
    }

    /// Hide the summary after the display window, unless a newer order has
    /// replaced it in the meantime
    fn schedule_summary_hide(&self) {
        let generation = self.summary_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tracker = Arc::clone(&self.summary_generation);
        let ui = self.ui.clone();
        let visible = self.summary_visible;
        tokio::spawn(async move {
            tokio::time::sleep(visible).await;
            if tracker.load(Ordering::SeqCst) == generation {
                let _ = ui.send(UiEvent::SummaryHidden).await;
            }
        });
    }

    /// Speak without letting synthesis failures surface
    async fn speak_best_effort(&self, text: &str) {
        if let Err(e) = self.synth.speak(text).await {
            tracing::warn!(error = %e, "speech synthesis failed");
        }
    }

    async fn emit(&self, event: UiEvent) {
        if self.ui.send(event).await.is_err() {
            tracing::debug!("ui channel closed, dropping event");
        }
    }
}

/// Compose the spoken order confirmation from whatever fields are present
fn order_confirmation(dish: Option<&str>, time: Option<&str>) -> String {
    match (dish, time) {
        (Some(d), Some(t)) => format!("Ordering {d} at {t}."),
        (Some(d), None) => format!("Ordering {d}."),
        (None, Some(t)) => format!("Order noted for {t}."),
        (None, None) => "Order noted.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_omits_missing_parts() {
        assert_eq!(
            order_confirmation(Some("pizza"), Some("18:45")),
            "Ordering pizza at 18:45."
        );
        assert_eq!(order_confirmation(Some("pizza"), None), "Ordering pizza.");
        assert_eq!(
            order_confirmation(None, Some("09:00")),
            "Order noted for 09:00."
        );
        assert_eq!(order_confirmation(None, None), "Order noted.");
    }
}
