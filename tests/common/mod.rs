//! Shared test utilities

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;
use tokio::sync::mpsc;

use savor_gateway::backend::{OrderAck, SearchResult};
use savor_gateway::bridge::Synthesizer;
use savor_gateway::session::IntentBackend;
use savor_gateway::{Error, Result, UiEvent};

/// Backend stub with scripted search outcomes, recording every call
#[derive(Default)]
pub struct StubBackend {
    /// Results returned by `search`
    pub results: Vec<SearchResult>,
    /// Whether `search` should fail
    pub fail_search: bool,
    /// Queries received
    pub searches: Mutex<Vec<String>>,
    /// Order phrases received
    pub orders: Mutex<Vec<String>>,
}

impl StubBackend {
    /// Stub returning `count` canned results
    #[must_use]
    pub fn with_results(count: usize) -> Self {
        let results = (0..count)
            .map(|i| SearchResult {
                title: format!("Result {i}"),
                link: format!("https://example.com/{i}"),
                snippet: String::new(),
            })
            .collect();
        Self {
            results,
            ..Self::default()
        }
    }

    /// Stub whose searches fail
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_search: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl IntentBackend for StubBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.fail_search {
            return Err(Error::backend_status(500, "boom"));
        }
        Ok(self.results.clone())
    }

    async fn submit_order(&self, text: &str) -> Result<OrderAck> {
        self.orders.lock().unwrap().push(text.to_string());
        Ok(OrderAck {
            reply: "ok".to_string(),
        })
    }
}

/// Synthesizer stub recording spoken phrases
#[derive(Default)]
pub struct RecordingSynth {
    /// Phrases passed to `speak`
    pub spoken: Mutex<Vec<String>>,
    /// Number of `cancel` calls
    pub cancelled: AtomicUsize,
}

#[async_trait]
impl Synthesizer for RecordingSynth {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn cancel(&self) {
        self.cancelled
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Drain everything currently queued on the UI channel
pub fn drain_ui(rx: &mut mpsc::Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Convenience: the stub's spoken phrases, cloned out
pub fn spoken(synth: &Arc<RecordingSynth>) -> Vec<String> {
    synth.spoken.lock().unwrap().clone()
}
