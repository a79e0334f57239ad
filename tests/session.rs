//! Interaction controller integration tests
//!
//! Exercises the full listening state machine with a scripted bridge and a
//! stub backend; no audio hardware, no network.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use savor_gateway::bridge::{ScriptedBridge, SpeechBridge, event_channel};
use savor_gateway::{
    BridgeEvent, IntentParser, InteractionController, KeywordTable, ListeningState, UiEvent,
};

mod common;

use common::{RecordingSynth, StubBackend, drain_ui, spoken};

struct Harness {
    controller: InteractionController,
    bridge: Arc<ScriptedBridge>,
    events: mpsc::Receiver<BridgeEvent>,
    ui: mpsc::Receiver<UiEvent>,
    synth: Arc<RecordingSynth>,
    backend: Arc<StubBackend>,
}

fn setup(backend: StubBackend) -> Harness {
    let (events_tx, events) = event_channel();
    let bridge = Arc::new(ScriptedBridge::new(events_tx));
    let synth = Arc::new(RecordingSynth::default());
    let backend = Arc::new(backend);
    let (ui_tx, ui) = mpsc::channel(64);

    let parser = IntentParser::new(KeywordTable::english()).unwrap();
    let speech: Arc<dyn SpeechBridge> = bridge.clone();
    let controller =
        InteractionController::new(speech, synth.clone(), backend.clone(), parser, ui_tx)
            .with_summary_visible(Duration::from_millis(20));

    Harness {
        controller,
        bridge,
        events,
        ui,
        synth,
        backend,
    }
}

impl Harness {
    /// Apply the next `n` queued bridge events to the controller
    async fn pump(&mut self, n: usize) {
        for _ in 0..n {
            let event = self.events.recv().await.expect("bridge event");
            self.controller.handle_event(event).await;
        }
    }
}

#[tokio::test]
async fn test_toggle_starts_and_stops_one_session() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    assert_eq!(h.controller.state(), ListeningState::Listening);

    h.controller.toggle().await;
    h.pump(2).await; // Started, Ended
    assert_eq!(h.controller.state(), ListeningState::Idle);

    let ui = drain_ui(&mut h.ui);
    assert!(ui.contains(&UiEvent::ListeningChanged(true)));
    assert!(ui.contains(&UiEvent::ListeningChanged(false)));
    // No transcript was ever shown
    assert!(ui.contains(&UiEvent::PlaceholderRestored));
}

#[tokio::test]
async fn test_double_start_is_one_stop_then_restart() {
    let mut h = setup(StubBackend::default());

    h.controller.start_listening().await;
    h.controller.start_listening().await;
    // A third rapid press must not schedule a second restart
    h.controller.start_listening().await;

    // First session: Started, then the stop's Ended triggers the restart
    h.pump(2).await;
    assert_eq!(h.controller.state(), ListeningState::Listening);

    // Exactly one new session was started and nothing else is queued
    let event = h.events.recv().await.unwrap();
    assert_eq!(event, BridgeEvent::Started);
    h.controller.handle_event(event).await;
    assert!(h.events.try_recv().is_err());
    assert_eq!(h.controller.state(), ListeningState::Listening);
}

#[tokio::test]
async fn test_interim_results_are_displayed_not_classified() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge.interim("find piz").await.unwrap();
    h.pump(2).await; // Started, Result

    let ui = drain_ui(&mut h.ui);
    assert!(ui.contains(&UiEvent::TranscriptUpdated("find piz".to_string())));
    assert!(h.backend.searches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_renders_at_most_three_results() {
    let mut h = setup(StubBackend::with_results(5));

    h.controller.toggle().await;
    h.bridge.final_transcript("find pizza places").await.unwrap();
    h.pump(2).await;

    assert_eq!(
        h.backend.searches.lock().unwrap().as_slice(),
        ["pizza places"]
    );

    let ui = drain_ui(&mut h.ui);
    let rendered = ui.iter().find_map(|e| match e {
        UiEvent::ResultsRendered(r) => Some(r.len()),
        _ => None,
    });
    assert_eq!(rendered, Some(3));
    assert!(ui.contains(&UiEvent::LoadingChanged(true)));
    assert!(ui.contains(&UiEvent::LoadingChanged(false)));
    assert_eq!(spoken(&h.synth), ["I found 3 results."]);
}

#[tokio::test]
async fn test_empty_search_says_nothing_found() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge.final_transcript("search unicorn soup").await.unwrap();
    h.pump(2).await;

    let ui = drain_ui(&mut h.ui);
    assert!(ui.contains(&UiEvent::Banner("Nothing found.".to_string())));
    assert!(!ui.iter().any(|e| matches!(e, UiEvent::ResultsRendered(_))));
    assert_eq!(spoken(&h.synth), ["I found nothing for that."]);
    // The session is still alive; the bridge decides when it ends
    assert_eq!(h.controller.state(), ListeningState::Listening);
}

#[tokio::test]
async fn test_search_failure_shows_generic_error() {
    let mut h = setup(StubBackend::failing());

    h.controller.toggle().await;
    h.bridge.final_transcript("find pizza").await.unwrap();
    h.pump(2).await;

    let ui = drain_ui(&mut h.ui);
    assert!(ui.contains(&UiEvent::Banner("Search failed, please try again.".to_string())));
}

#[tokio::test]
async fn test_order_updates_summary_and_speaks_confirmation() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge
        .final_transcript("order two pizzas at 18:45")
        .await
        .unwrap();
    h.pump(2).await;

    let summary = h.controller.summary().expect("summary set");
    assert_eq!(summary.dish.as_deref(), Some("pizzas"));
    assert_eq!(summary.time.as_deref(), Some("18:45"));
    assert_eq!(spoken(&h.synth), ["Ordering pizzas at 18:45."]);

    // Forwarding is fire-and-forget; give the spawned task a beat
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        h.backend.orders.lock().unwrap().as_slice(),
        ["order two pizzas at 18:45"]
    );
}

#[tokio::test]
async fn test_summary_hides_but_is_retained() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge.final_transcript("order pasta").await.unwrap();
    h.pump(2).await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    let ui = drain_ui(&mut h.ui);
    assert!(ui.iter().any(|e| matches!(e, UiEvent::SummaryShown(_))));
    assert!(ui.contains(&UiEvent::SummaryHidden));

    // Hidden, not deleted
    assert!(h.controller.summary().is_some());
}

#[tokio::test]
async fn test_new_order_supersedes_pending_hide() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge.final_transcript("order pasta").await.unwrap();
    h.bridge.final_transcript("order pizza at 12").await.unwrap();
    h.pump(3).await; // Started + two finals

    tokio::time::sleep(Duration::from_millis(80)).await;
    let ui = drain_ui(&mut h.ui);
    let hides = ui.iter().filter(|e| **e == UiEvent::SummaryHidden).count();
    assert_eq!(hides, 1);

    let summary = h.controller.summary().unwrap();
    assert_eq!(summary.dish.as_deref(), Some("pizza"));
}

#[tokio::test]
async fn test_recognition_error_returns_to_idle() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.bridge.fail("no-speech").await.unwrap();
    h.pump(2).await; // Started, Error

    assert_eq!(h.controller.state(), ListeningState::Idle);
    assert_eq!(h.controller.last_error(), Some("no-speech"));

    let ui = drain_ui(&mut h.ui);
    assert!(ui.contains(&UiEvent::Banner("Recognition failed: no-speech".to_string())));
    assert!(ui.contains(&UiEvent::ListeningChanged(false)));
}

#[tokio::test]
async fn test_unavailable_capability_notice_shown_once() {
    let (events_tx, _events) = event_channel();
    let bridge = Arc::new(ScriptedBridge::unavailable(events_tx));
    let synth = Arc::new(RecordingSynth::default());
    let backend = Arc::new(StubBackend::default());
    let (ui_tx, mut ui) = mpsc::channel(64);
    let parser = IntentParser::new(KeywordTable::english()).unwrap();
    let speech: Arc<dyn SpeechBridge> = bridge;
    let mut controller = InteractionController::new(speech, synth, backend, parser, ui_tx);

    controller.toggle().await;
    controller.toggle().await;

    assert_eq!(controller.state(), ListeningState::Idle);
    let banners = drain_ui(&mut ui)
        .into_iter()
        .filter(|e| matches!(e, UiEvent::Banner(_)))
        .count();
    assert_eq!(banners, 1);
}

#[tokio::test]
async fn test_stop_cancels_in_flight_synthesis() {
    let mut h = setup(StubBackend::default());

    h.controller.toggle().await;
    h.controller.stop_listening().await;
    h.pump(2).await; // Started, Ended

    assert!(
        h.synth
            .cancelled
            .load(std::sync::atomic::Ordering::SeqCst)
            >= 1
    );
}
