//! Savor Gateway - voice ordering front end
//!
//! This library provides the core functionality for the Savor voice ordering
//! demo:
//! - Intent parsing (search / order classification, dish and time extraction)
//! - The voice-interaction state machine
//! - Location resolution with a persisted, time-bounded cache
//! - HTTP client for the remote search/places/order/TTS service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Capability Bridge                    │
//! │   speech recognition events  │  speech synthesis    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Interaction Controller                  │
//! │   listening state  │  intent dispatch  │  summary   │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐      ┌───────────▼────────────┐
//! │    Intent Parser    │      │     Backend Client      │
//! │  keyword matching   │      │  search / order / TTS  │
//! └─────────────────────┘      └────────────────────────┘
//! ```

pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
pub mod intent;
pub mod location;
pub mod session;

pub use backend::{BackendClient, HealthStatus, OrderAck, Place, SearchResult};
pub use bridge::{
    BackendSynthesizer, BridgeEvent, ScriptedBridge, SpeechBridge, Synthesizer, Transcript,
};
pub use config::Config;
pub use error::{Error, Result};
pub use intent::{Intent, IntentParser, KeywordTable, dedupe_words};
pub use location::{FALLBACK_COORD, GeolocationProvider, Location, LocationCache};
pub use session::{IntentBackend, InteractionController, ListeningState, Summary, UiEvent};
