//! Intent parsing
//!
//! Turns a finalized transcript into an actionable [`Intent`]: a search, an
//! order, or an unclassified utterance. Parsing is pure pattern matching over
//! a configurable keyword table; no side effects, no host environment.

mod normalize;
mod parser;

pub use normalize::dedupe_words;
pub use parser::{Intent, IntentParser, KeywordTable};
