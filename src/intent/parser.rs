//! Transcript classification and field extraction

use regex::Regex;
use serde::Serialize;

use crate::{Error, Result};

use super::normalize::dedupe_words;

/// Minimum dish label length, in characters, after trimming
const MIN_DISH_CHARS: usize = 3;

/// Classified meaning of a finalized transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// A search request with the leading keyword stripped
    Search {
        /// Remainder of the transcript after the search keyword
        query: String,
    },
    /// An order, with best-effort dish and time extraction
    Order {
        /// The full normalized transcript
        raw_text: String,
        /// Extracted dish label, when one was found
        dish: Option<String>,
        /// Extracted time of day as zero-padded `HH:MM`
        time: Option<String>,
    },
    /// Neither keyword set matched (strict classification only)
    Unclassified {
        /// The full normalized transcript
        raw_text: String,
    },
}

/// Keyword lists driving classification
///
/// The lists are locale-specific and ad hoc by design; the table is a value
/// passed at parser construction so callers can swap locales without touching
/// the matching rules.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    /// Leading keywords that mark a search request
    pub search: Vec<String>,
    /// Leading keywords that mark an explicit order
    pub order: Vec<String>,
    /// Quantity words dropped from the front of a dish phrase
    pub quantities: Vec<String>,
    /// Prepositions introducing a time of day ("at 18:45")
    pub time_markers: Vec<String>,
    /// Words that terminate a dish phrase
    pub dish_stops: Vec<String>,
}

impl KeywordTable {
    /// English keyword table
    #[must_use]
    pub fn english() -> Self {
        Self {
            search: vec!["find", "show", "search", "where is"]
                .into_iter()
                .map(String::from)
                .collect(),
            order: vec!["order", "i'd like", "please", "i want"]
                .into_iter()
                .map(String::from)
                .collect(),
            quantities: vec!["one", "two", "three", "four"]
                .into_iter()
                .map(String::from)
                .collect(),
            time_markers: vec!["at".to_string()],
            dish_stops: vec!["at".to_string(), "for".to_string()],
        }
    }

    /// Polish keyword table, for the demo's home market
    #[must_use]
    pub fn polish() -> Self {
        Self {
            search: vec!["znajdź", "pokaż", "szukaj", "gdzie jest"]
                .into_iter()
                .map(String::from)
                .collect(),
            order: vec!["zamów", "poproszę", "chciałbym", "chcę"]
                .into_iter()
                .map(String::from)
                .collect(),
            quantities: vec!["jeden", "jedną", "dwa", "dwie", "trzy", "cztery"]
                .into_iter()
                .map(String::from)
                .collect(),
            time_markers: vec!["na".to_string(), "o".to_string()],
            dish_stops: vec!["na".to_string(), "o".to_string()],
        }
    }

    /// Look up a table by language code ("en", "pl")
    #[must_use]
    pub fn for_language(lang: &str) -> Self {
        match lang {
            "pl" => Self::polish(),
            _ => Self::english(),
        }
    }

    fn normalized(mut self) -> Self {
        let norm = |words: &mut Vec<String>| {
            for w in words.iter_mut() {
                *w = w.to_lowercase().trim().to_string();
            }
        };
        norm(&mut self.search);
        norm(&mut self.order);
        norm(&mut self.quantities);
        norm(&mut self.time_markers);
        norm(&mut self.dish_stops);
        self
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::english()
    }
}

/// Classifies transcripts into [`Intent`]s
pub struct IntentParser {
    table: KeywordTable,
    time_re: Regex,
}

impl IntentParser {
    /// Create a parser over the given keyword table
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the table produces an invalid time
    /// pattern (empty time marker list)
    pub fn new(table: KeywordTable) -> Result<Self> {
        let table = table.normalized();
        if table.time_markers.is_empty() {
            return Err(Error::Config("keyword table has no time markers".to_string()));
        }

        let markers = table
            .time_markers
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)\b(?:{markers})\s+(\d{{1,2}})(?::(\d{{2}}))?\b");
        let time_re =
            Regex::new(&pattern).map_err(|e| Error::Config(format!("time pattern: {e}")))?;

        tracing::debug!(
            search = ?table.search,
            order = ?table.order,
            "intent parser initialized"
        );

        Ok(Self { table, time_re })
    }

    /// Classify a transcript, falling back to an implicit order
    ///
    /// Unrecognized input is treated as an order rather than rejected: the
    /// demo trades precision for always producing an actionable intent.
    #[must_use]
    pub fn classify(&self, text: &str) -> Intent {
        match self.classify_strict(text) {
            Intent::Unclassified { raw_text } => {
                tracing::debug!(text = %raw_text, "no keyword match, treating as implicit order");
                self.parse_order(&raw_text, &raw_text)
            }
            intent => intent,
        }
    }

    /// Classify a transcript, returning [`Intent::Unclassified`] when neither
    /// keyword set matches
    #[must_use]
    pub fn classify_strict(&self, text: &str) -> Intent {
        let cleaned = dedupe_words(text);

        // Search is checked before order: input matching both resolves to Search
        if let Some(query) = strip_leading_keyword(&cleaned, &self.table.search) {
            tracing::debug!(query = %query, "classified as search");
            return Intent::Search {
                query: query.to_string(),
            };
        }

        if let Some(rest) = strip_leading_keyword(&cleaned, &self.table.order) {
            let rest = rest.to_string();
            return self.parse_order(&cleaned, &rest);
        }

        Intent::Unclassified { raw_text: cleaned }
    }

    /// Build an order intent, extracting dish and time from `body`
    fn parse_order(&self, raw: &str, body: &str) -> Intent {
        let time = self.extract_time(body);
        let dish = self.extract_dish(body);
        tracing::debug!(dish = ?dish, time = ?time, "classified as order");
        Intent::Order {
            raw_text: raw.to_string(),
            dish,
            time,
        }
    }

    /// Extract the first "marker H[:MM]" occurrence as zero-padded `HH:MM`
    fn extract_time(&self, text: &str) -> Option<String> {
        let caps = self.time_re.captures(text)?;
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute = caps.get(2).map_or("00", |m| m.as_str());
        Some(format!("{hour:02}:{minute}"))
    }

    /// Extract a dish label: drop a leading quantity word, capture the run of
    /// letters/spaces/hyphens, truncate at the first stop word
    fn extract_dish(&self, body: &str) -> Option<String> {
        let rest = strip_leading_keyword(body, &self.table.quantities).unwrap_or(body);

        let mut run = String::new();
        for c in rest.chars() {
            if c.is_alphabetic() || c == ' ' || c == '-' {
                run.push(c);
            } else {
                break;
            }
        }

        // Scan words of `run` itself: lowercasing the whole run first can
        // change byte lengths and invalidate the cut offset.
        let cut = self.first_stop_word(&run).unwrap_or(run.len());

        let dish = run[..cut].trim();
        if dish.chars().count() >= MIN_DISH_CHARS {
            Some(dish.to_string())
        } else {
            None
        }
    }

    /// Byte offset of the first standalone stop word in `text`, comparing
    /// each space/hyphen-delimited word case-insensitively
    fn first_stop_word(&self, text: &str) -> Option<usize> {
        let mut start = 0;
        for (i, c) in text.char_indices() {
            if c == ' ' || c == '-' {
                if self.is_stop_word(&text[start..i]) {
                    return Some(start);
                }
                start = i + c.len_utf8();
            }
        }
        if self.is_stop_word(&text[start..]) {
            return Some(start);
        }
        None
    }

    fn is_stop_word(&self, word: &str) -> bool {
        !word.is_empty()
            && self
                .table
                .dish_stops
                .iter()
                .any(|stop| word.to_lowercase() == *stop)
    }

    /// The keyword table this parser matches against
    #[must_use]
    pub const fn table(&self) -> &KeywordTable {
        &self.table
    }
}

/// Match a leading keyword (case-insensitive, whole-word) and return the
/// remainder with original casing, leading whitespace trimmed.
///
/// A transcript that is exactly the keyword yields an empty remainder, not
/// `None` — the caller decides whether an empty query/dish is meaningful.
fn strip_leading_keyword<'a>(text: &'a str, keywords: &[String]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    for kw in keywords {
        if let Some(after) = lower.strip_prefix(kw.as_str()) {
            if !after.is_empty() && !after.starts_with(char::is_whitespace) {
                continue;
            }
            // Slice the original text at the same character count; the
            // lowercased copy may differ in byte length.
            let chars = kw.chars().count();
            let byte = text
                .char_indices()
                .nth(chars)
                .map_or(text.len(), |(i, _)| i);
            return Some(text[byte..].trim_start());
        }
    }
    None
}
