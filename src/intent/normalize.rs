//! Transcript normalization

/// Collapse immediately-repeated words (case-insensitive) to a single
/// occurrence, keeping the first occurrence's casing.
///
/// Recognition engines sometimes double-emit a word at chunk boundaries
/// ("two two pizzas"); this pass runs uniformly on every transcript before
/// classification.
#[must_use]
pub fn dedupe_words(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut prev_lower = String::new();

    for word in text.split_whitespace() {
        let lower = word.to_lowercase();
        if lower != prev_lower {
            out.push(word);
        }
        prev_lower = lower;
    }

    out.join(" ")
}
