//! Word Synchronizer
//!
//! Distributes a phrase's duration across its words in proportion to their
//! length, counting one trailing space per word.

use super::models::{PhraseTiming, WordTiming};

/// Splits segment text into words; punctuation stays attached
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Proportional word time allocator
pub struct WordSynchronizer;

impl WordSynchronizer {
    /// Allocates word spans covering the phrase
    ///
    /// Each word gets `round(duration * (len + 1) / total)` milliseconds, capped
    /// at the phrase end. The last word always ends at the phrase end so the
    /// spans tile the phrase without gaps.
    pub fn allocate(phrase: &PhraseTiming) -> Vec<WordTiming> {
        let total_chars: usize = phrase.words.iter().map(|w| w.chars().count() + 1).sum();
        if total_chars == 0 {
            return Vec::new();
        }

        let duration = phrase.duration();
        let last = phrase.words.len() - 1;
        let mut start = phrase.start;

        phrase
            .words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let share = (word.chars().count() + 1) as f64 / total_chars as f64;
                let end = if i == last {
                    phrase.end
                } else {
                    (start + (duration * share).round()).min(phrase.end)
                };
                let timing = WordTiming::new(word.as_str(), start, end);
                start = end;
                timing
            })
            .collect()
    }
}
