//! Segment Builder
//!
//! Walks a chapter's timing entries alongside its verse text and emits one
//! [`Segment`] per timed verse (or verse bridge), with sub-segment markers
//! resolved to absolute word offsets.
//!
//! # Walk
//!
//! For each verse in document order the cursor seeks forward to the first
//! entry addressing that verse. Entries for earlier verses and orphan
//! continuations are passed over. When the next explicit entry belongs to a
//! later verse the current verse has no timing and nothing is consumed.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::project::{ExtraTiming, Segment};
use crate::core::{SegmentId, TimeMs, VerseNumber};

use super::annotations::TimingEntry;
use super::phrases::{phrase_word_counts, PhraseDelimiters};
use super::verse_code::{CursorState, VerseCode};

/// Default text joining bridged verses
pub const DEFAULT_BRIDGE_SEPARATOR: &str = " ";

/// One verse of chapter text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseText {
    pub number: VerseNumber,
    pub text: String,
}

impl VerseText {
    pub fn new(number: VerseNumber, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

// =============================================================================
// Segment Builder
// =============================================================================

/// Builds chapter segments from timing entries and verse text
#[derive(Clone, Debug)]
pub struct SegmentBuilder {
    delimiters: PhraseDelimiters,
    bridge_separator: String,
}

impl SegmentBuilder {
    pub fn new(delimiters: &PhraseDelimiters) -> Self {
        Self {
            delimiters: delimiters.clone(),
            bridge_separator: DEFAULT_BRIDGE_SEPARATOR.to_string(),
        }
    }

    /// Sets the text placed between bridged verses
    pub fn with_bridge_separator(mut self, separator: impl Into<String>) -> Self {
        self.bridge_separator = separator.into();
        self
    }

    /// Builds the chapter's segments
    ///
    /// Segment ids are sequential from 0 in emission order.
    pub fn build(&self, entries: &[TimingEntry], verses: &[VerseText]) -> Vec<Segment> {
        let codes: Vec<VerseCode> = entries.iter().map(TimingEntry::verse_code).collect();
        let mut segments = Vec::new();
        let mut state = CursorState::default();
        let mut verse_idx = 0;

        while verse_idx < verses.len() {
            let verse = &verses[verse_idx];

            let Some(found) = seek(&codes, state.index, verse.number) else {
                debug!("Verse {} has no timing, skipping", verse.number);
                verse_idx += 1;
                continue;
            };

            let segment = match codes[found] {
                VerseCode::Bridge { start, end } => {
                    let bridged = verses[verse_idx..]
                        .iter()
                        .take_while(|v| v.number <= end)
                        .count()
                        .max(1);
                    let text = self.bridge_text(&verses[verse_idx..verse_idx + bridged]);
                    verse_idx += bridged;

                    let last = last_bridge_entry(&codes, found);
                    state = state.at_index(last + 1).enter_verse(end);

                    PendingSegment {
                        text,
                        verse: format!("{}-{}", start, end),
                        start: entries[found].start_ms,
                        end: effective_end(entries, last),
                        extra_timings: Vec::new(),
                    }
                }
                _ => {
                    let (next_state, extra_timings) =
                        self.walk_verse(entries, &codes, state.at_index(found), verse);
                    state = next_state;
                    verse_idx += 1;

                    let start = extra_timings.first().map(|e| e.start).unwrap_or_default();
                    let end = extra_timings.last().map(|e| e.end).unwrap_or(start);
                    PendingSegment {
                        text: verse.text.trim().to_string(),
                        verse: verse.number.to_string(),
                        start,
                        end,
                        extra_timings,
                    }
                }
            };

            if segment.text.is_empty() {
                debug!("Verse {} has no text, skipping", segment.verse);
                continue;
            }

            segments.push(segment.into_segment(segments.len() as SegmentId));
        }

        debug!(
            "Built {} segments from {} verses and {} timing entries",
            segments.len(),
            verses.len(),
            entries.len()
        );
        segments
    }

    /// Consumes the entries of one verse, resolving each to a marker
    fn walk_verse(
        &self,
        entries: &[TimingEntry],
        codes: &[VerseCode],
        state: CursorState,
        verse: &VerseText,
    ) -> (CursorState, Vec<ExtraTiming>) {
        let counts = phrase_word_counts(&self.delimiters, &verse.text);

        let mut state = state.enter_verse(verse.number);
        let mut extra_timings: Vec<ExtraTiming> = Vec::new();
        let mut idx = state.index;

        while idx < entries.len() {
            let code = &codes[idx];
            if !extra_timings.is_empty() && !code.continues(verse.number) {
                break;
            }

            let (next, offset) = state.advance(code, &counts);
            state = next;

            let word_num = extra_timings
                .last()
                .map_or(offset, |prev| offset.max(prev.word_num));
            if word_num != offset {
                trace!(
                    "Marker '{}' in verse {} went back to word {}, holding at {}",
                    code,
                    verse.number,
                    offset,
                    word_num
                );
            }

            extra_timings.push(ExtraTiming::new(
                word_num,
                entries[idx].start_ms,
                effective_end(entries, idx),
            ));
            idx += 1;
        }

        (state.at_index(idx), extra_timings)
    }

    fn bridge_text(&self, verses: &[VerseText]) -> String {
        verses
            .iter()
            .map(|v| v.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(&self.bridge_separator)
    }
}

/// Segment fields gathered before the id is assigned
struct PendingSegment {
    text: String,
    verse: String,
    start: TimeMs,
    end: TimeMs,
    extra_timings: Vec<ExtraTiming>,
}

impl PendingSegment {
    fn into_segment(self, segment_id: SegmentId) -> Segment {
        Segment {
            segment_id,
            text: self.text,
            verse: self.verse,
            start_time: self.start,
            length: self.end - self.start,
            is_heading: false,
            extra_timings: Some(self.extra_timings),
        }
    }
}

// =============================================================================
// Cursor Helpers
// =============================================================================

/// Finds the first entry at or after `from` addressing `verse`
fn seek(codes: &[VerseCode], from: usize, verse: VerseNumber) -> Option<usize> {
    for (idx, code) in codes.iter().enumerate().skip(from) {
        if code.covers(verse) {
            return Some(idx);
        }

        let earlier = match code {
            VerseCode::Continuation => true,
            VerseCode::Bridge { end, .. } => *end < verse,
            VerseCode::Verse { verse: v } | VerseCode::Phrase { verse: v, .. } => *v < verse,
        };
        if !earlier {
            return None;
        }
    }
    None
}

/// Last entry belonging to the bridge starting at `first`
fn last_bridge_entry(codes: &[VerseCode], first: usize) -> usize {
    let bridge = &codes[first];
    codes[first + 1..]
        .iter()
        .take_while(|code| matches!(code, VerseCode::Continuation) || *code == bridge)
        .count()
        + first
}

/// End of an entry after the zero-duration rule
///
/// A zero-length entry ends where the next entry starts; the chapter's last
/// entry is left open for the caption generator.
fn effective_end(entries: &[TimingEntry], idx: usize) -> TimeMs {
    let entry = &entries[idx];
    match entries.get(idx + 1) {
        Some(next) if entry.is_zero_length() => next.start_ms,
        _ => entry.end_ms,
    }
}
