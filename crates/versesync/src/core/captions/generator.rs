//! Caption Timing Generator
//!
//! Derives word-level [`Timing`] records from a chapter's segments. Pure: the
//! chapter is never modified and the same chapter always yields the same output.

use tracing::trace;

use crate::core::project::{Chapter, Segment};
use crate::core::TimeMs;

use super::models::{PhraseTiming, Timing, TimingKind};
use super::words::{split_words, WordSynchronizer};

/// Generates one timing record per segment, in segment order
pub fn chapter_to_timings(chapter: &Chapter) -> Vec<Timing> {
    let audio_length = chapter.audio.total_length();
    let last = chapter.segments.len().saturating_sub(1);

    chapter
        .segments
        .iter()
        .enumerate()
        .map(|(i, segment)| segment_to_timing(segment, i == last, audio_length))
        .collect()
}

fn segment_to_timing(segment: &Segment, is_last: bool, audio_length: TimeMs) -> Timing {
    let start = segment.start_time;
    let mut end = segment.end_time();

    // An unresolved final marker runs to the end of the chapter audio
    if is_last && (end == start || segment.ends_with_open_marker()) {
        end = audio_length.max(start);
        trace!(
            "Extending final segment {} to audio end {}",
            segment.segment_id,
            end
        );
    }

    let words = split_words(&segment.text);
    let phrases = segment_phrases(segment, &words, end, audio_length);
    let words = phrases.iter().flat_map(WordSynchronizer::allocate).collect();

    Timing {
        kind: TimingKind::Caption,
        index: segment.segment_id,
        start,
        end,
        duration: end - start,
        content: segment.text.clone(),
        is_heading: segment.is_heading,
        words,
        extra_timings: segment.extra_timings().to_vec(),
    }
}

/// Splits the segment's words into phrases at its markers
///
/// Marker `i` covers words `[wordNum_i, wordNum_i+1)` and ends where the next
/// marker starts if that comes first. The final marker takes the remaining
/// words. Words before the first marker belong to the first phrase. A marker
/// left with no words hands its span to the phrase before it (or its start to
/// the phrase after it), so the words always reach the segment end.
fn segment_phrases(
    segment: &Segment,
    words: &[String],
    end: TimeMs,
    audio_length: TimeMs,
) -> Vec<PhraseTiming> {
    let markers = segment.extra_timings();
    if markers.is_empty() {
        return vec![PhraseTiming::new(words.to_vec(), segment.start_time, end)];
    }

    let mut phrases: Vec<PhraseTiming> = Vec::with_capacity(markers.len());
    let mut carried_start: Option<TimeMs> = None;
    let mut from = 0;

    for (i, marker) in markers.iter().enumerate() {
        let (to, phrase_end) = match markers.get(i + 1) {
            Some(next) => (
                next.word_num.clamp(from, words.len()),
                marker.end.min(next.start),
            ),
            None if marker.is_zero_length() => (words.len(), audio_length),
            None => (words.len(), marker.end),
        };

        if from == to {
            match phrases.last_mut() {
                Some(previous) => previous.end = previous.end.max(phrase_end),
                None => carried_start = carried_start.or(Some(marker.start)),
            }
            continue;
        }

        phrases.push(PhraseTiming::new(
            words[from..to].to_vec(),
            carried_start.take().unwrap_or(marker.start),
            phrase_end,
        ));
        from = to;
    }

    phrases
}
