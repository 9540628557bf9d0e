//! Caption Timing Models
//!
//! Output records consumed by the renderer's word highlighter.
//!
//! # Overview
//!
//! - One [`Timing`] per segment, in segment order
//! - `words` always fully populated and contiguous within each phrase
//! - `extraTimings` passed through from the segment unmodified

use serde::{Deserialize, Serialize};

use crate::core::project::ExtraTiming;
use crate::core::{SegmentId, TimeMs};

// =============================================================================
// Timing Records
// =============================================================================

/// Record type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimingKind {
    #[default]
    Caption,
}

/// A single highlighted word
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    pub word: String,
    pub start: TimeMs,
    pub end: TimeMs,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start: TimeMs, end: TimeMs) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> TimeMs {
        self.end - self.start
    }
}

/// Timing of one segment with per-word spans
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    #[serde(rename = "type")]
    pub kind: TimingKind,
    /// Id of the source segment
    pub index: SegmentId,
    pub start: TimeMs,
    pub end: TimeMs,
    pub duration: TimeMs,
    /// Segment text
    pub content: String,
    pub is_heading: bool,
    pub words: Vec<WordTiming>,
    pub extra_timings: Vec<ExtraTiming>,
}

// =============================================================================
// Phrases
// =============================================================================

/// Words narrated between two markers
#[derive(Clone, Debug, PartialEq)]
pub struct PhraseTiming {
    pub words: Vec<String>,
    pub start: TimeMs,
    pub end: TimeMs,
}

impl PhraseTiming {
    /// Creates a phrase; an end before the start is clamped to the start
    pub fn new(words: Vec<String>, start: TimeMs, end: TimeMs) -> Self {
        Self {
            words,
            start,
            end: end.max(start),
        }
    }

    pub fn duration(&self) -> TimeMs {
        self.end - self.start
    }
}
