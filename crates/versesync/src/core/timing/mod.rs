//! Timing Module
//!
//! Turns timing annotation files and verse text into chapter segments.
//!
//! # Pipeline
//!
//! ```text
//! label file ──► annotations ──► TimingEntry[]
//!                                    │  verse_code (CursorState)
//! verse text ──► phrases ────────────┤
//!                                    ▼
//!                              segments ──► Segment[]
//! ```

pub mod annotations;
pub mod phrases;
pub mod segments;
pub mod verse_code;

pub use annotations::{parse_timing_entries, read_timing_file, TimingEntry};
pub use phrases::{phrase_word_counts, word_count, PhraseDelimiters, DEFAULT_PHRASE_DELIMITERS};
pub use segments::{SegmentBuilder, VerseText, DEFAULT_BRIDGE_SEPARATOR};
pub use verse_code::{letters_to_number, number_to_letters, CursorState, VerseCode};
