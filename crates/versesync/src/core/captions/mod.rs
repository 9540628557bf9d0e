//! Caption Timing Module
//!
//! Derives per-word highlight timings from imported chapter segments.
//!
//! # Features
//!
//! - Phrase splitting at sub-segment markers
//! - Proportional per-word allocation within each phrase
//! - Resolution of a trailing open marker to the chapter audio end

pub mod generator;
pub mod models;
pub mod words;

pub use generator::chapter_to_timings;
pub use models::{PhraseTiming, Timing, TimingKind, WordTiming};
pub use words::{split_words, WordSynchronizer};
