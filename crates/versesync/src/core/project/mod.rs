//! Project Data Model Module
//!
//! The imported project tree: books, chapters, audio and segments.

mod models;

pub use models::{Audio, AudioFile, Book, Chapter, ExtraTiming, Project, Segment};
