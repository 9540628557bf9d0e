//! Project Sources Module
//!
//! Chapter assembly for the two supported project formats, plus the
//! collaborator seams the engine needs from the outside world.
//!
//! # Collaborators
//!
//! - [`ScriptureText`]: verse text extraction for annotated projects
//! - [`AudioProbe`]: audio duration probing for recorded projects

pub mod hear_this;
pub mod probe;
pub mod scripture_app_builder;
pub mod util;

use std::path::Path;

use crate::core::timing::VerseText;
use crate::core::{CoreResult, TimeMs};

pub use hear_this::{assemble_recorded_chapter, list_chapter_audio, RecordedChapter, ScriptLine};
pub use probe::{FfprobeAudioProbe, WavAudioProbe};
pub use scripture_app_builder::{build_annotated_chapter, load_annotated_chapter, AnnotatedChapter};
pub use util::{compare_chapter_names, is_valid_audio_file, sort_in_canonical_order};

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Supplies verse text for a chapter
pub trait ScriptureText: Send + Sync {
    /// Verses of the chapter in document order
    fn chapter_verses(&self, book_id: &str, chapter: &str) -> CoreResult<Vec<VerseText>>;
}

/// Measures audio duration
pub trait AudioProbe: Send + Sync {
    /// Duration of the file in milliseconds
    fn duration_ms(&self, path: &Path) -> CoreResult<TimeMs>;
}
