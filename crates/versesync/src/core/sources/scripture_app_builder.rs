//! Annotated Chapter Assembly
//!
//! Builds chapters from a whole-chapter recording plus a timing annotation
//! file and the chapter's verse text.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::project::{Audio, Chapter};
use crate::core::timing::{read_timing_file, SegmentBuilder, TimingEntry, VerseText};
use crate::core::CoreResult;

use super::ScriptureText;

/// Where an annotated chapter's inputs live
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedChapter {
    /// Book identifier passed to the scripture text source (e.g. `MRK`)
    pub book_id: String,
    /// Chapter number as named in the project
    pub chapter: String,
    pub timing_path: PathBuf,
    pub audio: Audio,
}

impl AnnotatedChapter {
    /// Timing file location inside a project's data folder
    pub fn timing_path_in(
        project_root: &Path,
        project_name: &str,
        timing_file: impl AsRef<Path>,
    ) -> PathBuf {
        project_root
            .join(format!("{}_data", project_name))
            .join("timings")
            .join(timing_file)
    }
}

/// Builds a chapter from already loaded inputs
pub fn build_annotated_chapter(
    name: impl Into<String>,
    entries: &[TimingEntry],
    verses: &[VerseText],
    audio: Audio,
    builder: &SegmentBuilder,
) -> Chapter {
    let segments = builder.build(entries, verses);
    Chapter::new(name, audio, segments)
}

/// Reads the chapter's timing file and verse text, then builds it
pub fn load_annotated_chapter(
    chapter: &AnnotatedChapter,
    scripture: &dyn ScriptureText,
    builder: &SegmentBuilder,
) -> CoreResult<Chapter> {
    let entries = read_timing_file(&chapter.timing_path)?;
    let verses = scripture.chapter_verses(&chapter.book_id, &chapter.chapter)?;
    debug!(
        "Loaded {} {}: {} timing entries, {} verses",
        chapter.book_id,
        chapter.chapter,
        entries.len(),
        verses.len()
    );

    Ok(build_annotated_chapter(
        chapter.chapter.clone(),
        &entries,
        &verses,
        chapter.audio.clone(),
        builder,
    ))
}
