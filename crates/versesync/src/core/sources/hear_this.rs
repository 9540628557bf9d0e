//! Recorded Chapter Assembly
//!
//! Builds chapters from per-line recordings: each script line has its own
//! `<LineNumber - 1>.wav` file and segments are laid end to end.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::project::{Audio, AudioFile, Chapter, Segment};
use crate::core::{CoreResult, SegmentId};

use super::util::{compare_chapter_names, is_valid_audio_file};
use super::AudioProbe;

/// Heading type marking the chapter number line
const CHAPTER_HEADING_TYPE: &str = "c";

/// One recorded script line from a chapter's `info.xml`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScriptLine {
    pub line_number: SegmentId,
    pub text: String,
    pub verse: String,
    #[serde(default)]
    pub heading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_type: Option<String>,
}

impl ScriptLine {
    /// Chapter number lines are not narrated content
    pub fn is_chapter_heading(&self) -> bool {
        self.heading_type.as_deref() == Some(CHAPTER_HEADING_TYPE) && self.verse == "0"
    }

    /// Recording file name for this line
    pub fn audio_file_name(&self) -> String {
        format!("{}.wav", self.line_number - 1)
    }
}

/// A chapter directory with its script lines and audio file names
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedChapter {
    pub name: String,
    pub dir: PathBuf,
    pub lines: Vec<ScriptLine>,
    /// Audio file names present in `dir`
    pub audio_files: Vec<String>,
}

impl RecordedChapter {
    /// Lists the chapter directory's audio files
    pub fn from_dir<S: AsRef<str>>(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        lines: Vec<ScriptLine>,
        extensions: &[S],
    ) -> CoreResult<Self> {
        let dir = dir.into();
        let audio_files = list_chapter_audio(&dir, extensions)?;
        Ok(Self {
            name: name.into(),
            dir,
            lines,
            audio_files,
        })
    }
}

/// Audio file names in a directory, naturally sorted
pub fn list_chapter_audio<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> CoreResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_valid_audio_file(&name, extensions) {
            files.push(name);
        }
    }
    files.sort_by(|a, b| compare_chapter_names(a, b));
    Ok(files)
}

/// Assembles a chapter from its script lines
///
/// Lines without a recording are skipped. A chapter with no lines or no audio
/// yields no segments.
pub fn assemble_recorded_chapter(
    chapter: &RecordedChapter,
    probe: &dyn AudioProbe,
) -> CoreResult<Chapter> {
    let mut audio = Audio::default();
    let mut segments = Vec::new();

    if chapter.lines.is_empty() || chapter.audio_files.is_empty() {
        debug!("Chapter {} has no script lines or no audio", chapter.name);
        return Ok(Chapter::new(chapter.name.clone(), audio, segments));
    }

    for line in &chapter.lines {
        if line.text.trim().is_empty() || line.is_chapter_heading() {
            continue;
        }

        let file_name = line.audio_file_name();
        if !chapter.audio_files.contains(&file_name) {
            warn!(
                "No recording for line {} of chapter {}, skipping",
                line.line_number, chapter.name
            );
            continue;
        }

        let path = chapter.dir.join(&file_name);
        let length = probe.duration_ms(&path)?;

        segments.push(Segment {
            segment_id: line.line_number,
            text: line.text.clone(),
            verse: line.verse.clone(),
            start_time: audio.total_length(),
            length,
            is_heading: line.heading,
            extra_timings: None,
        });
        audio.push(AudioFile::new(path.to_string_lossy(), length));
    }

    debug!(
        "Assembled chapter {}: {} segments, {} ms",
        chapter.name,
        segments.len(),
        audio.total_length()
    );
    Ok(Chapter::new(chapter.name.clone(), audio, segments))
}
