//! Project Data Models
//!
//! Project, Book, Chapter, Audio, Segment and ExtraTiming as stored after import.
//!
//! # Overview
//!
//! - Segments are created once during import and never mutated afterwards
//! - All times are floating point milliseconds
//! - Audio is normalized to a single `{files, length}` shape on ingestion

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{SegmentId, SourceType, TimeMs};

// =============================================================================
// Audio
// =============================================================================

/// One audio file of a chapter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFile {
    /// Path to the audio file
    pub filename: String,
    /// Duration in milliseconds
    pub length: TimeMs,
}

impl AudioFile {
    pub fn new(filename: impl Into<String>, length: TimeMs) -> Self {
        Self {
            filename: filename.into(),
            length,
        }
    }
}

/// Audio shapes accepted on ingestion
#[derive(Deserialize)]
#[serde(untagged)]
enum AudioShape {
    Files {
        files: Vec<AudioFile>,
        #[serde(default)]
        length: Option<TimeMs>,
    },
    Single {
        filename: String,
        #[serde(default)]
        length: TimeMs,
    },
}

impl From<AudioShape> for Audio {
    fn from(shape: AudioShape) -> Self {
        match shape {
            AudioShape::Files { files, length } => {
                let mut audio = Audio::new(files);
                if let Some(length) = length.filter(|l| *l > 0.0) {
                    audio.length = length;
                }
                audio
            }
            AudioShape::Single { filename, length } => {
                Audio::new(vec![AudioFile::new(filename, length)])
            }
        }
    }
}

/// Chapter audio (ordered files plus total length)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "AudioShape")]
pub struct Audio {
    /// Audio files in playback order
    pub files: Vec<AudioFile>,
    /// Total length in milliseconds
    pub length: TimeMs,
}

impl Audio {
    /// Creates audio from files, computing the total length
    pub fn new(files: Vec<AudioFile>) -> Self {
        let length = files.iter().map(|f| f.length).sum();
        Self { files, length }
    }

    /// Creates audio backed by a single file
    pub fn single(filename: impl Into<String>, length: TimeMs) -> Self {
        Self::new(vec![AudioFile::new(filename, length)])
    }

    /// Appends a file and extends the total length
    pub fn push(&mut self, file: AudioFile) {
        self.length += file.length;
        self.files.push(file);
    }

    /// Total narration length in milliseconds
    pub fn total_length(&self) -> TimeMs {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// =============================================================================
// Segment
// =============================================================================

/// Sub-segment marker: where a phrase of the segment text starts being narrated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTiming {
    /// 0-based absolute word offset into the segment text
    pub word_num: usize,
    /// Start time in milliseconds
    pub start: TimeMs,
    /// End time in milliseconds (equal to start for an unresolved marker)
    pub end: TimeMs,
}

impl ExtraTiming {
    pub fn new(word_num: usize, start: TimeMs, end: TimeMs) -> Self {
        Self {
            word_num,
            start,
            end,
        }
    }

    /// Zero-length markers are placeholders resolved later
    pub fn is_zero_length(&self) -> bool {
        self.start == self.end
    }
}

/// A text unit (verse, heading or verse bridge) with coarse timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Segment identifier, unique within its chapter
    pub segment_id: SegmentId,
    /// Display text
    pub text: String,
    /// Verse reference ("3", "0" for headings, "1-2" for bridges)
    pub verse: String,
    /// Start time in milliseconds
    pub start_time: TimeMs,
    /// Length in milliseconds
    pub length: TimeMs,
    /// Whether this segment is a heading
    pub is_heading: bool,
    /// Sub-segment markers, only present for annotated sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_timings: Option<Vec<ExtraTiming>>,
}

impl Segment {
    /// End time in milliseconds
    pub fn end_time(&self) -> TimeMs {
        self.start_time + self.length
    }

    /// Sub-segment markers, empty when absent
    pub fn extra_timings(&self) -> &[ExtraTiming] {
        self.extra_timings.as_deref().unwrap_or(&[])
    }

    /// Whether the segment's final marker is still unresolved
    pub fn ends_with_open_marker(&self) -> bool {
        self.extra_timings()
            .last()
            .is_some_and(ExtraTiming::is_zero_length)
    }
}

// =============================================================================
// Chapter / Book / Project
// =============================================================================

/// A chapter: its audio and its segments in playback order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub name: String,
    pub audio: Audio,
    pub segments: Vec<Segment>,
}

impl Chapter {
    pub fn new(name: impl Into<String>, audio: Audio, segments: Vec<Segment>) -> Self {
        Self {
            name: name.into(),
            audio,
            segments,
        }
    }

    /// Chapters without segments are dropped by their book
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A book and its chapters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub name: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(name: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            name: name.into(),
            chapters,
        }
    }
}

/// An imported project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub folder_path: PathBuf,
    pub source_type: SourceType,
    pub books: Vec<Book>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        folder_path: impl Into<PathBuf>,
        source_type: SourceType,
        books: Vec<Book>,
    ) -> Self {
        Self {
            name: name.into(),
            folder_path: folder_path.into(),
            source_type,
            books,
        }
    }

    /// Total number of chapters across books
    pub fn chapter_count(&self) -> usize {
        self.books.iter().map(|b| b.chapters.len()).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: TimeMs, length: TimeMs, extra: Option<Vec<ExtraTiming>>) -> Segment {
        Segment {
            segment_id: 0,
            text: "Verse 1 of Matthew,".to_string(),
            verse: "1".to_string(),
            start_time: start,
            length,
            is_heading: false,
            extra_timings: extra,
        }
    }

    // -------------------------------------------------------------------------
    // Audio Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_audio_total_is_sum_of_files() {
        let audio = Audio::new(vec![
            AudioFile::new("1.wav", 3200.0),
            AudioFile::new("2.wav", 6500.0),
        ]);
        assert_eq!(audio.total_length(), 9700.0);
    }

    #[test]
    fn test_audio_push_extends_length() {
        let mut audio = Audio::default();
        audio.push(AudioFile::new("0.wav", 2300.0));
        audio.push(AudioFile::new("1.wav", 5500.0));
        assert_eq!(audio.files.len(), 2);
        assert_eq!(audio.total_length(), 7800.0);
    }

    #[test]
    fn test_audio_accepts_files_shape_without_length() {
        let json = r#"{"files":[{"filename":"BK Test Luke 1.mp3","length":5208}]}"#;
        let audio: Audio = serde_json::from_str(json).unwrap();
        assert_eq!(audio.total_length(), 5208.0);
    }

    #[test]
    fn test_audio_accepts_files_shape_with_length() {
        let json = r#"{"files":[{"filename":"a.wav","length":100},{"filename":"b.wav","length":200}],"length":300}"#;
        let audio: Audio = serde_json::from_str(json).unwrap();
        assert_eq!(audio.files.len(), 2);
        assert_eq!(audio.total_length(), 300.0);
    }

    #[test]
    fn test_audio_accepts_single_file_shape() {
        let json = r#"{"filename":"chapter.mp3","length":6008}"#;
        let audio: Audio = serde_json::from_str(json).unwrap();
        assert_eq!(audio.files, vec![AudioFile::new("chapter.mp3", 6008.0)]);
        assert_eq!(audio.total_length(), 6008.0);
    }

    #[test]
    fn test_audio_serializes_normalized_shape() {
        let audio = Audio::single("chapter.mp3", 6008.0);
        let value = serde_json::to_value(&audio).unwrap();
        assert_eq!(value["files"][0]["filename"], "chapter.mp3");
        assert_eq!(value["length"], 6008.0);
    }

    // -------------------------------------------------------------------------
    // Segment Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_segment_end_time() {
        let seg = segment(1640.0, 1600.0, None);
        assert_eq!(seg.end_time(), 3240.0);
    }

    #[test]
    fn test_segment_open_marker() {
        let closed = segment(
            4500.0,
            1550.0,
            Some(vec![ExtraTiming::new(0, 4500.0, 6050.0)]),
        );
        assert!(!closed.ends_with_open_marker());

        let open = segment(
            4500.0,
            1550.0,
            Some(vec![
                ExtraTiming::new(0, 4500.0, 6050.0),
                ExtraTiming::new(4, 6050.0, 6050.0),
            ]),
        );
        assert!(open.ends_with_open_marker());
        assert!(!segment(0.0, 0.0, None).ends_with_open_marker());
    }

    #[test]
    fn test_segment_serialization_is_camel_case() {
        let seg = segment(0.0, 1640.0, Some(vec![ExtraTiming::new(0, 0.0, 1640.0)]));
        let value = serde_json::to_value(&seg).unwrap();
        assert_eq!(value["segmentId"], 0);
        assert_eq!(value["startTime"], 0.0);
        assert_eq!(value["isHeading"], false);
        assert_eq!(value["extraTimings"][0]["wordNum"], 0);
    }

    #[test]
    fn test_segment_without_markers_omits_field() {
        let seg = segment(0.0, 1400.0, None);
        let json = serde_json::to_string(&seg).unwrap();
        assert!(!json.contains("extraTimings"));

        let parsed: Segment = serde_json::from_str(&json).unwrap();
        assert!(parsed.extra_timings.is_none());
        assert!(parsed.extra_timings().is_empty());
    }

    #[test]
    fn test_project_chapter_count() {
        let chapter = Chapter::new("1", Audio::single("a.mp3", 1.0), vec![segment(0.0, 1.0, None)]);
        let project = Project::new(
            "Example",
            "/projects/Example",
            SourceType::ScriptureAppBuilder,
            vec![
                Book::new("Mat", vec![chapter.clone(), chapter.clone()]),
                Book::new("Mrk", vec![chapter]),
            ],
        );
        assert_eq!(project.chapter_count(), 3);
    }
}
