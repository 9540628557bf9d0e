//! Project Import Module
//!
//! Assembles a [`Project`] from per-chapter inputs on the chapter pool.
//!
//! # Failure Model
//!
//! - Unreadable project root: the whole import fails with `ProjectLoad`
//! - Malformed request (blank name, the same chapter twice): the whole import
//!   fails with `Validation` before anything is scheduled
//! - Errors that are not chapter scoped (a panicked worker, a scripture source
//!   reporting an internal failure) abort the import
//! - Anything that goes wrong in one chapter (missing timing file, no verse
//!   text, unprobeable audio, nothing aligned) drops only that chapter and is
//!   recorded in the [`ImportReport`]
//! - Cancellation stops scheduling; unscheduled chapters are reported as such

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::captions::{chapter_to_timings, Timing};
use crate::core::performance::{ChapterPool, PoolStats};
use crate::core::project::{Audio, Book, Chapter, Project};
use crate::core::settings::EngineSettings;
use crate::core::sources::{
    assemble_recorded_chapter, compare_chapter_names, load_annotated_chapter,
    sort_in_canonical_order, AnnotatedChapter, AudioProbe, RecordedChapter, ScriptLine,
    ScriptureText, WavAudioProbe,
};
use crate::core::timing::SegmentBuilder;
use crate::core::{CoreError, CoreResult, SourceType};

// =============================================================================
// Requests
// =============================================================================

/// Inputs of one chapter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "source")]
pub enum ChapterInput {
    /// Per-line recordings in a chapter folder
    #[serde(rename_all = "camelCase")]
    Recorded { dir: PathBuf, lines: Vec<ScriptLine> },
    /// Whole-chapter recording with a timing annotation file
    #[serde(rename_all = "camelCase")]
    Annotated {
        book_id: String,
        /// Relative paths resolve under `<root>/<name>_data/timings/`
        timing_path: PathBuf,
        audio: Audio,
    },
}

/// One chapter to import
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterJob {
    pub book: String,
    pub chapter: String,
    pub input: ChapterInput,
}

/// A project import request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub name: String,
    pub root: PathBuf,
    pub source_type: SourceType,
    pub jobs: Vec<ChapterJob>,
}

// =============================================================================
// Reports
// =============================================================================

/// Why a chapter is missing from the project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Chapter inputs could not be read or processed
    Error,
    /// Chapter produced no segments
    Empty,
    /// Chapter was not scheduled because the import was cancelled
    Cancelled,
}

/// A chapter dropped from the import
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterFailure {
    pub book: String,
    pub chapter: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Import result: the project plus everything that was dropped
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub project: Project,
    pub failures: Vec<ChapterFailure>,
    pub stats: PoolStats,
}

/// Word timings of one chapter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterTimings {
    pub book: String,
    pub chapter: String,
    pub timings: Vec<Timing>,
}

// =============================================================================
// Importer
// =============================================================================

/// Imports projects using the configured collaborators
pub struct ProjectImporter {
    settings: EngineSettings,
    scripture: Option<Arc<dyn ScriptureText>>,
    probe: Arc<dyn AudioProbe>,
    pool: ChapterPool,
}

impl ProjectImporter {
    /// Creates an importer; audio is probed from WAV headers until another
    /// probe is configured
    pub fn new(settings: EngineSettings) -> Self {
        let mut settings = settings;
        settings.normalize();
        let pool = ChapterPool::with_config(settings.parallel_config());
        Self {
            settings,
            scripture: None,
            probe: Arc::new(WavAudioProbe),
            pool,
        }
    }

    pub fn with_scripture(mut self, scripture: Arc<dyn ScriptureText>) -> Self {
        self.scripture = Some(scripture);
        self
    }

    pub fn with_audio_probe(mut self, probe: Arc<dyn AudioProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handle to the chapter pool (clones share cancellation)
    pub fn pool(&self) -> &ChapterPool {
        &self.pool
    }

    /// Stops scheduling further chapters
    pub fn cancel(&self) {
        self.pool.cancel();
    }

    /// Imports a project
    pub async fn import(&self, request: ImportRequest) -> CoreResult<ImportReport> {
        check_root(&request.root)?;
        validate_request(&request)?;

        let keys: Vec<(String, String)> = request
            .jobs
            .iter()
            .map(|job| (job.book.clone(), job.chapter.clone()))
            .collect();

        let scripture = self.scripture.clone();
        let probe = Arc::clone(&self.probe);
        let builder = self.settings.segment_builder();
        let extensions = self.settings.audio_extensions.clone();
        let root = request.root.clone();
        let name = request.name.clone();

        let (results, stats) = self
            .pool
            .run(request.jobs, move |job| {
                let job = resolve_timing_path(job, &root, &name);
                import_chapter(job, scripture.as_deref(), probe.as_ref(), &builder, &extensions)
            })
            .await;

        let mut books: Vec<(String, Vec<Chapter>)> = Vec::new();
        let mut failures = Vec::new();

        for ((book, chapter_name), result) in keys.into_iter().zip(results) {
            let failure = |kind, reason: String| ChapterFailure {
                book: book.clone(),
                chapter: chapter_name.clone(),
                kind,
                reason,
            };

            match result {
                Ok(chapter) if chapter.is_empty() => {
                    warn!("{} {} produced no segments", book, chapter_name);
                    failures.push(failure(FailureKind::Empty, "no aligned segments".to_string()));
                }
                Ok(chapter) => match books.iter_mut().find(|(name, _)| *name == book) {
                    Some((_, chapters)) => chapters.push(chapter),
                    None => books.push((book.clone(), vec![chapter])),
                },
                Err(CoreError::Cancelled) => {
                    failures.push(failure(FailureKind::Cancelled, CoreError::Cancelled.to_string()));
                }
                Err(e) if !e.is_chapter_scoped() => {
                    error!("Aborting import at {} {}: {}", book, chapter_name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Skipping {} {}: {}", book, chapter_name, e);
                    failures.push(failure(FailureKind::Error, e.to_string()));
                }
            }
        }

        if request.source_type == SourceType::HearThis {
            let mut names: Vec<String> = books.iter().map(|(name, _)| name.clone()).collect();
            sort_in_canonical_order(&mut names);
            books.sort_by_key(|(name, _)| names.iter().position(|n| n == name));
            for (_, chapters) in &mut books {
                chapters.sort_by(|a, b| compare_chapter_names(&a.name, &b.name));
            }
        }

        let books: Vec<Book> = books
            .into_iter()
            .map(|(name, chapters)| Book::new(name, chapters))
            .collect();

        let project = Project::new(request.name, request.root, request.source_type, books);
        info!(
            "Imported {}: {} books, {} chapters, {} dropped",
            project.name,
            project.books.len(),
            project.chapter_count(),
            failures.len()
        );

        Ok(ImportReport {
            project,
            failures,
            stats,
        })
    }

    /// Generates word timings for every chapter of a project
    pub async fn generate_timings(&self, project: &Project) -> CoreResult<Vec<ChapterTimings>> {
        let chapters: Vec<(String, Chapter)> = project
            .books
            .iter()
            .flat_map(|book| {
                book.chapters
                    .iter()
                    .map(move |chapter| (book.name.clone(), chapter.clone()))
            })
            .collect();

        let (results, _) = self
            .pool
            .run(chapters, |(book, chapter)| {
                Ok(ChapterTimings {
                    timings: chapter_to_timings(&chapter),
                    book,
                    chapter: chapter.name,
                })
            })
            .await;

        results.into_iter().collect()
    }
}

fn check_root(root: &Path) -> CoreResult<()> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        CoreError::ProjectLoad(format!("{}: {}", root.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(CoreError::ProjectLoad(format!(
            "{}: not a directory",
            root.display()
        )));
    }
    std::fs::read_dir(root)
        .map_err(|e| CoreError::ProjectLoad(format!("{}: {}", root.display(), e)))?;
    Ok(())
}

fn validate_request(request: &ImportRequest) -> CoreResult<()> {
    if request.name.trim().is_empty() {
        return Err(CoreError::Validation("project name is empty".to_string()));
    }

    let mut seen: Vec<(&str, &str)> = Vec::with_capacity(request.jobs.len());
    for job in &request.jobs {
        let key = (job.book.as_str(), job.chapter.as_str());
        if seen.contains(&key) {
            return Err(CoreError::Validation(format!(
                "{} {} is listed more than once",
                job.book, job.chapter
            )));
        }
        seen.push(key);
    }
    Ok(())
}

fn resolve_timing_path(mut job: ChapterJob, root: &Path, name: &str) -> ChapterJob {
    if let ChapterInput::Annotated { timing_path, .. } = &mut job.input {
        if timing_path.is_relative() {
            *timing_path = AnnotatedChapter::timing_path_in(root, name, &*timing_path);
        }
    }
    job
}

fn import_chapter(
    job: ChapterJob,
    scripture: Option<&dyn ScriptureText>,
    probe: &dyn AudioProbe,
    builder: &SegmentBuilder,
    extensions: &[String],
) -> CoreResult<Chapter> {
    match job.input {
        ChapterInput::Recorded { dir, lines } => {
            let recorded = RecordedChapter::from_dir(job.chapter, dir, lines, extensions)?;
            assemble_recorded_chapter(&recorded, probe)
        }
        ChapterInput::Annotated {
            book_id,
            timing_path,
            audio,
        } => {
            let scripture = scripture.ok_or_else(|| CoreError::ScriptureUnavailable {
                book: book_id.clone(),
                chapter: job.chapter.clone(),
                reason: "no scripture text source configured".to_string(),
            })?;
            let annotated = AnnotatedChapter {
                book_id,
                chapter: job.chapter,
                timing_path,
                audio,
            };
            load_annotated_chapter(&annotated, scripture, builder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timing::VerseText;
    use crate::core::TimeMs;

    struct FixedDurations(TimeMs);

    impl AudioProbe for FixedDurations {
        fn duration_ms(&self, _path: &Path) -> CoreResult<TimeMs> {
            Ok(self.0)
        }
    }

    struct Verses;

    impl ScriptureText for Verses {
        fn chapter_verses(&self, _book_id: &str, _chapter: &str) -> CoreResult<Vec<VerseText>> {
            Ok(vec![VerseText::new(1, "Jesus wept.")])
        }
    }

    struct BrokenScripture;

    impl ScriptureText for BrokenScripture {
        fn chapter_verses(&self, _book_id: &str, _chapter: &str) -> CoreResult<Vec<VerseText>> {
            Err(CoreError::Internal("verse index corrupted".to_string()))
        }
    }

    fn annotated_job(chapter: &str, timing_path: impl Into<PathBuf>) -> ChapterJob {
        ChapterJob {
            book: "Jhn".to_string(),
            chapter: chapter.to_string(),
            input: ChapterInput::Annotated {
                book_id: "JHN".to_string(),
                timing_path: timing_path.into(),
                audio: Audio::single(format!("John {}.mp3", chapter), 1200.0),
            },
        }
    }

    fn line(number: i64) -> ScriptLine {
        ScriptLine {
            line_number: number,
            text: "text".to_string(),
            verse: number.to_string(),
            heading: false,
            heading_type: None,
        }
    }

    #[test]
    fn test_chapter_input_tagging() {
        let job = ChapterJob {
            book: "Mrk".to_string(),
            chapter: "1".to_string(),
            input: ChapterInput::Annotated {
                book_id: "MRK".to_string(),
                timing_path: PathBuf::from("MRK_001.txt"),
                audio: Audio::single("Mark 1.mp3", 4752.0),
            },
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["input"]["source"], "annotated");
        assert_eq!(value["input"]["bookId"], "MRK");
        assert_eq!(serde_json::from_value::<ChapterJob>(value).unwrap(), job);
    }

    #[tokio::test]
    async fn test_unreadable_root_is_fatal() {
        let importer = ProjectImporter::new(EngineSettings::default());
        let request = ImportRequest {
            name: "Missing".to_string(),
            root: PathBuf::from("/nonexistent/project"),
            source_type: SourceType::HearThis,
            jobs: vec![],
        };
        assert!(matches!(
            importer.import(request).await,
            Err(CoreError::ProjectLoad(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_request_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let importer = ProjectImporter::new(EngineSettings::default());

        let blank = ImportRequest {
            name: "  ".to_string(),
            root: root.path().to_path_buf(),
            source_type: SourceType::ScriptureAppBuilder,
            jobs: vec![],
        };
        assert!(matches!(
            importer.import(blank).await,
            Err(CoreError::Validation(_))
        ));

        let duplicated = ImportRequest {
            name: "Example".to_string(),
            root: root.path().to_path_buf(),
            source_type: SourceType::ScriptureAppBuilder,
            jobs: vec![annotated_job("11", "a.txt"), annotated_job("11", "b.txt")],
        };
        match importer.import(duplicated).await {
            Err(CoreError::Validation(reason)) => assert!(reason.contains("Jhn 11")),
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_internal_error_aborts_import() {
        let root = tempfile::tempdir().unwrap();
        let timing_path = root.path().join("JHN_011.txt");
        std::fs::write(&timing_path, "0\t1.2\t1\n").unwrap();

        let request = ImportRequest {
            name: "Example".to_string(),
            root: root.path().to_path_buf(),
            source_type: SourceType::ScriptureAppBuilder,
            jobs: vec![annotated_job("11", timing_path)],
        };

        let result = ProjectImporter::new(EngineSettings::default())
            .with_scripture(Arc::new(BrokenScripture))
            .import(request)
            .await;
        assert!(matches!(result, Err(CoreError::Internal(_))));
    }

    #[tokio::test]
    async fn test_relative_timing_path_resolves_under_data_folder() {
        let root = tempfile::tempdir().unwrap();
        let timings = root.path().join("Example_data").join("timings");
        std::fs::create_dir_all(&timings).unwrap();
        std::fs::write(timings.join("JHN_011.txt"), "0\t1.2\t1\n").unwrap();

        let request = ImportRequest {
            name: "Example".to_string(),
            root: root.path().to_path_buf(),
            source_type: SourceType::ScriptureAppBuilder,
            jobs: vec![annotated_job("11", "JHN_011.txt")],
        };

        let report = ProjectImporter::new(EngineSettings::default())
            .with_scripture(Arc::new(Verses))
            .import(request)
            .await
            .unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.project.books[0].chapters[0].segments[0].length, 1200.0);
    }

    #[tokio::test]
    async fn test_recorded_books_sorted_canonically() {
        let root = tempfile::tempdir().unwrap();
        let mut jobs = Vec::new();
        for (book, chapter) in [("Mark", "10"), ("Genesis", "1"), ("Mark", "2")] {
            let dir = root.path().join(book).join(chapter);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("0.wav"), b"").unwrap();
            jobs.push(ChapterJob {
                book: book.to_string(),
                chapter: chapter.to_string(),
                input: ChapterInput::Recorded {
                    dir,
                    lines: vec![line(1)],
                },
            });
        }

        let importer = ProjectImporter::new(EngineSettings::default())
            .with_audio_probe(Arc::new(FixedDurations(1000.0)));
        let report = importer
            .import(ImportRequest {
                name: "Example".to_string(),
                root: root.path().to_path_buf(),
                source_type: SourceType::HearThis,
                jobs,
            })
            .await
            .unwrap();

        let layout: Vec<(String, Vec<String>)> = report
            .project
            .books
            .iter()
            .map(|b| (b.name.clone(), b.chapters.iter().map(|c| c.name.clone()).collect()))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("Genesis".to_string(), vec!["1".to_string()]),
                ("Mark".to_string(), vec!["2".to_string(), "10".to_string()]),
            ]
        );
        assert!(report.failures.is_empty());
        assert_eq!(report.stats.completed, 3);
    }

    #[tokio::test]
    async fn test_annotated_without_scripture_fails_chapter() {
        let root = tempfile::tempdir().unwrap();
        let timing_path = root.path().join("JHN_011.txt");
        std::fs::write(&timing_path, "0\t1.2\t1\n").unwrap();

        let job = ChapterJob {
            book: "Jhn".to_string(),
            chapter: "11".to_string(),
            input: ChapterInput::Annotated {
                book_id: "JHN".to_string(),
                timing_path,
                audio: Audio::single("John 11.mp3", 1200.0),
            },
        };
        let request = ImportRequest {
            name: "Example".to_string(),
            root: root.path().to_path_buf(),
            source_type: SourceType::ScriptureAppBuilder,
            jobs: vec![job],
        };

        let report = ProjectImporter::new(EngineSettings::default())
            .import(request.clone())
            .await
            .unwrap();
        assert!(report.project.books.is_empty());
        assert_eq!(report.failures[0].kind, FailureKind::Error);

        let report = ProjectImporter::new(EngineSettings::default())
            .with_scripture(Arc::new(Verses))
            .import(request)
            .await
            .unwrap();
        assert_eq!(report.project.chapter_count(), 1);
        assert_eq!(report.project.books[0].chapters[0].segments[0].text, "Jesus wept.");
    }

    #[tokio::test]
    async fn test_generate_timings_for_project() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Book1").join("3");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0.wav"), b"").unwrap();

        let importer = ProjectImporter::new(EngineSettings::default())
            .with_audio_probe(Arc::new(FixedDurations(1400.0)));
        let report = importer
            .import(ImportRequest {
                name: "Example".to_string(),
                root: root.path().to_path_buf(),
                source_type: SourceType::HearThis,
                jobs: vec![ChapterJob {
                    book: "Book1".to_string(),
                    chapter: "3".to_string(),
                    input: ChapterInput::Recorded {
                        dir,
                        lines: vec![line(1)],
                    },
                }],
            })
            .await
            .unwrap();

        let timings = importer.generate_timings(&report.project).await.unwrap();
        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].book, "Book1");
        assert_eq!(timings[0].chapter, "3");
        assert_eq!(timings[0].timings[0].index, 1);
        assert_eq!(timings[0].timings[0].end, 1400.0);
    }
}
