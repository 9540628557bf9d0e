//! VerseSync CLI
//!
//! Thin command line front end over the engine. JSON results go to stdout,
//! logs go to stderr.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use versesync_lib::core::captions::chapter_to_timings;
use versesync_lib::core::import::{ImportRequest, ProjectImporter};
use versesync_lib::core::project::{Audio, Chapter};
use versesync_lib::core::settings::{EngineSettings, SettingsManager};
use versesync_lib::core::sources::{build_annotated_chapter, FfprobeAudioProbe, ScriptureText};
use versesync_lib::core::timing::{read_timing_file, PhraseDelimiters, VerseCode, VerseText};
use versesync_lib::{CoreError, CoreResult};

#[derive(Parser, Debug)]
#[command(name = "versesync", version, about = "Scripture video timing engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a chapter's segments from a timing file and verse text
    Segments {
        /// Tab-delimited timing annotation file
        #[arg(long)]
        timing: PathBuf,

        /// JSON array of `{ number, text }` verses
        #[arg(long)]
        verses: PathBuf,

        /// Chapter audio file
        #[arg(long)]
        audio: String,

        /// Chapter audio duration in milliseconds
        #[arg(long)]
        audio_length: f64,

        /// Phrase delimiter specification (overrides settings)
        #[arg(long)]
        delimiters: Option<String>,

        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Chapter name
        #[arg(long, default_value = "1")]
        chapter: String,
    },

    /// Generate per-word caption timings for a chapter JSON file
    Timings {
        #[arg(long)]
        chapter: PathBuf,
    },

    /// Decode verse codes
    Decode {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Split text into phrases
    Phrases {
        #[arg(long)]
        text: String,

        #[arg(long)]
        delimiters: Option<String>,
    },

    /// Import a whole project from a JSON manifest
    Import {
        /// JSON import request
        #[arg(long)]
        manifest: PathBuf,

        /// JSON object mapping book id to chapter to verses
        #[arg(long)]
        verses: Option<PathBuf>,

        #[arg(long)]
        settings: Option<PathBuf>,

        /// Probe audio with ffprobe instead of reading WAV headers
        #[arg(long)]
        ffprobe: Option<String>,

        /// Emit word timings for every imported chapter instead of the report
        #[arg(long)]
        timings: bool,
    },
}

// =============================================================================
// Scripture Source
// =============================================================================

/// Verse text loaded up front from a JSON file
struct StaticScripture {
    books: HashMap<String, HashMap<String, Vec<VerseText>>>,
}

impl ScriptureText for StaticScripture {
    fn chapter_verses(&self, book_id: &str, chapter: &str) -> CoreResult<Vec<VerseText>> {
        self.books
            .get(book_id)
            .and_then(|chapters| chapters.get(chapter))
            .cloned()
            .ok_or_else(|| CoreError::ScriptureUnavailable {
                book: book_id.to_string(),
                chapter: chapter.to_string(),
                reason: "not present in verses file".to_string(),
            })
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Segments {
            timing,
            verses,
            audio,
            audio_length,
            delimiters,
            settings,
            chapter,
        } => {
            if !audio_length.is_finite() || audio_length < 0.0 {
                bail!("--audio-length must be a non-negative number of milliseconds");
            }

            let mut settings = load_settings(settings.as_deref());
            if let Some(spec) = delimiters {
                settings.phrase_delimiters = spec;
                settings.normalize();
            }

            let entries = read_timing_file(&timing)
                .with_context(|| format!("Failed to read timing file {}", timing.display()))?;
            let verses: Vec<VerseText> = read_json(&verses)?;

            let chapter = build_annotated_chapter(
                chapter,
                &entries,
                &verses,
                Audio::single(audio, audio_length),
                &settings.segment_builder(),
            );
            info!("Built {} segments", chapter.segments.len());
            print_json(&chapter)
        }

        Command::Timings { chapter } => {
            let chapter: Chapter = read_json(&chapter)?;
            print_json(&chapter_to_timings(&chapter))
        }

        Command::Decode { codes } => {
            let decoded: Vec<VerseCode> = codes.iter().map(|c| VerseCode::parse(c)).collect();
            print_json(&decoded)
        }

        Command::Phrases { text, delimiters } => {
            let delimiters = match delimiters {
                Some(spec) => PhraseDelimiters::parse(&spec),
                None => EngineSettings::default().delimiters(),
            };
            print_json(&delimiters.split(&text))
        }

        Command::Import {
            manifest,
            verses,
            settings,
            ffprobe,
            timings,
        } => {
            let request: ImportRequest = read_json(&manifest)?;
            let mut importer = ProjectImporter::new(load_settings(settings.as_deref()));

            if let Some(path) = verses {
                let books = read_json(&path)?;
                importer = importer.with_scripture(Arc::new(StaticScripture { books }));
            }
            if let Some(ffprobe_path) = ffprobe {
                importer = importer.with_audio_probe(Arc::new(FfprobeAudioProbe::new(ffprobe_path)));
            }

            let report = importer
                .import(request)
                .await
                .context("Project import failed")?;
            info!(
                "Imported {} chapters, {} dropped",
                report.project.chapter_count(),
                report.failures.len()
            );

            if timings {
                let timings = importer
                    .generate_timings(&report.project)
                    .await
                    .context("Timing generation failed")?;
                print_json(&timings)
            } else {
                print_json(&report)
            }
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> EngineSettings {
    match path {
        Some(path) => SettingsManager::with_path(path).load(),
        None => EngineSettings::default(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
