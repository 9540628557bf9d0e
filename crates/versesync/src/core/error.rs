//! VerseSync Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Project Errors
    // =========================================================================
    #[error("Failed to load project: {0}")]
    ProjectLoad(String),

    // =========================================================================
    // Chapter Source Errors
    // =========================================================================
    #[error("Timing file unreadable: {path}: {source}")]
    TimingFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scripture text unavailable for {book} {chapter}: {reason}")]
    ScriptureUnavailable {
        book: String,
        chapter: String,
        reason: String,
    },

    #[error("Audio probe failed for {path}: {reason}")]
    AudioProbeFailed { path: String, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    // =========================================================================
    // Scheduling Errors
    // =========================================================================
    #[error("Chapter skipped: import was cancelled")]
    Cancelled,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error only affects a single chapter of an import.
    ///
    /// Per-chapter errors are collected into the import report; everything else
    /// aborts the import.
    pub fn is_chapter_scoped(&self) -> bool {
        matches!(
            self,
            Self::TimingFileUnreadable { .. }
                | Self::ScriptureUnavailable { .. }
                | Self::AudioProbeFailed { .. }
                | Self::FileNotFound(_)
                | Self::Cancelled
                | Self::Io(_)
        )
    }
}
