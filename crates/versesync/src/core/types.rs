//! VerseSync Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Segment identifier (line number for recorded projects, sequence for annotated ones)
pub type SegmentId = i64;

/// Verse number as it appears in timing codes and scripture text
pub type VerseNumber = u32;

// =============================================================================
// Time Types
// =============================================================================

/// Time in milliseconds (floating point, never rounded on ingestion)
pub type TimeMs = f64;

/// Converts seconds to milliseconds without rounding
pub fn seconds_to_ms(seconds: f64) -> TimeMs {
    seconds * 1000.0
}

// =============================================================================
// Source Types
// =============================================================================

/// Project source format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    /// Per-line recordings with an `info.xml` per chapter
    HearThis,
    /// Whole-chapter recordings with a timing annotation file
    ScriptureAppBuilder,
}

impl SourceType {
    /// Returns the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::HearThis => "hearThis",
            SourceType::ScriptureAppBuilder => "scriptureAppBuilder",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
