//! Timing Annotation Parser
//!
//! Reads label files of the form `start<TAB>end<TAB>code`, one marker per line,
//! with times in (fractional) seconds.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::core::{seconds_to_ms, CoreError, CoreResult, TimeMs};

use super::verse_code::VerseCode;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d*)?)\t(\d+(?:\.\d*)?)(?:\t([^\t]*))?\s*$")
        .expect("Invalid timing line regex")
});

/// One timing marker
#[derive(Clone, Debug, PartialEq)]
pub struct TimingEntry {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    /// Raw verse code, possibly empty
    pub code: String,
}

impl TimingEntry {
    pub fn new(start_ms: TimeMs, end_ms: TimeMs, code: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            code: code.into(),
        }
    }

    /// Decoded verse code
    pub fn verse_code(&self) -> VerseCode {
        VerseCode::parse(&self.code)
    }

    pub fn is_zero_length(&self) -> bool {
        self.start_ms == self.end_ms
    }
}

/// Parses timing file content, skipping lines that are not timing markers
pub fn parse_timing_entries(content: &str) -> Vec<TimingEntry> {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let Some(caps) = TIMING_LINE.captures(line) else {
            trace!("Skipping timing line {}: {:?}", line_no + 1, line);
            skipped += 1;
            continue;
        };

        let (Ok(start), Ok(end)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
            skipped += 1;
            continue;
        };

        let code = caps.get(3).map(|c| c.as_str().trim()).unwrap_or_default();
        entries.push(TimingEntry::new(
            seconds_to_ms(start),
            seconds_to_ms(end),
            code,
        ));
    }

    if skipped > 0 {
        debug!("Skipped {} malformed timing lines", skipped);
    }

    entries
}

/// Reads and parses a timing file
pub fn read_timing_file(path: &Path) -> CoreResult<Vec<TimingEntry>> {
    let content =
        std::fs::read_to_string(path).map_err(|source| CoreError::TimingFileUnreadable {
            path: path.to_string_lossy().to_string(),
            source,
        })?;

    let entries = parse_timing_entries(&content);
    debug!("Read {} timing entries from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic_lines() {
        let content = "0.000000\t1.640000\t1\n1.640000\t3.240000\t2\n";
        let entries = parse_timing_entries(content);
        assert_eq!(
            entries,
            vec![
                TimingEntry::new(0.0, 1640.0, "1"),
                TimingEntry::new(1640.0, 3240.0, "2"),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_fractional_milliseconds() {
        let entries = parse_timing_entries("2.0115\t3.5\t1a");
        assert_eq!(entries[0].start_ms, 2.0115 * 1000.0);
        assert_eq!(entries[0].code, "1a");
    }

    #[test]
    fn test_parse_accepts_empty_and_missing_code() {
        let entries = parse_timing_entries("1.5\t2.5\t\n2.5\t3\r\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "");
        assert_eq!(entries[1].code, "");
        assert_eq!(entries[1].verse_code(), VerseCode::Continuation);
    }

    #[test]
    fn test_parse_skips_garbage() {
        let content = "\u{FEFF}0\t1\t1\nnot a line\n1 2 3\n\n-1\t2\t3\n1\t2\t1-2\n";
        let entries = parse_timing_entries(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].code, "1-2");
    }

    #[test]
    fn test_zero_length_entry() {
        let entry = TimingEntry::new(3500.0, 3500.0, "3");
        assert!(entry.is_zero_length());
    }

    #[test]
    fn test_read_timing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0\t1.6\t1").unwrap();
        writeln!(file, "1.6\t1.6\t").unwrap();

        let entries = read_timing_file(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_zero_length());
    }

    #[test]
    fn test_read_missing_timing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_timing_file(&dir.path().join("MAT_001.txt"));
        assert!(matches!(
            result,
            Err(CoreError::TimingFileUnreadable { .. })
        ));
    }
}
