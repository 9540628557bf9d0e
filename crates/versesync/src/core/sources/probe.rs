//! Audio Probes
//!
//! [`AudioProbe`] implementations: a WAV header reader for per-line recordings
//! and an FFprobe wrapper for everything else.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::core::{seconds_to_ms, CoreError, CoreResult, TimeMs};

use super::AudioProbe;

fn probe_error(path: &Path, reason: impl Into<String>) -> CoreError {
    CoreError::AudioProbeFailed {
        path: path.to_string_lossy().to_string(),
        reason: reason.into(),
    }
}

fn ensure_exists(path: &Path) -> CoreResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CoreError::FileNotFound(path.to_string_lossy().to_string()))
    }
}

// =============================================================================
// WAV Probe
// =============================================================================

/// Reads duration from the WAV header
#[derive(Clone, Copy, Debug, Default)]
pub struct WavAudioProbe;

impl AudioProbe for WavAudioProbe {
    fn duration_ms(&self, path: &Path) -> CoreResult<TimeMs> {
        ensure_exists(path)?;

        let reader = hound::WavReader::open(path)
            .map_err(|e| probe_error(path, format!("Failed to open WAV file: {}", e)))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(probe_error(path, "WAV header has a zero sample rate"));
        }

        let duration = seconds_to_ms(f64::from(reader.duration()) / f64::from(spec.sample_rate));
        debug!("Probed {} as {} ms", path.display(), duration);
        Ok(duration)
    }
}

// =============================================================================
// FFprobe Probe
// =============================================================================

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Runs `ffprobe` to read the container duration
#[derive(Clone, Debug)]
pub struct FfprobeAudioProbe {
    ffprobe_path: String,
}

impl Default for FfprobeAudioProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeAudioProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Parses the duration out of `ffprobe -print_format json -show_format` output
    pub fn parse_duration(json: &str) -> Option<TimeMs> {
        let output: FfprobeOutput = serde_json::from_str(json).ok()?;
        let seconds: f64 = output.format?.duration?.trim().parse().ok()?;
        (seconds.is_finite() && seconds >= 0.0).then(|| seconds_to_ms(seconds))
    }
}

impl AudioProbe for FfprobeAudioProbe {
    fn duration_ms(&self, path: &Path) -> CoreResult<TimeMs> {
        ensure_exists(path)?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| probe_error(path, format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(probe_error(path, format!("ffprobe failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_duration(&stdout)
            .ok_or_else(|| probe_error(path, "No duration found in ffprobe output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, samples: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    // -------------------------------------------------------------------------
    // WAV Probe Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.wav");
        write_wav(&path, 16000, 22400);

        let duration = WavAudioProbe.duration_ms(&path).unwrap();
        assert_eq!(duration, 1400.0);
    }

    #[test]
    fn test_wav_missing_file() {
        let result = WavAudioProbe.duration_ms(Path::new("/nonexistent/1.wav"));
        assert!(matches!(result, Err(CoreError::FileNotFound(_))));
    }

    #[test]
    fn test_wav_not_a_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.wav");
        std::fs::write(&path, b"not riff data").unwrap();

        let result = WavAudioProbe.duration_ms(&path);
        assert!(matches!(result, Err(CoreError::AudioProbeFailed { .. })));
    }

    // -------------------------------------------------------------------------
    // FFprobe Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_ffprobe_duration() {
        let json = r#"{"format":{"filename":"a.mp3","duration":"5.208000","size":"83456"}}"#;
        assert_eq!(FfprobeAudioProbe::parse_duration(json), Some(5.208 * 1000.0));
    }

    #[test]
    fn test_parse_ffprobe_without_duration() {
        assert_eq!(FfprobeAudioProbe::parse_duration(r#"{"format":{}}"#), None);
        assert_eq!(FfprobeAudioProbe::parse_duration(r#"{}"#), None);
        assert_eq!(FfprobeAudioProbe::parse_duration("garbage"), None);
        assert_eq!(
            FfprobeAudioProbe::parse_duration(r#"{"format":{"duration":"N/A"}}"#),
            None
        );
    }

    #[test]
    fn test_ffprobe_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        std::fs::write(&path, b"").unwrap();

        let probe = FfprobeAudioProbe::new("/nonexistent/ffprobe");
        let result = probe.duration_ms(&path);
        assert!(matches!(result, Err(CoreError::AudioProbeFailed { .. })));
    }
}
