//! Engine Settings Persistence
//!
//! Provides persistent engine settings with:
//! - Atomic file writes (temp file + rename)
//! - Defaults for every missing field
//! - Normalization of out-of-range values on load and save
//!
//! Storage location: {config_dir}/settings.json

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::performance::ParallelConfig;
use crate::core::timing::{
    PhraseDelimiters, SegmentBuilder, DEFAULT_BRIDGE_SEPARATOR, DEFAULT_PHRASE_DELIMITERS,
};
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Upper bound for the chapter concurrency setting
const MAX_CONCURRENT_CHAPTERS: usize = 64;

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Phrase delimiter specification (space separated tokens)
    #[serde(default = "default_phrase_delimiters")]
    pub phrase_delimiters: String,

    /// Text placed between bridged verses
    #[serde(default = "default_bridge_separator")]
    pub bridge_separator: String,

    /// Audio file extensions recognized in chapter folders
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,

    /// Chapters processed at once (0 = one per CPU)
    #[serde(default)]
    pub max_concurrent_chapters: usize,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_phrase_delimiters() -> String {
    DEFAULT_PHRASE_DELIMITERS.to_string()
}

fn default_bridge_separator() -> String {
    DEFAULT_BRIDGE_SEPARATOR.to_string()
}

fn default_audio_extensions() -> Vec<String> {
    vec!["mp3".to_string(), "wav".to_string()]
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            phrase_delimiters: default_phrase_delimiters(),
            bridge_separator: default_bridge_separator(),
            audio_extensions: default_audio_extensions(),
            max_concurrent_chapters: 0,
        }
    }
}

impl EngineSettings {
    /// Repairs values so persisted state is always usable
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.phrase_delimiters = self.phrase_delimiters.trim().to_string();

        if self.bridge_separator.is_empty() {
            self.bridge_separator = default_bridge_separator();
        }

        let mut extensions: Vec<String> = Vec::new();
        for ext in &self.audio_extensions {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        self.audio_extensions = if extensions.is_empty() {
            default_audio_extensions()
        } else {
            extensions
        };

        self.max_concurrent_chapters = self.max_concurrent_chapters.min(MAX_CONCURRENT_CHAPTERS);
    }

    /// Parsed phrase delimiters
    pub fn delimiters(&self) -> PhraseDelimiters {
        PhraseDelimiters::parse(&self.phrase_delimiters)
    }

    /// Segment builder configured from these settings
    pub fn segment_builder(&self) -> SegmentBuilder {
        SegmentBuilder::new(&self.delimiters()).with_bridge_separator(self.bridge_separator.clone())
    }

    /// Worker pool configuration
    pub fn parallel_config(&self) -> ParallelConfig {
        ParallelConfig::with_max_concurrent(self.max_concurrent_chapters)
    }
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager storing `settings.json` in the given directory
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: config_dir.into().join(SETTINGS_FILE),
        }
    }

    /// Creates a manager for an explicit settings file
    pub fn with_path(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Loads settings, falling back to defaults on a missing or corrupt file
    pub fn load(&self) -> EngineSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(EngineSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings: EngineSettings = serde_json::from_str(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = Self::migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                EngineSettings::default()
            }
        }
    }

    /// Saves settings using an atomic write (temp file + rename)
    pub fn save(&self, settings: &EngineSettings) -> CoreResult<EngineSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;

            if cfg!(windows) && self.settings_path.exists() {
                // rename does not overwrite on Windows
                fs::remove_file(&self.settings_path)?;
            }
            fs::rename(&temp_path, &self.settings_path).map_err(|e| {
                CoreError::Internal(format!("Failed to finalize settings file: {}", e))
            })?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Resets settings to defaults and deletes the settings file
    pub fn reset(&self) -> CoreResult<EngineSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(EngineSettings::default())
        })
    }

    fn migrate(mut settings: EngineSettings) -> EngineSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // -------------------------------------------------------------------------
    // EngineSettings Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.phrase_delimiters, ". , ; : ! ?");
        assert_eq!(settings.bridge_separator, " ");
        assert_eq!(settings.audio_extensions, vec!["mp3", "wav"]);
        assert_eq!(settings.max_concurrent_chapters, 0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"phraseDelimiters":"\\u060C"}"#).unwrap();
        assert_eq!(settings.phrase_delimiters, "\\u060C");
        assert_eq!(settings.bridge_separator, " ");
        assert_eq!(settings.audio_extensions, vec!["mp3", "wav"]);
        assert_eq!(settings.delimiters().chars(), &['\u{060C}']);
    }

    #[test]
    fn test_normalize_repairs_values() {
        let mut settings = EngineSettings {
            version: 0,
            phrase_delimiters: "  , ;  ".to_string(),
            bridge_separator: String::new(),
            audio_extensions: vec![".MP3".to_string(), "mp3".to_string(), " ".to_string()],
            max_concurrent_chapters: 1000,
        };
        settings.normalize();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.phrase_delimiters, ", ;");
        assert_eq!(settings.bridge_separator, " ");
        assert_eq!(settings.audio_extensions, vec!["mp3"]);
        assert_eq!(settings.max_concurrent_chapters, MAX_CONCURRENT_CHAPTERS);
    }

    #[test]
    fn test_normalize_restores_empty_extensions() {
        let mut settings = EngineSettings {
            audio_extensions: vec![],
            ..Default::default()
        };
        settings.normalize();
        assert_eq!(settings.audio_extensions, vec!["mp3", "wav"]);
    }

    #[test]
    fn test_parallel_config_from_settings() {
        let settings = EngineSettings {
            max_concurrent_chapters: 3,
            ..Default::default()
        };
        assert_eq!(settings.parallel_config().max_concurrent, 3);
        assert_eq!(
            EngineSettings::default().parallel_config(),
            ParallelConfig::default()
        );
    }

    // -------------------------------------------------------------------------
    // SettingsManager Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        assert_eq!(manager.load(), EngineSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());

        let settings = EngineSettings {
            phrase_delimiters: "\\s".to_string(),
            bridge_separator: " / ".to_string(),
            max_concurrent_chapters: 2,
            ..Default::default()
        };
        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved, settings);
        assert!(manager.settings_path().exists());
        assert!(!dir.path().join("settings.json.tmp").exists());

        assert_eq!(manager.load(), settings);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();

        let manager = SettingsManager::new(dir.path());
        assert_eq!(manager.load(), EngineSettings::default());
    }

    #[test]
    fn test_old_version_is_migrated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"version":0,"bridgeSeparator":"; "}"#,
        )
        .unwrap();

        let settings = SettingsManager::new(dir.path()).load();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.bridge_separator, "; ");
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path());
        manager.save(&EngineSettings::default()).unwrap();

        let settings = manager.reset().unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert!(!manager.settings_path().exists());
    }

    #[test]
    fn test_with_path_in_nested_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("engine.json");
        let manager = SettingsManager::with_path(&path);
        manager.save(&EngineSettings::default()).unwrap();
        assert!(path.exists());
    }
}
