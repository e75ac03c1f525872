//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::export::ExportFormat;

/// Environment variable that overrides [`ServiceConfig::api_key`].
pub const API_KEY_ENV: &str = "DOC_TRANSLATE_API_KEY";

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the extraction and translation services.
///
/// Both services talk to the same OpenAI-compatible chat-completions
/// endpoint; only the prompt differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the API endpoint (without `/v1/chat/completions`).
    pub base_url: String,
    /// API key. `None` for local gateways that need no authentication.
    pub api_key: Option<String>,
    /// Vision-capable model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for one remote call.
    pub timeout_secs: u64,
    /// Languages the scanned text is expected to be written in, as they
    /// appear in the prompts.
    pub source_languages: String,
    /// Language the text is translated into.
    pub target_language: String,
}

impl ServiceConfig {
    /// The API key to use: the environment override first, then the
    /// configured value. Empty strings count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        let non_empty = |key: &String| !key.trim().is_empty();
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(non_empty)
            .or_else(|| self.api_key.clone().filter(non_empty))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "google/gemini-2.5-flash".into(),
            temperature: 0.2,
            timeout_secs: 30,
            source_languages: "Nepali or Sinhalese".into(),
            target_language: "English".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// IngestConfig
// ---------------------------------------------------------------------------

/// Upload acceptance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Size ceiling in bytes. A file of exactly this size is accepted.
    pub max_file_bytes: u64,
    /// Accepted MIME types.
    pub accepted_types: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            accepted_types: vec![
                "image/png".into(),
                "image/jpeg".into(),
                "application/pdf".into(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// EditConfig
// ---------------------------------------------------------------------------

/// Behaviour of the edit → re-translate path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Idle time after the last edit before a translation refresh fires.
    pub debounce_ms: u64,
    /// Drop translation results whose source text no longer matches the
    /// document's current extracted text.
    pub discard_stale_translations: bool,
}

impl EditConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            discard_stale_translations: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Where and how translations are written out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// `None` means [`AppPaths::exports_dir`].
    pub output_dir: Option<PathBuf>,
}

impl ExportConfig {
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().exports_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use doc_translate::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote extraction / translation service settings.
    pub service: ServiceConfig,
    /// Upload validation policy.
    pub ingest: IngestConfig,
    /// Debounced re-translation settings.
    pub edit: EditConfig,
    /// Export settings.
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.service.base_url, loaded.service.base_url);
        assert_eq!(original.service.api_key, loaded.service.api_key);
        assert_eq!(original.service.model, loaded.service.model);
        assert_eq!(original.service.timeout_secs, loaded.service.timeout_secs);
        assert_eq!(original.ingest.max_file_bytes, loaded.ingest.max_file_bytes);
        assert_eq!(original.ingest.accepted_types, loaded.ingest.accepted_types);
        assert_eq!(original.edit.debounce_ms, loaded.edit.debounce_ms);
        assert_eq!(original.export.format, loaded.export.format);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.edit.debounce_ms, 1000);
        assert_eq!(config.ingest.max_file_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.service.timeout_secs, 30);
        assert_eq!(cfg.service.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.service.model, "google/gemini-2.5-flash");
        assert_eq!(cfg.service.source_languages, "Nepali or Sinhalese");
        assert_eq!(cfg.service.target_language, "English");
        assert!(cfg.service.api_key.is_none());
        assert_eq!(cfg.ingest.max_file_bytes, 10_485_760);
        assert!(cfg.ingest.accepted_types.iter().any(|t| t == "application/pdf"));
        assert_eq!(cfg.edit.debounce(), Duration::from_millis(1000));
        assert!(cfg.edit.discard_stale_translations);
        assert_eq!(cfg.export.format, ExportFormat::Text);
        assert!(cfg.export.output_dir.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[edit]\ndebounce_ms = 250\n").expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.edit.debounce_ms, 250);
        assert!(cfg.edit.discard_stale_translations);
        assert_eq!(cfg.service.timeout_secs, 30);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.service.base_url = "https://api.openai.com".into();
        cfg.service.api_key = Some("sk-test".into());
        cfg.ingest.max_file_bytes = 1024;
        cfg.edit.discard_stale_translations = false;
        cfg.export.format = ExportFormat::Json;
        cfg.export.output_dir = Some(PathBuf::from("/tmp/out"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.service.base_url, "https://api.openai.com");
        assert_eq!(loaded.service.api_key, Some("sk-test".into()));
        assert_eq!(loaded.ingest.max_file_bytes, 1024);
        assert!(!loaded.edit.discard_stale_translations);
        assert_eq!(loaded.export.format, ExportFormat::Json);
        assert_eq!(loaded.export.resolved_output_dir(), PathBuf::from("/tmp/out"));
    }
}
