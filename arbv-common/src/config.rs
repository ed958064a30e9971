//! Configuration loading and target definitions
//!
//! The target set for one book is a TOML file: an ordered `[[targets]]`
//! array with per-locale URL tables. Order matters — it assigns the indices
//! the external tracking engine reports against — so targets keep their
//! configuration order throughout.

use crate::target::TargetId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Locale → value map with fallback-chain resolution
///
/// Resolution tries the requested locale first, then the configured default
/// locale. Media URLs are opaque strings; callers may append cache-defeating
/// query parameters without this layer caring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized(pub BTreeMap<String, String>);

impl Localized {
    /// Resolve a value for `locale`, falling back to `default_locale`
    pub fn resolve(&self, locale: &str, default_locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(default_locale))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One configured target (a recognizable page marker with its media)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Page number; unique and stable within one book
    pub id: TargetId,

    /// Path or URL of the trained marker image
    pub marker_image: String,

    /// Human-readable page title per locale
    #[serde(default)]
    pub title: Option<Localized>,

    /// Overlay video URL per locale
    #[serde(default)]
    pub video: Option<Localized>,

    /// Ambient audio track URL per locale
    #[serde(default)]
    pub audio: Option<Localized>,

    /// Static overlay image (no playback policy applies)
    #[serde(default)]
    pub image: Option<String>,
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Locale used when a localized value is missing for the requested one
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Ordered target set; order assigns tracking-engine indices
    pub targets: Vec<TargetConfig>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants the rest of the system relies on
    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::Config("No targets configured".to_string()));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.id) {
                return Err(Error::Config(format!(
                    "Duplicate target id: {}",
                    target.id
                )));
            }
        }

        Ok(())
    }
}

/// Config file path resolution, priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory fallback
pub fn resolve_config_path(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join("arbv").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("arbv.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_locale = "vi"

[[targets]]
id = 1
marker_image = "markers/page1-marker.jpg"

[targets.title]
en = "Page 1 - Introduction"
vi = "Trang 1 - Gioi thieu"

[targets.video]
en = "videos/page1-video-en.mp4"
vi = "videos/page1-video-vi.mp4"

[[targets]]
id = 2
marker_image = "markers/page2-marker.jpg"

[targets.audio]
vi = "audio/page2-audio-vi.mp3"

[[targets]]
id = 3
marker_image = "markers/page3-marker.jpg"
image = "images/page3-overlay.png"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.default_locale, "vi");
        assert_eq!(config.targets.len(), 3);
        assert_eq!(config.targets[0].id, TargetId(1));
        assert!(config.targets[0].video.is_some());
        assert!(config.targets[0].audio.is_none());
        assert!(config.targets[1].audio.is_some());
        assert_eq!(config.targets[2].image.as_deref(), Some("images/page3-overlay.png"));
    }

    #[test]
    fn test_locale_fallback_chain() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();

        let video = config.targets[0].video.as_ref().unwrap();
        // Requested locale wins when present
        assert_eq!(
            video.resolve("en", &config.default_locale),
            Some("videos/page1-video-en.mp4")
        );
        // Unknown locale falls back to the default
        assert_eq!(
            video.resolve("fr", &config.default_locale),
            Some("videos/page1-video-vi.mp4")
        );

        let audio = config.targets[1].audio.as_ref().unwrap();
        // Missing in requested locale, present in default
        assert_eq!(
            audio.resolve("en", &config.default_locale),
            Some("audio/page2-audio-vi.mp3")
        );
        // Missing everywhere in the chain
        let empty = Localized::default();
        assert_eq!(empty.resolve("en", "vi"), None);
    }

    #[test]
    fn test_default_locale_defaults_to_en() {
        let config = AppConfig::from_toml(
            r#"
[[targets]]
id = 1
marker_image = "m.jpg"
"#,
        )
        .unwrap();
        assert_eq!(config.default_locale, "en");
    }

    #[test]
    fn test_empty_targets_rejected() {
        let err = AppConfig::from_toml("targets = []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = AppConfig::from_toml(
            r#"
[[targets]]
id = 1
marker_image = "a.jpg"

[[targets]]
id = 1
marker_image = "b.jpg"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.targets.len(), 3);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load(Path::new("/nonexistent/arbv.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_resolve_config_path_cli_wins() {
        let path = resolve_config_path(Some("/tmp/custom.toml"), "ARBV_TEST_CONFIG_UNSET");
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }
}
