//! Target registry
//!
//! Resolves the configured target set against one locale at session start.
//! The registry is read-only afterwards: `list()` returns targets in
//! configuration order (the order the external tracking engine indexes
//! against; it carries no semantic priority), `get()` looks one up by id.

use arbv_common::config::AppConfig;
use arbv_common::TargetId;

/// One resolved target: a recognizable page marker with its media bindings
///
/// URL fields are already resolved through the locale fallback chain and are
/// passed through unchanged to whoever constructs media elements.
#[derive(Debug, Clone)]
pub struct Target {
    /// Page number; unique within the registry
    pub id: TargetId,
    /// Index the tracking engine reports this target under
    pub index: usize,
    /// Trained marker image path
    pub marker_image: String,
    /// Page title in the session locale
    pub title: Option<String>,
    /// Overlay video URL
    pub video_url: Option<String>,
    /// Ambient audio track URL
    pub audio_url: Option<String>,
    /// Static overlay image URL
    pub image_url: Option<String>,
}

impl Target {
    /// Whether any playable media is configured for this target
    pub fn has_media(&self) -> bool {
        self.video_url.is_some() || self.audio_url.is_some()
    }
}

/// Ordered, immutable set of targets for one session
#[derive(Debug)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Build a registry from configuration, resolving media URLs for `locale`
    pub fn from_config(config: &AppConfig, locale: &str) -> Self {
        let default_locale = &config.default_locale;
        let targets = config
            .targets
            .iter()
            .enumerate()
            .map(|(index, t)| Target {
                id: t.id,
                index,
                marker_image: t.marker_image.clone(),
                title: t
                    .title
                    .as_ref()
                    .and_then(|l| l.resolve(locale, default_locale))
                    .map(str::to_string),
                video_url: t
                    .video
                    .as_ref()
                    .and_then(|l| l.resolve(locale, default_locale))
                    .map(str::to_string),
                audio_url: t
                    .audio
                    .as_ref()
                    .and_then(|l| l.resolve(locale, default_locale))
                    .map(str::to_string),
                image_url: t.image.clone(),
            })
            .collect();

        Self { targets }
    }

    /// All targets in configuration order
    pub fn list(&self) -> &[Target] {
        &self.targets
    }

    /// Look up a target by id
    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig::from_toml(
            r#"
default_locale = "vi"

[[targets]]
id = 1
marker_image = "markers/page1.jpg"

[targets.title]
en = "Page 1"
vi = "Trang 1"

[targets.video]
vi = "videos/page1-vi.mp4"

[[targets]]
id = 2
marker_image = "markers/page2.jpg"

[targets.audio]
en = "audio/page2-en.mp3"
vi = "audio/page2-vi.mp3"

[[targets]]
id = 5
marker_image = "markers/page5.jpg"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_preserves_config_order() {
        let registry = TargetRegistry::from_config(&sample_config(), "en");

        let ids: Vec<_> = registry.list().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TargetId(1), TargetId(2), TargetId(5)]);

        let indices: Vec<_> = registry.list().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = TargetRegistry::from_config(&sample_config(), "en");

        assert!(registry.get(TargetId(2)).is_some());
        assert!(registry.get(TargetId(99)).is_none());
    }

    #[test]
    fn test_locale_resolution() {
        let registry = TargetRegistry::from_config(&sample_config(), "en");

        let page1 = registry.get(TargetId(1)).unwrap();
        assert_eq!(page1.title.as_deref(), Some("Page 1"));
        // No English video configured; falls back to the default locale
        assert_eq!(page1.video_url.as_deref(), Some("videos/page1-vi.mp4"));

        let page2 = registry.get(TargetId(2)).unwrap();
        assert_eq!(page2.audio_url.as_deref(), Some("audio/page2-en.mp3"));
    }

    #[test]
    fn test_target_without_media() {
        let registry = TargetRegistry::from_config(&sample_config(), "en");

        let page5 = registry.get(TargetId(5)).unwrap();
        assert!(!page5.has_media());
        assert!(registry.get(TargetId(1)).unwrap().has_media());
    }
}
