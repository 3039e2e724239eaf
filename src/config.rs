//! JSON configuration for the windowed runner.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::lifecycle::SurfaceSettings;
use crate::scene::SceneKind;
use crate::trigger::SamplerConfig;

/// Window title and initial size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "orbscape".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

/// Everything needed to host one scene.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub kind: SceneKind,
    #[serde(default = "default_seed")]
    pub seed: String,
    /// Identifier the orb accent color is derived from.
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub evolution: i32,
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default)]
    pub high_activity: bool,
    #[serde(default = "default_true")]
    pub interactive: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Edge length in pixels of an orb's square surface.
    #[serde(default = "default_display_size")]
    pub display_size: u32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
}

fn default_seed() -> String {
    "orbscape".to_string()
}

fn default_true() -> bool {
    true
}

fn default_display_size() -> u32 {
    140
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            kind: SceneKind::default(),
            seed: default_seed(),
            identity: String::new(),
            evolution: 0,
            magnitude: 0.0,
            high_activity: false,
            interactive: true,
            visible: true,
            display_size: default_display_size(),
            window: WindowConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Lifecycle inputs described by this config.
    pub fn settings(&self) -> SurfaceSettings {
        SurfaceSettings {
            kind: self.kind,
            seed: self.seed.clone(),
            evolution: self.evolution,
            magnitude: self.magnitude,
            high_activity: self.high_activity,
            interactive: self.interactive,
            visible: self.visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: SceneConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert!(config.visible);
        assert_eq!(config.display_size, 140);
    }

    #[test]
    fn test_partial_json() {
        let config: SceneConfig =
            serde_json::from_str(r#"{"kind":"orb","seed":"abc","evolution":12,"window":{"width":640}}"#).unwrap();
        assert_eq!(config.kind, SceneKind::Orb);
        assert_eq!(config.seed, "abc");
        assert_eq!(config.evolution, 12);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 800);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("orbscape-config-{}.json", std::process::id()));
        let config = SceneConfig {
            magnitude: 1e9,
            high_activity: true,
            ..SceneConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
