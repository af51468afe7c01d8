//! Unveil configuration file handling

use crate::error::UnveilError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use unveil_animation::{
    DriverStatus, Easing, EntranceConfig, EntrancePreset, MotionPolicy, StaggerConfig, DEFAULT_DURATION_MS,
    DEFAULT_OFFSET_Y, DEFAULT_STAGGER_MS,
};
use unveil_layout::{ObserveOptions, ObserverSupport, PageOptions};

/// File name looked up when a directory is given
pub const CONFIG_FILE: &str = "unveil.toml";

/// Top-level Unveil configuration (unveil.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UnveilConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

/// Initial window onto the page
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Entrance timing and motion preferences
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MotionConfig {
    #[serde(default = "default_duration")]
    pub duration_ms: u32,
    /// Starting downward offset of hidden blocks
    #[serde(default = "default_offset")]
    pub offset_y: f32,
    /// Gap between sibling cards
    #[serde(default = "default_stagger")]
    pub stagger_ms: u32,
    #[serde(default)]
    pub easing: Easing,
    /// Named entrance shape; overrides `offset_y` and `easing`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<EntrancePreset>,
    /// Snap blocks to rest instead of animating
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub driver: DriverStatus,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MS
}

fn default_offset() -> f32 {
    DEFAULT_OFFSET_Y
}

fn default_stagger() -> u32 {
    DEFAULT_STAGGER_MS
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration(),
            offset_y: default_offset(),
            stagger_ms: default_stagger(),
            easing: Easing::default(),
            preset: None,
            reduced_motion: false,
            driver: DriverStatus::Available,
        }
    }
}

/// Visibility observation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObserverConfig {
    /// Fraction of a block that must be visible; 0 means any overlap
    #[serde(default)]
    pub threshold: f32,
    /// Grows the viewport before testing
    #[serde(default)]
    pub margin: f32,
    /// Set false to emulate an environment without visibility observation
    #[serde(default = "default_true")]
    pub supported: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            margin: 0.0,
            supported: true,
        }
    }
}

/// Where report content comes from
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Content file, relative to the config file. Built-in content otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl UnveilConfig {
    /// Load configuration from a file, or from `unveil.toml` in a directory.
    /// A relative content path is resolved against the config's directory.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found at {}. Run `unveil init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        if let (Some(content_path), Some(dir)) = (config.content.path.as_mut(), config_path.parent()) {
            if content_path.is_relative() {
                *content_path = dir.join(&*content_path);
            }
        }

        tracing::debug!(path = %config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: UnveilConfig = toml::from_str(input).map_err(UnveilError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> std::result::Result<(), UnveilError> {
        let ViewportConfig { width, height } = self.viewport;
        if !(width > 0.0 && height > 0.0) {
            return Err(UnveilError::InvalidConfig(format!(
                "viewport must have a positive size, got {width}x{height}"
            )));
        }
        if self.motion.offset_y < 0.0 {
            return Err(UnveilError::InvalidConfig(format!(
                "motion.offset_y must not be negative, got {}",
                self.motion.offset_y
            )));
        }
        self.observe_options().validate()?;
        Ok(())
    }

    pub fn entrance(&self) -> EntranceConfig {
        if let Some(preset) = self.motion.preset {
            return preset.config(self.motion.duration_ms);
        }
        EntranceConfig::new(self.motion.duration_ms)
            .with_offset(self.motion.offset_y)
            .with_easing(self.motion.easing)
    }

    pub fn stagger(&self) -> StaggerConfig {
        StaggerConfig::new(self.motion.stagger_ms)
    }

    pub fn observe_options(&self) -> ObserveOptions {
        ObserveOptions::default()
            .with_threshold(self.observer.threshold)
            .with_margin(self.observer.margin)
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            width: self.viewport.width,
            height: self.viewport.height,
            entrance: self.entrance(),
            observe: self.observe_options(),
            policy: if self.motion.reduced_motion {
                MotionPolicy::Reduced
            } else {
                MotionPolicy::Animate
            },
            driver: self.motion.driver,
            support: if self.observer.supported {
                ObserverSupport::Supported
            } else {
                ObserverSupport::Unsupported
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = UnveilConfig::from_toml("").unwrap();
        assert_eq!(config, UnveilConfig::default());
        assert_eq!(config.page_options(), PageOptions::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = UnveilConfig::from_toml(
            r#"
            [motion]
            stagger_ms = 150
            easing = "linear"
            reduced_motion = true

            [observer]
            threshold = 0.25
            supported = false
            "#,
        )
        .unwrap();

        assert_eq!(config.motion.duration_ms, 600);
        assert_eq!(config.stagger().delays(3), vec![0, 150, 300]);
        let options = config.page_options();
        assert_eq!(options.entrance.easing, Easing::Linear);
        assert_eq!(options.policy, MotionPolicy::Reduced);
        assert_eq!(options.support, ObserverSupport::Unsupported);
        assert_eq!(options.observe.threshold, 0.25);
    }

    #[test]
    fn test_preset_overrides_offset_and_easing() {
        let config = UnveilConfig::from_toml(
            "[motion]\nduration_ms = 400\noffset_y = 5.0\npreset = \"rise\"\n",
        )
        .unwrap();
        let entrance = config.entrance();
        assert_eq!(entrance, EntrancePreset::Rise.config(400));
        assert_eq!(entrance.easing, Easing::EaseOutCubic);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = UnveilConfig::from_toml("[observer]\nthreshold = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_rejects_empty_viewport() {
        assert!(UnveilConfig::from_toml("[viewport]\nwidth = 0.0\n").is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = UnveilConfig::default();
        config.motion.driver = DriverStatus::Unavailable;
        config.content.path = Some(PathBuf::from("content.toml"));

        let text = config.to_toml().unwrap();
        assert!(text.contains("driver = \"unavailable\""));
        assert_eq!(UnveilConfig::from_toml(&text).unwrap(), config);
    }
}
