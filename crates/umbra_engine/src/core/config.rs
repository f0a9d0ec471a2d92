//! # Unified Configuration
//!
//! Runtime configuration for the engine, lighting and asset subsystems.
//! Frame-resource counts, shadow-map resolution and slot counts are build-time
//! constants (see [`crate::render::constants`]) and are deliberately absent here.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Shadow projection parameters shared by all shadow-casting lights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Width and height of the directional light's orthographic volume (world units)
    pub directional_extent: f32,
    /// Near plane used by spot lights
    ///
    /// Directional lights use their falloff start as near plane instead.
    pub spot_near_plane: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            directional_extent: 40.0,
            spot_near_plane: 0.5,
        }
    }
}

impl ShadowSettings {
    /// Set the directional shadow extent
    pub fn with_directional_extent(mut self, extent: f32) -> Self {
        self.directional_extent = extent;
        self
    }

    /// Set the spot light near plane
    pub fn with_spot_near_plane(mut self, near: f32) -> Self {
        self.spot_near_plane = near;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.directional_extent.is_finite() && self.directional_extent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "directional_extent must be positive, got {}",
                self.directional_extent
            )));
        }
        if !(self.spot_near_plane.is_finite() && self.spot_near_plane > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "spot_near_plane must be positive, got {}",
                self.spot_near_plane
            )));
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Core engine behavior: logging and debug features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter passed to the logger (e.g. `"info"`, `"umbra_engine=trace"`)
    pub log_level: String,
    /// Whether to log per-frame diagnostics
    pub debug_mode: bool,
    /// Target FPS for frame rate limiting
    pub target_fps: Option<u32>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            target_fps: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Lighting Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Ambient light color (RGB)
    pub ambient_color: [f32; 3],
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Shadow projection parameters
    pub shadows: ShadowSettings,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.1,
            shadows: ShadowSettings::default(),
        }
    }
}

impl LightingConfig {
    /// Set ambient lighting
    pub fn with_ambient(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    /// Set shadow settings
    pub fn with_shadows(mut self, shadows: ShadowSettings) -> Self {
        self.shadows = shadows;
        self
    }

    /// Validate the lighting configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ambient_intensity < 0.0 || !self.ambient_intensity.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "ambient_intensity must be non-negative, got {}",
                self.ambient_intensity
            )));
        }
        self.shadows.validate()
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets
    pub assets_dir: String,
    /// File extension written by the mesh converter
    pub native_mesh_extension: String,
    /// Generate smooth normals for OBJ files that carry none
    pub generate_missing_normals: bool,
}

impl AssetConfig {
    /// Create a new asset configuration
    pub fn new() -> Self {
        Self {
            assets_dir: "resources".to_string(),
            native_mesh_extension: "umesh".to_string(),
            generate_missing_normals: true,
        }
    }

    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Lighting configuration
    pub lighting: LightingConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }
        if self.assets.native_mesh_extension.trim().is_empty() {
            return Err(ConfigError::Invalid("native_mesh_extension cannot be empty".to_string()));
        }
        self.lighting.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("umbra_config_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lighting.shadows.spot_near_plane, 0.5);
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("round_trip.toml");
        let config = ApplicationConfig {
            engine: EngineConfig::new().with_log_level("debug").with_target_fps(60),
            lighting: LightingConfig::default()
                .with_ambient([0.2, 0.3, 0.4], 0.25)
                .with_shadows(ShadowSettings::default().with_directional_extent(80.0)),
            assets: AssetConfig::new().with_assets_dir("content"),
        };

        config.save_to_file(&path).expect("save toml");
        let loaded = ApplicationConfig::load_from_file(&path).expect("load toml");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let path = temp_path("round_trip.ron");
        let config = ApplicationConfig::default();
        config.save_to_file(&path).expect("save ron");
        let loaded = ApplicationConfig::load_from_file(&path).expect("load ron");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ApplicationConfig = toml::from_str("[lighting.shadows]\nspot_near_plane = 1.5\n")
            .expect("parse partial config");
        assert_eq!(config.lighting.shadows.spot_near_plane, 1.5);
        assert_eq!(config.lighting.shadows.directional_extent, 40.0);
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_debug_mode_from_toml() {
        let config: ApplicationConfig = toml::from_str("[engine]\ndebug_mode = true\n").expect("parse debug flag");
        assert!(config.engine.debug_mode);
        assert_eq!(config.engine, EngineConfig::new().with_debug(true));

        let quiet: ApplicationConfig = toml::from_str("[engine]\ndebug_mode = false\n").expect("parse debug flag");
        assert!(!quiet.engine.debug_mode);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ApplicationConfig::default().save_to_file(temp_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_shadow_settings_rejected() {
        let config = ApplicationConfig {
            lighting: LightingConfig::default()
                .with_shadows(ShadowSettings::default().with_spot_near_plane(0.0)),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
