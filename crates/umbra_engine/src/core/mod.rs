//! # Core Engine Module
//!
//! Shared configuration types used across the engine's subsystems.

pub mod config;

pub use config::{
    ApplicationConfig,
    AssetConfig,
    Config,
    ConfigError,
    EngineConfig,
    LightingConfig,
    ShadowSettings,
};
