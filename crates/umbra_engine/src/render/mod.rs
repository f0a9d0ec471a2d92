//! # Rendering System
//!
//! Backend-agnostic rendering layer: the device and command encoder
//! abstractions, per-frame resource rings, shadow maps and the lighting system.
//!
//! ## Architecture
//!
//! - **api**: `GraphicsDevice` / `CommandEncoder` traits and `FrameResources`
//! - **backends**: concrete device implementations (headless recording backend)
//! - **shadow_map**: depth resource owned by a shadow-casting light
//! - **systems::lighting**: lights, shadow projection and GPU light records
//! - **primitives**: vertex and mesh data

pub mod api;
pub mod backends;
pub mod constants;
pub mod primitives;
pub mod shadow_map;
pub mod systems;

pub use api::{BackendResult, CommandEncoder, FrameResources, GraphicsDevice, ShadowMapHandle};
pub use primitives::{Mesh, Vertex};
pub use shadow_map::{ShadowCaster, ShadowMap};
pub use systems::lighting::{
    FrameLightingStats, Light, LightData, LightDesc, LightError, LightKind, LightingFrame, LightingSystem,
};

use thiserror::Error;

/// Errors that can occur in the rendering system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    ///
    /// Indicates failure while recording or submitting commands.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources (shadow maps, buffers) cannot be created,
    /// typically due to memory constraints or invalid dimensions.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
