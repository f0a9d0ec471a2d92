//! Lighting system
//!
//! Lights, shadow projection derivation and per-frame light buffers.

pub mod light;
pub mod shadow;
pub mod system;

pub use light::{Light, LightData, LightDesc, LightError, LightFrameState, LightKind};
pub use shadow::{compute_shadow, ShadowParams, ShadowProjection};
pub use system::{FrameLightingStats, LightingBuffer, LightingFrame, LightingHeader, LightingSystem};
