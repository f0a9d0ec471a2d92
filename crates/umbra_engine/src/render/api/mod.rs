//! Public rendering API
//!
//! Traits implemented by graphics backends plus the per-frame resource ring.

pub mod frame_data;
pub mod render_backend;

pub use frame_data::FrameResources;
pub use render_backend::{BackendResult, CommandEncoder, GraphicsDevice, ShadowMapHandle};
