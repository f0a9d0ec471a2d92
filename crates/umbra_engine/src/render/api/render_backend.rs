//! Backend abstraction traits for the rendering system
//!
//! Lights and shadow maps only talk to the GPU through these two traits, so
//! any backend (or the headless recorder used by tests) can sit underneath.

use crate::render::RenderError;
use crate::scene::bounds::Frustum;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a shadow map depth resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowMapHandle(pub u64);

/// Resource-creating half of a graphics backend
///
/// Resource creation happens on the thread that owns the device context.
pub trait GraphicsDevice {
    /// Create a depth texture usable as a shadow map
    fn create_shadow_resource(&mut self, width: u32, height: u32) -> BackendResult<ShadowMapHandle>;

    /// Release a shadow resource; unknown handles are ignored
    fn destroy_shadow_resource(&mut self, handle: ShadowMapHandle);
}

/// Command recording half of a graphics backend
pub trait CommandEncoder {
    /// Begin a depth-only pass into `target`, culled against `frustum`
    fn record_shadow_pass(&mut self, target: ShadowMapHandle, frustum: &Frustum) -> BackendResult<()>;

    /// Record a draw call
    fn record_draw(&mut self, instance_count: u32, indexed: bool) -> BackendResult<()>;
}
