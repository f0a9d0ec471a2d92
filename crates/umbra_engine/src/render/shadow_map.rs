//! Shadow map resource
//!
//! A square depth target owned by exactly one shadow-casting light. The
//! resource is created once when the light is built and released with it.

use crate::render::api::{CommandEncoder, GraphicsDevice, ShadowMapHandle};
use crate::render::{RenderError, RenderResult};
use crate::scene::bounds::{Frustum, AABB};

/// Geometry submitted to a shadow pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCaster {
    /// World-space bounds used for culling
    pub bounds: AABB,
    /// Number of instances drawn
    pub instance_count: u32,
    /// Whether the mesh uses an index buffer
    pub indexed: bool,
}

impl ShadowCaster {
    /// Single indexed instance
    pub fn new(bounds: AABB) -> Self {
        Self {
            bounds,
            instance_count: 1,
            indexed: true,
        }
    }

    /// Set the instance count
    pub fn with_instances(mut self, instance_count: u32) -> Self {
        self.instance_count = instance_count;
        self
    }
}

/// Depth texture rendered from a light's point of view
#[derive(Debug, PartialEq, Eq)]
pub struct ShadowMap {
    handle: ShadowMapHandle,
    size: u32,
}

impl ShadowMap {
    /// Create the backing depth resource
    pub fn build_resource(device: &mut dyn GraphicsDevice, size: u32) -> RenderResult<Self> {
        let handle = device.create_shadow_resource(size, size).map_err(|e| match e {
            e @ RenderError::ResourceCreationFailed(_) => e,
            other => RenderError::ResourceCreationFailed(other.to_string()),
        })?;
        log::debug!("Created {}x{} shadow map {:?}", size, size, handle);
        Ok(Self { handle, size })
    }

    /// Backend handle
    pub fn handle(&self) -> ShadowMapHandle {
        self.handle
    }

    /// Width and height in texels
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Record the shadow pass and one draw per caster inside `frustum`
    ///
    /// Returns the number of draws recorded.
    pub fn render_scene(
        &self,
        encoder: &mut dyn CommandEncoder,
        frustum: &Frustum,
        casters: &[ShadowCaster],
    ) -> RenderResult<usize> {
        encoder.record_shadow_pass(self.handle, frustum)?;

        let mut draws = 0;
        for caster in casters.iter().filter(|c| c.instance_count > 0) {
            if frustum.intersects_aabb(&caster.bounds) {
                encoder.record_draw(caster.instance_count, caster.indexed)?;
                draws += 1;
            }
        }

        log::trace!("Shadow map {:?}: {} of {} casters drawn", self.handle, draws, casters.len());
        Ok(draws)
    }

    /// Return the resource to the device
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        device.destroy_shadow_resource(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backends::{HeadlessDevice, RecordedCommand, RecordingEncoder};

    #[test]
    fn test_build_and_release() {
        let mut device = HeadlessDevice::new();
        let map = ShadowMap::build_resource(&mut device, 512).expect("shadow map");
        assert_eq!(map.size(), 512);
        assert!(device.is_live(map.handle()));

        map.release(&mut device);
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_build_failure_is_resource_error() {
        let mut device = HeadlessDevice::with_resource_budget(0);
        assert!(matches!(
            ShadowMap::build_resource(&mut device, 512),
            Err(RenderError::ResourceCreationFailed(_))
        ));
    }

    #[test]
    fn test_render_scene_culls_casters() {
        let mut device = HeadlessDevice::new();
        let mut encoder = RecordingEncoder::new();
        let map = ShadowMap::build_resource(&mut device, 256).expect("shadow map");
        let frustum = Frustum::orthographic(10.0, 10.0, 1.0, 20.0);

        let casters = [
            ShadowCaster::new(AABB::from_center_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::repeat(1.0))).with_instances(4),
            ShadowCaster::new(AABB::from_center_extents(Vec3::new(0.0, 50.0, -5.0), Vec3::repeat(1.0))),
        ];
        let draws = map.render_scene(&mut encoder, &frustum, &casters).expect("shadow pass");

        assert_eq!(draws, 1);
        assert!(matches!(encoder.commands()[0], RecordedCommand::ShadowPass { target, .. } if target == map.handle()));
        assert_eq!(encoder.commands()[1], RecordedCommand::Draw { instance_count: 4, indexed: true });
    }
}
