//! Shadow projection derivation
//!
//! Pure functions turning a light's spatial state into the matrices and
//! culling volume needed to render and sample its shadow map.
//!
//! Matrices follow the column-vector convention, so the shadow transform is
//! `T * P * V`: world space to light view, to light clip space, to shadow-map
//! texture space (`u, v ∈ [0, 1]`, depth `∈ [0, 1]`).

use crate::core::config::ShadowSettings;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::systems::lighting::light::LightKind;
use crate::scene::bounds::Frustum;

/// Inputs to [`compute_shadow`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    /// Light position
    pub position: Vec3,
    /// Unit direction the light points in
    pub direction: Vec3,
    /// Up vector, not parallel to `direction`
    pub up: Vec3,
    /// Distance where attenuation starts (directional near plane)
    pub falloff_start: f32,
    /// Distance where the light reaches zero (far plane)
    pub falloff_end: f32,
    /// Half-angle of the spot cone in radians
    pub spot_angle: f32,
    /// Projection settings
    pub settings: ShadowSettings,
}

/// Light-space camera and derived shadow data for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowProjection {
    /// World to light view
    pub view: Mat4,
    /// Light view to clip space (depth in `[0, 1]`)
    pub proj: Mat4,
    /// World to shadow-map texture space
    pub shadow_transform: Mat4,
    /// World-space culling volume of the shadow pass
    pub frustum: Frustum,
    /// Point the light camera looks at
    pub target: Vec3,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
}

/// Derive the shadow projection for a light of the given kind
///
/// Point lights cast no shadows and yield `None`.
pub fn compute_shadow(kind: LightKind, params: &ShadowParams) -> Option<ShadowProjection> {
    let (proj, frustum, near) = match kind {
        LightKind::Point => return None,
        LightKind::Directional => {
            let extent = params.settings.directional_extent;
            let near = params.falloff_start;
            (
                Mat4::orthographic(extent, extent, near, params.falloff_end),
                Frustum::orthographic(extent, extent, near, params.falloff_end),
                near,
            )
        }
        LightKind::Spot => {
            let fov = 2.0 * params.spot_angle;
            let near = params.settings.spot_near_plane;
            (
                Mat4::perspective(fov, 1.0, near, params.falloff_end),
                Frustum::perspective(fov, 1.0, near, params.falloff_end),
                near,
            )
        }
    };

    let target = params.position + params.direction * params.falloff_end;
    let view = Mat4::look_at(params.position, target, params.up);
    let shadow_transform = Mat4::texture_transform() * proj * view;
    let frustum = frustum.transformed(&view.rigid_inverse());

    Some(ShadowProjection {
        view,
        proj,
        shadow_transform,
        frustum,
        target,
        near,
        far: params.falloff_end,
    })
}
