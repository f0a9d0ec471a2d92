//! Scene lights
//!
//! A single [`Light`] type covers directional, point and spot lights; the
//! [`LightKind`] tag selects how the shadow projection is derived. Directional
//! and spot lights own a [`ShadowMap`] created at construction. Point lights
//! never cast shadows and never allocate one.
//!
//! Each frame a light moves through [`LightFrameState`]:
//! `Idle → DataRequested → ShadowReady`, and back to `Idle` on
//! [`Light::begin_frame`]. Rendering the shadow map requires fresh data from
//! [`Light::set_light_data`] in the same frame.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::core::config::ShadowSettings;
use crate::foundation::math::{constants, utils, Mat4, Vec3};
use crate::render::api::{CommandEncoder, GraphicsDevice};
use crate::render::constants::SHADOW_MAP_SIZE;
use crate::render::shadow_map::{ShadowCaster, ShadowMap};
use crate::render::systems::lighting::shadow::{compute_shadow, ShadowParams, ShadowProjection};
use crate::render::RenderError;
use crate::scene::bounds::Frustum;
use crate::scene::component::Component;
use crate::scene::game_object::GameObject;

/// Types of lights supported by the lighting system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Parallel rays with an orthographic shadow volume (sun, moon)
    Directional,
    /// Omnidirectional light from a point; casts no shadows
    Point,
    /// Cone of light with a perspective shadow volume (flashlight)
    Spot,
}

impl LightKind {
    /// Whether lights of this kind own a shadow map
    pub fn casts_shadows(self) -> bool {
        !matches!(self, LightKind::Point)
    }

    /// Tag written into [`LightData::kind`]
    pub fn gpu_tag(self) -> u32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
            LightKind::Spot => 2,
        }
    }
}

/// Per-light record uploaded to the GPU
///
/// 128 bytes, std140 compatible. `shadow_transform` is stored column-major,
/// the layout GLSL expects for `mat4`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LightData {
    /// World-space position
    pub position: [f32; 3],
    /// Distance where attenuation starts
    pub falloff_start: f32,
    /// Unit direction
    pub direction: [f32; 3],
    /// Distance where the light reaches zero
    pub falloff_end: f32,
    /// Color scaled by intensity
    pub strength: [f32; 3],
    /// Half-angle of the spot cone in radians
    pub spot_angle: f32,
    /// [`LightKind::gpu_tag`]
    pub kind: u32,
    /// 1 when the light contributes
    pub enabled: u32,
    /// 1 when `shadow_transform` is valid
    pub has_shadow: u32,
    /// Padding for std140 alignment
    pub _padding: u32,
    /// World to shadow-map texture space
    pub shadow_transform: [[f32; 4]; 4],
}

/// Per-frame progress of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightFrameState {
    /// No data produced this frame; cached shadow data is stale
    #[default]
    Idle,
    /// `set_light_data` ran this frame
    DataRequested,
    /// The shadow map was rendered this frame
    ShadowReady,
}

/// Lighting errors
#[derive(Error, Debug)]
pub enum LightError {
    /// A light parameter is out of range
    #[error("Invalid light parameter: {0}")]
    InvalidParameter(String),

    /// The shadow map could not be created, so the light was not built
    #[error("Failed to create shadow map for light '{light}': {source}")]
    ResourceCreation {
        /// Light name
        light: String,
        /// Backend failure
        #[source]
        source: RenderError,
    },

    /// Shadow rendering was requested before light data was produced this frame
    #[error("Light '{0}' has stale shadow data; call set_light_data first")]
    StaleShadowData(String),

    /// The light does not cast shadows
    #[error("Light '{0}' has no shadow map")]
    NoShadowMap(String),

    /// Command recording failed
    #[error("Backend error: {0}")]
    Backend(#[from] RenderError),
}

/// Construction parameters for a [`Light`]
#[derive(Debug, Clone, PartialEq)]
pub struct LightDesc {
    /// Display name
    pub name: String,
    /// Light type
    pub kind: LightKind,
    /// World-space position
    pub position: Vec3,
    /// Direction the light points in (need not be normalized)
    pub direction: Vec3,
    /// Up vector hint for the light camera
    pub up: Vec3,
    /// Color scaled by intensity
    pub strength: Vec3,
    /// Distance where attenuation starts
    pub falloff_start: f32,
    /// Distance where the light reaches zero
    pub falloff_end: f32,
    /// Half-angle of the spot cone in radians
    pub spot_angle: f32,
    /// Whether the light starts enabled
    pub enabled: bool,
    /// Shadow projection settings
    pub shadows: ShadowSettings,
}

impl LightDesc {
    fn base(kind: LightKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            position: Vec3::zeros(),
            direction: -Vec3::y(),
            up: Vec3::z(),
            strength: Vec3::repeat(1.0),
            falloff_start: 1.0,
            falloff_end: 50.0,
            spot_angle: 0.0,
            enabled: true,
            shadows: ShadowSettings::default(),
        }
    }

    /// Create a directional light (like the sun)
    pub fn directional(direction: Vec3, strength: Vec3) -> Self {
        Self {
            up: up_hint(&direction),
            direction,
            strength,
            ..Self::base(LightKind::Directional, "Directional Light")
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, strength: Vec3, falloff_start: f32, falloff_end: f32) -> Self {
        Self {
            position,
            strength,
            falloff_start,
            falloff_end,
            ..Self::base(LightKind::Point, "Point Light")
        }
    }

    /// Create a spot light with a cone half-angle in radians
    pub fn spot(position: Vec3, direction: Vec3, strength: Vec3, spot_angle: f32, falloff_end: f32) -> Self {
        Self {
            position,
            up: up_hint(&direction),
            direction,
            strength,
            spot_angle,
            falloff_end,
            ..Self::base(LightKind::Spot, "Spot Light")
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the up vector hint
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Set the falloff range
    pub fn with_falloff(mut self, start: f32, end: f32) -> Self {
        self.falloff_start = start;
        self.falloff_end = end;
        self
    }

    /// Set whether the light starts enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set shadow projection settings
    pub fn with_shadow_settings(mut self, shadows: ShadowSettings) -> Self {
        self.shadows = shadows;
        self
    }
}

/// +Y unless the direction is vertical, then +Z
fn up_hint(direction: &Vec3) -> Vec3 {
    if utils::is_parallel(direction, &Vec3::y()) {
        Vec3::z()
    } else {
        Vec3::y()
    }
}

fn validate_falloff(kind: LightKind, start: f32, end: f32, shadows: &ShadowSettings) -> Result<(), LightError> {
    if !(start.is_finite() && start >= 0.0) {
        return Err(LightError::InvalidParameter(format!("falloff_start must be >= 0, got {}", start)));
    }
    if !(end.is_finite() && end > start) {
        return Err(LightError::InvalidParameter(format!(
            "falloff_end ({}) must be greater than falloff_start ({})",
            end, start
        )));
    }
    if kind == LightKind::Spot && shadows.spot_near_plane >= end {
        return Err(LightError::InvalidParameter(format!(
            "falloff_end ({}) must exceed the spot near plane ({})",
            end, shadows.spot_near_plane
        )));
    }
    Ok(())
}

fn validate_spot_angle(kind: LightKind, angle: f32) -> Result<(), LightError> {
    if kind == LightKind::Spot && !(angle > 0.0 && angle < constants::HALF_PI) {
        return Err(LightError::InvalidParameter(format!(
            "spot_angle must be in (0, pi/2), got {}",
            angle
        )));
    }
    Ok(())
}

/// A light placed in the scene
///
/// Directional and spot lights own a device shadow resource. Hand it back with
/// [`Light::release`]; dropping a light that still holds one leaks it and logs
/// a warning.
#[derive(Debug)]
pub struct Light {
    object: GameObject,
    kind: LightKind,
    strength: Vec3,
    falloff_start: f32,
    falloff_end: f32,
    spot_angle: f32,
    enabled: bool,
    shadows: ShadowSettings,
    shadow_map: Option<ShadowMap>,
    projection: Option<ShadowProjection>,
    state: LightFrameState,
}

impl Light {
    /// Validate `desc` and build the light
    ///
    /// Directional and spot lights create their shadow map on `device`; a
    /// creation failure aborts construction. Point lights never touch the device.
    pub fn new(desc: LightDesc, device: &mut dyn GraphicsDevice) -> Result<Self, LightError> {
        validate_falloff(desc.kind, desc.falloff_start, desc.falloff_end, &desc.shadows)?;
        validate_spot_angle(desc.kind, desc.spot_angle)?;
        desc.shadows
            .validate()
            .map_err(|e| LightError::InvalidParameter(e.to_string()))?;

        let mut object = GameObject::new(desc.name.as_str());
        object.set_position(desc.position);
        if !object.set_orientation(desc.direction, desc.up) {
            return Err(LightError::InvalidParameter(format!(
                "direction {:?} is zero or parallel to up {:?}",
                desc.direction, desc.up
            )));
        }

        let shadow_map = if desc.kind.casts_shadows() {
            let map = ShadowMap::build_resource(device, SHADOW_MAP_SIZE).map_err(|source| {
                log::error!("Shadow map creation failed for light '{}': {}", desc.name, source);
                LightError::ResourceCreation {
                    light: desc.name.clone(),
                    source,
                }
            })?;
            Some(map)
        } else {
            None
        };

        log::info!(
            "Created {:?} light '{}' ({}) at {:?}",
            desc.kind,
            desc.name,
            object.component().id(),
            desc.position
        );

        Ok(Self {
            object,
            kind: desc.kind,
            strength: desc.strength,
            falloff_start: desc.falloff_start,
            falloff_end: desc.falloff_end,
            spot_angle: desc.spot_angle,
            enabled: desc.enabled,
            shadows: desc.shadows,
            shadow_map,
            projection: None,
            state: LightFrameState::Idle,
        })
    }

    /// Fill `out` with this frame's light record
    ///
    /// Shared fields are written first and the shadow fields cleared; lights
    /// that cast shadows then derive and cache their shadow projection and
    /// write the shadow transform.
    pub fn set_light_data(&mut self, out: &mut LightData) {
        self.write_common(out);

        self.projection = compute_shadow(self.kind, &self.shadow_params());
        if let Some(projection) = &self.projection {
            out.has_shadow = 1;
            out.shadow_transform = projection.shadow_transform.into();
        }

        self.state = LightFrameState::DataRequested;
    }

    fn write_common(&self, out: &mut LightData) {
        *out = LightData {
            position: self.object.position().into(),
            falloff_start: self.falloff_start,
            direction: self.object.look().into(),
            falloff_end: self.falloff_end,
            strength: self.strength.into(),
            spot_angle: self.spot_angle,
            kind: self.kind.gpu_tag(),
            enabled: u32::from(self.enabled),
            has_shadow: 0,
            _padding: 0,
            shadow_transform: [[0.0; 4]; 4],
        };
    }

    fn shadow_params(&self) -> ShadowParams {
        ShadowParams {
            position: self.object.position(),
            direction: self.object.look(),
            up: self.object.up(),
            falloff_start: self.falloff_start,
            falloff_end: self.falloff_end,
            spot_angle: self.spot_angle,
            settings: self.shadows,
        }
    }

    /// Render shadow casters into this light's shadow map
    ///
    /// Uses the frustum cached by this frame's [`set_light_data`](Self::set_light_data).
    /// Returns the number of casters drawn.
    pub fn render_scene_to_shadow_map(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        casters: &[ShadowCaster],
    ) -> Result<usize, LightError> {
        let name = self.object.component().name();
        let map = self
            .shadow_map
            .as_ref()
            .ok_or_else(|| LightError::NoShadowMap(name.to_string()))?;

        let frustum = match (&self.projection, self.state) {
            (Some(projection), LightFrameState::DataRequested | LightFrameState::ShadowReady) => &projection.frustum,
            _ => {
                log::warn!("Skipping shadow pass for '{}': light data not refreshed this frame", name);
                return Err(LightError::StaleShadowData(name.to_string()));
            }
        };

        let draws = map.render_scene(encoder, frustum, casters)?;
        self.state = LightFrameState::ShadowReady;
        Ok(draws)
    }

    /// Start a new frame; cached shadow data becomes stale
    pub fn begin_frame(&mut self) {
        self.state = LightFrameState::Idle;
    }

    /// Current per-frame state
    pub fn frame_state(&self) -> LightFrameState {
        self.state
    }

    /// Set color scaled by intensity
    pub fn set_strength(&mut self, strength: Vec3) {
        self.strength = strength;
        self.object.component().mark_dirty();
    }

    /// Set the falloff range
    pub fn set_falloff(&mut self, start: f32, end: f32) -> Result<(), LightError> {
        validate_falloff(self.kind, start, end, &self.shadows)?;
        self.falloff_start = start;
        self.falloff_end = end;
        self.object.component().mark_dirty();
        Ok(())
    }

    /// Set the spot cone half-angle in radians
    pub fn set_spot_angle(&mut self, angle: f32) -> Result<(), LightError> {
        validate_spot_angle(self.kind, angle)?;
        self.spot_angle = angle;
        self.object.component().mark_dirty();
        Ok(())
    }

    /// Enable or disable the light
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.object.component().mark_dirty();
    }

    /// Move the light
    pub fn set_position(&mut self, position: Vec3) {
        self.object.set_position(position);
    }

    /// Point the light along `direction`
    pub fn set_direction(&mut self, direction: Vec3) -> Result<(), LightError> {
        let up = up_hint(&direction);
        if self.object.set_orientation(direction, up) {
            Ok(())
        } else {
            Err(LightError::InvalidParameter(format!("degenerate direction {:?}", direction)))
        }
    }

    /// Light type
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Identity and sync state
    pub fn component(&self) -> &Component {
        self.object.component()
    }

    /// Spatial state
    pub fn object(&self) -> &GameObject {
        &self.object
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.object.component().name()
    }

    /// Color scaled by intensity
    pub fn strength(&self) -> Vec3 {
        self.strength
    }

    /// Distance where attenuation starts
    pub fn falloff_start(&self) -> f32 {
        self.falloff_start
    }

    /// Distance where the light reaches zero
    pub fn falloff_end(&self) -> f32 {
        self.falloff_end
    }

    /// Spot cone half-angle in radians
    pub fn spot_angle(&self) -> f32 {
        self.spot_angle
    }

    /// Whether the light contributes
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Owned shadow map, `None` for point lights
    pub fn shadow_map(&self) -> Option<&ShadowMap> {
        self.shadow_map.as_ref()
    }

    /// Shadow data from the most recent `set_light_data`
    pub fn shadow_projection(&self) -> Option<&ShadowProjection> {
        self.projection.as_ref()
    }

    /// Light camera view matrix
    pub fn view(&self) -> Option<&Mat4> {
        self.projection.as_ref().map(|p| &p.view)
    }

    /// Light camera projection matrix
    pub fn proj(&self) -> Option<&Mat4> {
        self.projection.as_ref().map(|p| &p.proj)
    }

    /// World-space shadow culling volume
    pub fn frustum(&self) -> Option<&Frustum> {
        self.projection.as_ref().map(|p| &p.frustum)
    }

    /// Free the shadow map
    pub fn release(mut self, device: &mut dyn GraphicsDevice) {
        if let Some(map) = self.shadow_map.take() {
            log::debug!("Releasing shadow map of light '{}'", self.object.component().name());
            map.release(device);
        }
    }
}

impl Drop for Light {
    fn drop(&mut self) {
        if let Some(map) = &self.shadow_map {
            log::warn!(
                "Light '{}' dropped without release, leaking shadow resource {:?}",
                self.object.component().name(),
                map.handle()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{project_point, Point3};
    use crate::render::backends::{HeadlessDevice, RecordedCommand, RecordingEncoder};
    use crate::scene::bounds::AABB;
    use approx::assert_relative_eq;

    fn sun() -> LightDesc {
        LightDesc::directional(Vec3::new(0.0, -1.0, -0.2), Vec3::new(1.0, 0.95, 0.9))
            .with_name("Sun")
            .with_position(Vec3::new(0.0, 20.0, 4.0))
            .with_falloff(1.0, 40.0)
    }

    #[test]
    fn test_light_data_layout() {
        assert_eq!(std::mem::size_of::<LightData>(), 128);
    }

    #[test]
    fn test_directional_shadow_transform_maps_target_into_unit_cube() {
        let mut device = HeadlessDevice::new();
        let mut light = Light::new(sun(), &mut device).expect("sun");
        let mut data = LightData::default();
        light.set_light_data(&mut data);

        assert_eq!(data.has_shadow, 1);
        assert_eq!(data.kind, LightKind::Directional.gpu_tag());
        assert_relative_eq!(data.falloff_end, 40.0);

        let target = light.shadow_projection().expect("projection").target;
        let uvw = project_point(&Mat4::from(data.shadow_transform), &Point3::from(target));
        for c in [uvw.x, uvw.y, uvw.z] {
            assert!((-1e-5..=1.0 + 1e-5).contains(&c), "coordinate {} outside [0, 1]", c);
        }
        assert!(light.view().is_some() && light.proj().is_some());
    }

    #[test]
    fn test_point_light_never_owns_shadow_map() {
        let mut device = HeadlessDevice::with_resource_budget(0);
        let mut light = Light::new(
            LightDesc::point(Vec3::new(1.0, 2.0, 3.0), Vec3::repeat(2.0), 0.5, 8.0),
            &mut device,
        )
        .expect("point light needs no resources");
        assert_eq!(device.created_resources(), 0);
        assert!(light.shadow_map().is_none());

        let mut data = LightData::default();
        data.has_shadow = 1;
        data.shadow_transform = Mat4::identity().into();
        light.set_light_data(&mut data);

        assert_eq!(data.has_shadow, 0);
        assert_eq!(data.shadow_transform, [[0.0; 4]; 4]);
        assert_eq!(data.position, [1.0, 2.0, 3.0]);
        assert!(light.view().is_none());

        let mut encoder = RecordingEncoder::new();
        assert!(matches!(
            light.render_scene_to_shadow_map(&mut encoder, &[]),
            Err(LightError::NoShadowMap(_))
        ));
    }

    #[test]
    fn test_spot_far_plane_follows_falloff_end() {
        let mut device = HeadlessDevice::new();
        let desc = LightDesc::spot(Vec3::new(0.0, 5.0, 0.0), -Vec3::y(), Vec3::repeat(1.0), 0.4, 10.0);
        let mut light = Light::new(desc, &mut device).expect("spot");
        let mut data = LightData::default();

        light.set_light_data(&mut data);
        let near_far = light.shadow_projection().map(|p| (p.far, p.frustum.bounding_box().volume()));
        let (far_short, volume_short) = near_far.expect("projection");

        light.set_falloff(1.0, 30.0).expect("falloff");
        light.set_light_data(&mut data);
        let projection = light.shadow_projection().expect("projection");

        assert_relative_eq!(projection.far / far_short, 3.0);
        assert_relative_eq!(projection.near, 0.5);
        assert!(projection.frustum.bounding_box().volume() > volume_short);
    }

    #[test]
    fn test_resource_failure_aborts_construction() {
        let mut device = HeadlessDevice::with_resource_budget(0);
        let result = Light::new(sun(), &mut device);
        assert!(matches!(
            result,
            Err(LightError::ResourceCreation { source: RenderError::ResourceCreationFailed(_), .. })
        ));
    }

    #[test]
    fn test_stale_data_rejected_until_refreshed() {
        let mut device = HeadlessDevice::new();
        let mut encoder = RecordingEncoder::new();
        let mut light = Light::new(sun(), &mut device).expect("sun");
        let casters = [ShadowCaster::new(AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))];

        assert!(matches!(
            light.render_scene_to_shadow_map(&mut encoder, &casters),
            Err(LightError::StaleShadowData(_))
        ));
        assert!(encoder.commands().is_empty());

        let mut data = LightData::default();
        light.set_light_data(&mut data);
        assert_eq!(light.frame_state(), LightFrameState::DataRequested);
        assert_eq!(light.render_scene_to_shadow_map(&mut encoder, &casters).expect("shadow pass"), 1);
        assert_eq!(light.frame_state(), LightFrameState::ShadowReady);
        assert!(matches!(encoder.commands()[0], RecordedCommand::ShadowPass { .. }));

        light.begin_frame();
        assert!(matches!(
            light.render_scene_to_shadow_map(&mut encoder, &casters),
            Err(LightError::StaleShadowData(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut device = HeadlessDevice::new();
        let bad_range = LightDesc::point(Vec3::zeros(), Vec3::repeat(1.0), 5.0, 5.0);
        assert!(matches!(Light::new(bad_range, &mut device), Err(LightError::InvalidParameter(_))));

        let wide_cone = LightDesc::spot(Vec3::zeros(), -Vec3::z(), Vec3::repeat(1.0), constants::HALF_PI, 10.0);
        assert!(matches!(Light::new(wide_cone, &mut device), Err(LightError::InvalidParameter(_))));

        let short_spot = LightDesc::spot(Vec3::zeros(), -Vec3::z(), Vec3::repeat(1.0), 0.5, 0.4).with_falloff(0.0, 0.4);
        assert!(matches!(Light::new(short_spot, &mut device), Err(LightError::InvalidParameter(_))));

        let no_direction = LightDesc::directional(Vec3::zeros(), Vec3::repeat(1.0));
        assert!(matches!(Light::new(no_direction, &mut device), Err(LightError::InvalidParameter(_))));

        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut device = HeadlessDevice::new();
        let mut light = Light::new(sun(), &mut device).expect("sun");
        while light.component().needs_sync() {
            light.component().tick();
        }

        light.set_strength(Vec3::repeat(0.5));
        assert!(light.component().needs_sync());
        while light.component().needs_sync() {
            light.component().tick();
        }

        assert!(light.set_falloff(10.0, 2.0).is_err());
        assert!(!light.component().needs_sync());
        light.set_direction(Vec3::new(1.0, -1.0, 0.0)).expect("direction");
        assert!(light.component().needs_sync());
    }

    #[test]
    fn test_release_frees_shadow_map() {
        let mut device = HeadlessDevice::new();
        let light = Light::new(sun(), &mut device).expect("sun");
        assert_eq!(device.live_resources(), 1);
        light.release(&mut device);
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_dropping_unreleased_light_leaks_resource() {
        let mut device = HeadlessDevice::new();
        let light = Light::new(sun(), &mut device).expect("sun");
        let handle = light.shadow_map().map(ShadowMap::handle).expect("sun owns a shadow map");
        drop(light);
        assert!(device.is_live(handle));
        assert_eq!(device.live_resources(), 1);

        let bulb = Light::new(LightDesc::point(Vec3::zeros(), Vec3::repeat(1.0), 0.5, 4.0), &mut device).expect("bulb");
        drop(bulb);
        assert_eq!(device.live_resources(), 1);
    }
}
