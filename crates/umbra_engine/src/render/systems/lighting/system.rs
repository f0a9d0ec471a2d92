//! Lighting system
//!
//! Owns every light in the scene and packs them into the per-frame lighting
//! buffer. A light's slot in the current frame resource is rewritten only when
//! the light still needs syncing or the slot previously held another light.

use bytemuck::{Pod, Zeroable};

use crate::core::config::LightingConfig;
use crate::foundation::collections::{HandleMap, LightKey};
use crate::render::api::{CommandEncoder, FrameResources, GraphicsDevice};
use crate::render::constants::MAX_LIGHTS;
use crate::render::shadow_map::ShadowCaster;
use crate::render::systems::lighting::light::{Light, LightData, LightError};
use crate::scene::component::ComponentId;

/// Lighting buffer header
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LightingHeader {
    /// Ambient light color and intensity [R, G, B, intensity]
    pub ambient: [f32; 4],
    /// Number of valid entries in `lights`
    pub light_count: u32,
    /// Padding for std140 alignment
    pub _padding: [u32; 3],
}

/// GPU-visible lighting buffer for one frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingBuffer {
    /// Ambient term and light count
    pub header: LightingHeader,
    /// Packed light records
    pub lights: [LightData; MAX_LIGHTS],
}

impl Default for LightingBuffer {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// One frame resource: the lighting buffer plus which light wrote each slot
#[derive(Debug, Clone, Default)]
pub struct LightingFrame {
    /// Data uploaded to the GPU
    pub buffer: LightingBuffer,
    /// Component id of the light that last wrote each slot
    pub owners: [Option<ComponentId>; MAX_LIGHTS],
}

/// Work done by one [`LightingSystem::update_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameLightingStats {
    /// Slots rewritten this frame
    pub written: usize,
    /// Slots left untouched because they were already up to date
    pub skipped: usize,
    /// Enabled lights with a shadow transform this frame
    pub shadow_casters: usize,
}

/// Registry of scene lights
#[derive(Debug)]
pub struct LightingSystem {
    lights: HandleMap<LightKey, Light>,
    order: Vec<LightKey>,
    ambient: [f32; 4],
}

impl LightingSystem {
    /// Create an empty system with the configured ambient term
    pub fn new(config: &LightingConfig) -> Self {
        let [r, g, b] = config.ambient_color;
        Self {
            lights: HandleMap::with_key(),
            order: Vec::new(),
            ambient: [r, g, b, config.ambient_intensity],
        }
    }

    /// Set the ambient color and intensity
    pub fn set_ambient(&mut self, color: [f32; 3], intensity: f32) {
        self.ambient = [color[0], color[1], color[2], intensity];
    }

    /// Register a light; lights beyond `MAX_LIGHTS` are kept but not uploaded
    pub fn add_light(&mut self, light: Light) -> LightKey {
        if self.order.len() >= MAX_LIGHTS {
            log::warn!(
                "Light '{}' exceeds the limit of {} lights and will not be rendered",
                light.name(),
                MAX_LIGHTS
            );
        }
        let key = self.lights.insert(light);
        self.order.push(key);
        key
    }

    /// Unregister a light, handing it back so its resources can be released
    pub fn remove_light(&mut self, key: LightKey) -> Option<Light> {
        let light = self.lights.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(light)
    }

    /// Look up a light
    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key)
    }

    /// Look up a light mutably
    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key)
    }

    /// Number of registered lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether no lights are registered
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Lights in slot order
    pub fn iter(&self) -> impl Iterator<Item = (LightKey, &Light)> {
        self.order.iter().filter_map(|&key| self.lights.get(key).map(|light| (key, light)))
    }

    /// Produce this frame's light data into the current frame resource
    ///
    /// Every uploaded light refreshes its shadow state; only stale slots are
    /// copied into the frame resource. All light components are ticked
    /// afterwards, so call this exactly once per frame before advancing the ring.
    pub fn update_frame(&mut self, frames: &mut FrameResources<LightingFrame>) -> FrameLightingStats {
        let frame = frames.current_mut();
        let mut stats = FrameLightingStats::default();

        for light in self.lights.values_mut() {
            light.begin_frame();
        }

        let count = self.order.len().min(MAX_LIGHTS);
        for (slot, key) in self.order.iter().take(MAX_LIGHTS).enumerate() {
            let Some(light) = self.lights.get_mut(*key) else {
                continue;
            };

            let mut data = LightData::default();
            light.set_light_data(&mut data);
            if data.has_shadow != 0 && light.is_enabled() {
                stats.shadow_casters += 1;
            }

            let owner = Some(light.component().id());
            if light.component().needs_sync() || frame.owners[slot] != owner {
                frame.buffer.lights[slot] = data;
                frame.owners[slot] = owner;
                stats.written += 1;
            } else {
                stats.skipped += 1;
            }
        }

        for slot in count..MAX_LIGHTS {
            if frame.owners[slot].take().is_some() {
                frame.buffer.lights[slot] = LightData::default();
            }
        }

        frame.buffer.header = LightingHeader {
            ambient: self.ambient,
            light_count: count as u32,
            _padding: [0; 3],
        };

        for light in self.lights.values() {
            light.component().tick();
        }

        log::trace!(
            "Lighting frame {} (slot {}): {} written, {} skipped, {} shadow casters",
            frames.frame_number(),
            frames.current_index(),
            stats.written,
            stats.skipped,
            stats.shadow_casters
        );
        stats
    }

    /// Render the shadow map of every enabled shadow-casting light
    ///
    /// Returns the total number of caster draws recorded.
    pub fn render_shadows(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        casters: &[ShadowCaster],
    ) -> Result<usize, LightError> {
        let mut draws = 0;
        for key in self.order.iter().take(MAX_LIGHTS) {
            if let Some(light) = self.lights.get_mut(*key) {
                if light.is_enabled() && light.kind().casts_shadows() {
                    draws += light.render_scene_to_shadow_map(encoder, casters)?;
                }
            }
        }
        Ok(draws)
    }

    /// Release every light's shadow map
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        for (_, light) in self.lights {
            light.release(device);
        }
    }
}
