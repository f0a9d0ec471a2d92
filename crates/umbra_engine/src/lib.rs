//! # Umbra Engine
//!
//! Lighting core of a real-time 3D renderer: scene lights with shadow-map
//! generation, per-component frame-dirty tracking across in-flight frame
//! resources, timers, and an OBJ to native mesh converter.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use umbra_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut device = HeadlessDevice::new();
//!     let mut encoder = RecordingEncoder::new();
//!
//!     let mut lighting = LightingSystem::new(&config.lighting);
//!     let sun = LightDesc::directional(Vec3::new(0.3, -1.0, 0.2), Vec3::repeat(1.0))
//!         .with_position(Vec3::new(0.0, 30.0, 0.0));
//!     lighting.add_light(Light::new(sun, &mut device)?);
//!
//!     let mut frames: FrameResources<LightingFrame> = FrameResources::default();
//!     lighting.update_frame(&mut frames);
//!     lighting.render_shadows(&mut encoder, &[])?;
//!     frames.advance();
//!
//!     lighting.release(&mut device);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;

pub mod assets;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetLoader, ObjLoader},
        core::config::{ApplicationConfig, Config, LightingConfig, ShadowSettings},
        foundation::{
            collections::LightKey,
            math::{Mat4, Mat4Ext, Vec3},
            time::{FrameClock, Stopwatch, Timer, TimerHandle},
        },
        render::{
            backends::{HeadlessDevice, RecordingEncoder},
            constants::{FRAMES_IN_FLIGHT, MAX_LIGHTS, SHADOW_MAP_SIZE},
            CommandEncoder, FrameResources, GraphicsDevice, Light, LightData, LightDesc, LightError, LightKind,
            LightingFrame, LightingSystem, Mesh, RenderError, ShadowCaster, Vertex,
        },
        scene::{Component, ComponentId, Frustum, GameObject, AABB},
    };
}
