//! Build-time rendering limits
//!
//! These values size GPU-visible arrays and per-frame rings, so they are fixed
//! at compile time rather than read from configuration.

/// Number of per-frame resource copies the CPU may write while the GPU reads
pub const FRAMES_IN_FLIGHT: usize = 3;

/// Number of swap chain images
pub const SWAP_CHAIN_BUFFER_COUNT: usize = 2;

/// Width and height of every shadow map in texels
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Number of texture bindings available to a material
pub const TEXTURE_SLOT_COUNT: usize = 16;

/// Maximum number of lights uploaded per frame
pub const MAX_LIGHTS: usize = 16;
