//! Headless backend
//!
//! `HeadlessDevice` hands out shadow resource handles without touching a GPU and
//! can be given a resource budget to simulate allocation failure.
//! `RecordingEncoder` stores every recorded command in order.

use std::collections::HashSet;

use crate::render::api::{BackendResult, CommandEncoder, GraphicsDevice, ShadowMapHandle};
use crate::render::RenderError;
use crate::scene::bounds::{Frustum, AABB};

/// Device that tracks resources in memory
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u64,
    live: HashSet<ShadowMapHandle>,
    budget: Option<usize>,
}

impl HeadlessDevice {
    /// Create a device with unlimited resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that fails once `budget` resources are alive
    pub fn with_resource_budget(budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    /// Number of shadow resources currently alive
    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    /// Whether `handle` refers to a live resource
    pub fn is_live(&self, handle: ShadowMapHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Total number of resources ever created
    pub fn created_resources(&self) -> u64 {
        self.next_handle
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_shadow_resource(&mut self, width: u32, height: u32) -> BackendResult<ShadowMapHandle> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "invalid shadow resource size {}x{}",
                width, height
            )));
        }
        if let Some(budget) = self.budget {
            if self.live.len() >= budget {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "resource budget of {} exhausted",
                    budget
                )));
            }
        }

        let handle = ShadowMapHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        log::trace!("Headless device created shadow resource {:?} ({}x{})", handle, width, height);
        Ok(handle)
    }

    fn destroy_shadow_resource(&mut self, handle: ShadowMapHandle) {
        if !self.live.remove(&handle) {
            log::warn!("Headless device asked to destroy unknown resource {:?}", handle);
        }
    }
}

/// A command captured by [`RecordingEncoder`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// Shadow pass start
    ShadowPass {
        /// Depth target
        target: ShadowMapHandle,
        /// World-space bounds of the culling frustum
        bounds: AABB,
    },
    /// Draw call
    Draw {
        /// Instances drawn
        instance_count: u32,
        /// Indexed or plain draw
        indexed: bool,
    },
}

/// Encoder that records commands into a list
#[derive(Debug, Default)]
pub struct RecordingEncoder {
    commands: Vec<RecordedCommand>,
    fail: bool,
}

impl RecordingEncoder {
    /// Create an empty encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent record call fail (or succeed again)
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Number of shadow passes recorded
    pub fn shadow_pass_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::ShadowPass { .. }))
            .count()
    }

    /// Number of draws recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Draw { .. }))
            .count()
    }

    /// Drop all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn check(&self) -> BackendResult<()> {
        if self.fail {
            Err(RenderError::RenderingFailed("encoder rejected command".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CommandEncoder for RecordingEncoder {
    fn record_shadow_pass(&mut self, target: ShadowMapHandle, frustum: &Frustum) -> BackendResult<()> {
        self.check()?;
        self.commands.push(RecordedCommand::ShadowPass {
            target,
            bounds: frustum.bounding_box(),
        });
        Ok(())
    }

    fn record_draw(&mut self, instance_count: u32, indexed: bool) -> BackendResult<()> {
        self.check()?;
        self.commands.push(RecordedCommand::Draw { instance_count, indexed });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_budget() {
        let mut device = HeadlessDevice::with_resource_budget(1);
        let first = device.create_shadow_resource(64, 64).expect("first resource");
        assert!(matches!(
            device.create_shadow_resource(64, 64),
            Err(RenderError::ResourceCreationFailed(_))
        ));

        device.destroy_shadow_resource(first);
        assert!(device.create_shadow_resource(64, 64).is_ok());
        assert_eq!(device.live_resources(), 1);
        assert_eq!(device.created_resources(), 2);
    }

    #[test]
    fn test_zero_sized_resource_rejected() {
        let mut device = HeadlessDevice::new();
        assert!(device.create_shadow_resource(0, 128).is_err());
    }

    #[test]
    fn test_encoder_records_in_order() {
        let mut encoder = RecordingEncoder::new();
        let frustum = Frustum::orthographic(2.0, 2.0, 0.1, 10.0);
        encoder.record_shadow_pass(ShadowMapHandle(7), &frustum).expect("shadow pass");
        encoder.record_draw(3, true).expect("draw");

        assert_eq!(encoder.shadow_pass_count(), 1);
        assert_eq!(
            encoder.commands()[1],
            RecordedCommand::Draw { instance_count: 3, indexed: true }
        );

        encoder.set_failing(true);
        assert!(encoder.record_draw(1, false).is_err());
        assert_eq!(encoder.draw_count(), 1);
    }
}
