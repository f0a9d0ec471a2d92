//! GameObject: spatial state shared by everything placed in a scene
//!
//! A game object owns a [`Component`] plus a position and an orthonormal
//! look/up frame. Every mutation marks the component dirty so per-frame GPU
//! buffers are rewritten.

use crate::foundation::math::{utils, Vec3};
use crate::scene::component::Component;

/// Collision volume used for the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionType {
    /// Not collidable
    #[default]
    None,
    /// Axis-aligned bounding box
    Aabb,
    /// Bounding sphere
    Sphere,
    /// Exact triangle mesh
    Mesh,
}

/// Object with identity, transform frame, visibility and collision type
#[derive(Debug)]
pub struct GameObject {
    component: Component,
    position: Vec3,
    look: Vec3,
    up: Vec3,
    visible: bool,
    collision: CollisionType,
}

impl GameObject {
    /// Create an object at the origin looking down -Z with +Y up
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            component: Component::new(name),
            position: Vec3::zeros(),
            look: -Vec3::z(),
            up: Vec3::y(),
            visible: true,
            collision: CollisionType::None,
        }
    }

    /// Identity and sync state
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit forward vector
    pub fn look(&self) -> Vec3 {
        self.look
    }

    /// Unit up vector, orthogonal to `look`
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.look.cross(&self.up)
    }

    /// Whether the object is rendered
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Collision volume type
    pub fn collision(&self) -> CollisionType {
        self.collision
    }

    /// Move the object
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.component.mark_dirty();
    }

    /// Point the object along `look`, keeping the current up vector as a hint
    ///
    /// Returns `false` and leaves the frame unchanged when `look` is zero or
    /// parallel to the current up vector.
    pub fn set_look(&mut self, look: Vec3) -> bool {
        self.set_orientation(look, self.up)
    }

    /// Set forward and up together
    ///
    /// `up` is re-orthogonalised against `look`. Returns `false` and leaves the
    /// frame unchanged for degenerate input.
    pub fn set_orientation(&mut self, look: Vec3, up: Vec3) -> bool {
        if look.norm_squared() <= f32::EPSILON || up.norm_squared() <= f32::EPSILON || utils::is_parallel(&look, &up) {
            log::warn!(
                "Rejected degenerate orientation for '{}': look={:?} up={:?}",
                self.component.name(),
                look,
                up
            );
            return false;
        }

        let look = look.normalize();
        let right = look.cross(&up).normalize();
        self.look = look;
        self.up = right.cross(&look);
        self.component.mark_dirty();
        true
    }

    /// Turn the object to face `target`
    pub fn look_at(&mut self, target: Vec3) -> bool {
        self.set_look(target - self.position)
    }

    /// Show or hide the object
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.component.mark_dirty();
    }

    /// Change the collision volume type
    pub fn set_collision(&mut self, collision: CollisionType) {
        self.collision = collision;
        self.component.mark_dirty();
    }
}
