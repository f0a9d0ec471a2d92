//! Scene objects
//!
//! Component identity and dirty tracking, the spatial state shared by all
//! placed objects, and the bounding volumes used for culling.

pub mod bounds;
pub mod component;
pub mod game_object;

pub use bounds::{Frustum, Plane, AABB};
pub use component::{next_component_id, Component, ComponentId};
pub use game_object::{CollisionType, GameObject};
