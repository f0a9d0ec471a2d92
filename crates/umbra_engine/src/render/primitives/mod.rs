//! Core primitive types for rendering
//!
//! Vertex and mesh data shared by the asset pipeline and the renderer.

pub mod mesh;

pub use mesh::{Mesh, Vertex};
