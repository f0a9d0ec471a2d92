//! Asset pipeline
//!
//! Wavefront OBJ loading and conversion into the engine's native mesh format.

pub mod converter;
pub mod obj_loader;

pub use converter::{
    decode_native_mesh, encode_native_mesh, AssetError, AssetLoader, MeshStats, NATIVE_MESH_MAGIC,
    NATIVE_MESH_VERSION,
};
pub use obj_loader::{ObjError, ObjLoader};
