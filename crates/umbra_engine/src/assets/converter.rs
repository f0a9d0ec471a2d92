//! OBJ to native mesh conversion
//!
//! Native mesh layout (all integers and floats little-endian):
//!
//! | bytes | content |
//! |---|---|
//! | 4 | magic `UMSH` |
//! | 4 | format version (`1`) |
//! | 4 | vertex count |
//! | 4 | index count |
//! | 32 × vertex count | position, normal, tex_coord as f32 |
//! | 4 × index count | u32 indices |

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use thiserror::Error;

use crate::assets::obj_loader::{ObjError, ObjLoader};
use crate::core::config::AssetConfig;
use crate::render::{Mesh, Vertex};

/// File signature of native meshes
pub const NATIVE_MESH_MAGIC: [u8; 4] = *b"UMSH";
/// Current native mesh format version
pub const NATIVE_MESH_VERSION: u32 = 1;

const HEADER_SIZE: usize = 16;
const FLOATS_PER_VERTEX: usize = std::mem::size_of::<Vertex>() / 4;

/// Asset pipeline errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error during asset loading or writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source model could not be parsed
    #[error("OBJ error: {0}")]
    Obj(#[from] ObjError),

    /// Native mesh file is truncated or corrupt
    #[error("Invalid native mesh: {0}")]
    InvalidNativeMesh(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Summary of a successful conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshStats {
    /// Vertices written
    pub vertices: usize,
    /// Triangles written
    pub triangles: usize,
    /// Size of the output file
    pub bytes: usize,
}

/// Converts source models into the engine's native mesh format
#[derive(Debug, Clone)]
pub struct AssetLoader {
    extension: String,
    generate_missing_normals: bool,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::from_config(&AssetConfig::default())
    }
}

impl AssetLoader {
    /// Create a loader from asset settings
    pub fn from_config(config: &AssetConfig) -> Self {
        Self {
            extension: config.native_mesh_extension.clone(),
            generate_missing_normals: config.generate_missing_normals,
        }
    }

    /// Output path used by [`convert_obj`](Self::convert_obj): same stem, native extension
    pub fn native_path(&self, source: &Path) -> PathBuf {
        source.with_extension(&self.extension)
    }

    /// Convert an OBJ file to a native mesh next to it
    ///
    /// Returns `false` if conversion failed; no output file is left behind in
    /// that case. The reason is logged.
    pub fn convert_obj(&self, source: impl AsRef<Path>) -> bool {
        let source = source.as_ref();
        let dest = self.native_path(source);
        match self.try_convert_obj(source, &dest) {
            Ok(stats) => {
                log::info!(
                    "Converted {} -> {} ({} vertices, {} triangles)",
                    source.display(),
                    dest.display(),
                    stats.vertices,
                    stats.triangles
                );
                true
            }
            Err(e) => {
                log::error!("Failed to convert {}: {}", source.display(), e);
                false
            }
        }
    }

    /// Convert an OBJ file, writing the native mesh to `dest`
    pub fn try_convert_obj(&self, source: &Path, dest: &Path) -> Result<MeshStats, AssetError> {
        let is_obj = source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
        if !is_obj {
            return Err(AssetError::UnsupportedFormat(source.display().to_string()));
        }

        let mesh = ObjLoader::load_obj_with(source, self.generate_missing_normals)?;
        let bytes = encode_native_mesh(&mesh);

        // Write-then-rename so a failed conversion never leaves a partial file
        let staging = dest.with_extension("partial");
        let written = fs::File::create(&staging).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&staging, dest)) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        Ok(MeshStats {
            vertices: mesh.vertices.len(),
            triangles: mesh.triangle_count(),
            bytes: bytes.len(),
        })
    }

    /// Read a native mesh file
    pub fn load_native_mesh(path: impl AsRef<Path>) -> Result<Mesh, AssetError> {
        decode_native_mesh(&fs::read(path)?)
    }
}

/// Serialize a mesh into the native format
pub fn encode_native_mesh(mesh: &Mesh) -> Vec<u8> {
    let floats: &[f32] = bytemuck::cast_slice(&mesh.vertices);
    let mut bytes = Vec::with_capacity(HEADER_SIZE + floats.len() * 4 + mesh.indices.len() * 4);

    bytes.extend_from_slice(&NATIVE_MESH_MAGIC);
    bytes.extend_from_slice(&NATIVE_MESH_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(mesh.vertices.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(mesh.indices.len() as u32).to_le_bytes());
    for value in floats {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in &mesh.indices {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Parse a native mesh
pub fn decode_native_mesh(bytes: &[u8]) -> Result<Mesh, AssetError> {
    if bytes.len() < HEADER_SIZE {
        return Err(AssetError::InvalidNativeMesh(format!("{} byte file has no header", bytes.len())));
    }
    if bytes[..4] != NATIVE_MESH_MAGIC {
        return Err(AssetError::InvalidNativeMesh("bad magic".to_string()));
    }
    let version = read_u32(bytes, 4);
    if version != NATIVE_MESH_VERSION {
        return Err(AssetError::InvalidNativeMesh(format!("unsupported version {}", version)));
    }

    let vertex_count = read_u32(bytes, 8) as usize;
    let index_count = read_u32(bytes, 12) as usize;
    let vertex_bytes = vertex_count * FLOATS_PER_VERTEX * 4;
    let expected = HEADER_SIZE + vertex_bytes + index_count * 4;
    if bytes.len() != expected {
        return Err(AssetError::InvalidNativeMesh(format!(
            "expected {} bytes for {} vertices and {} indices, found {}",
            expected,
            vertex_count,
            index_count,
            bytes.len()
        )));
    }

    let (vertex_data, index_data) = bytes[HEADER_SIZE..].split_at(vertex_bytes);
    let mut vertices = vec![Vertex::zeroed(); vertex_count];
    let floats: &mut [f32] = bytemuck::cast_slice_mut(&mut vertices);
    for (dst, chunk) in floats.iter_mut().zip(vertex_data.chunks_exact(4)) {
        *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let indices = index_data
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mesh = Mesh::new(vertices, indices);
    if !mesh.is_valid() {
        return Err(AssetError::InvalidNativeMesh("index out of range or partial triangle".to_string()));
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("umbra_assets_{}_{}", std::process::id(), name));
        fs::create_dir_all(&dir).expect("temp dir");
        dir
    }

    #[test]
    fn test_obj_to_native_round_trip() {
        let dir = temp_dir("round_trip");
        let source = dir.join("tri.obj");
        fs::write(&source, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n").expect("write obj");

        let loader = AssetLoader::default();
        assert!(loader.convert_obj(&source));

        let native = loader.native_path(&source);
        assert_eq!(native.extension().and_then(|e| e.to_str()), Some("umesh"));
        let mesh = AssetLoader::load_native_mesh(&native).expect("load native");
        let original = ObjLoader::load_obj(&source).expect("load obj");
        assert_eq!(mesh, original);
        assert_eq!(fs::metadata(&native).expect("metadata").len() as usize, HEADER_SIZE + 3 * 32 + 3 * 4);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_conversion_leaves_no_output() {
        let dir = temp_dir("failure");
        let source = dir.join("broken.obj");
        fs::write(&source, "v 0 0 0\nf 1 2 3\n").expect("write obj");

        let loader = AssetLoader::default();
        assert!(!loader.convert_obj(&source));
        assert!(!loader.native_path(&source).exists());
        assert!(!loader.convert_obj(dir.join("missing.obj")));
        assert!(matches!(
            loader.try_convert_obj(&dir.join("model.fbx"), &dir.join("model.umesh")),
            Err(AssetError::UnsupportedFormat(_))
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_native_mesh_rejected() {
        let mut bytes = encode_native_mesh(&Mesh::cube());
        assert_eq!(decode_native_mesh(&bytes).expect("cube"), Mesh::cube());

        bytes.truncate(bytes.len() - 1);
        assert!(matches!(decode_native_mesh(&bytes), Err(AssetError::InvalidNativeMesh(_))));

        let mut bad_magic = encode_native_mesh(&Mesh::cube());
        bad_magic[0] = b'X';
        assert!(matches!(decode_native_mesh(&bad_magic), Err(AssetError::InvalidNativeMesh(_))));

        let mut bad_index = encode_native_mesh(&Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 2]));
        let last = bad_index.len() - 4;
        bad_index[last..].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(decode_native_mesh(&bad_index), Err(AssetError::InvalidNativeMesh(_))));
    }
}
