//! OBJ file loader for 3D models
//!
//! Supports positions, texture coordinates and normals, polygon faces (fan
//! triangulated) and negative indices relative to the end of each list.
//! Identical `position/uv/normal` triples share one vertex. Files without
//! normals can get smooth normals averaged from adjacent faces.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::SplitWhitespace;

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::{Mesh, Vertex};

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed number or index
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Structurally invalid file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Stateless OBJ parser
pub struct ObjLoader;

/// Face corner: position, optional uv, optional normal (0-based)
type Corner = (usize, Option<usize>, Option<usize>);

impl ObjLoader {
    /// Load an OBJ file, generating smooth normals if it has none
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        Self::load_obj_with(path, true)
    }

    /// Load an OBJ file
    pub fn load_obj_with<P: AsRef<Path>>(path: P, generate_missing_normals: bool) -> Result<Mesh, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mesh = Self::parse(BufReader::new(file), generate_missing_normals)?;
        log::debug!(
            "Loaded {}: {} vertices, {} triangles",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Parse OBJ text from any reader
    pub fn parse(reader: impl BufRead, generate_missing_normals: bool) -> Result<Mesh, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut corners: Vec<Corner> = Vec::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            let line_number = line_number + 1;

            match keyword {
                "v" => positions.push(parse_floats::<3>(&mut parts, line_number)?),
                "vn" => normals.push(parse_floats::<3>(&mut parts, line_number)?),
                "vt" => tex_coords.push(parse_floats::<2>(&mut parts, line_number)?),
                "f" => {
                    let face = parts
                        .map(|token| {
                            parse_corner(token, positions.len(), tex_coords.len(), normals.len(), line_number)
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    if face.len() < 3 {
                        return Err(ObjError::InvalidFormat(format!(
                            "line {}: face needs at least 3 vertices",
                            line_number
                        )));
                    }
                    // Fan triangulation
                    for i in 1..face.len() - 1 {
                        corners.extend([face[0], face[i], face[i + 1]]);
                    }
                }
                _ => {} // comments, groups, materials, smoothing groups
            }
        }

        if corners.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ file".to_string()));
        }

        let generate = generate_missing_normals && normals.is_empty();
        let smooth = if generate {
            smooth_normals(&positions, &corners)
        } else {
            Vec::new()
        };

        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(corners.len());
        let mut unique: HashMap<Corner, u32> = HashMap::new();

        for corner in corners {
            let index = *unique.entry(corner).or_insert_with(|| {
                let (p, t, n) = corner;
                let normal = match n {
                    Some(n) => normals[n],
                    None if generate => smooth[p],
                    None => [0.0, 1.0, 0.0],
                };
                vertices.push(Vertex::new(positions[p], normal, t.map_or([0.0, 0.0], |t| tex_coords[t])));
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }

        Ok(Mesh::new(vertices, indices))
    }
}

fn parse_floats<const N: usize>(parts: &mut SplitWhitespace<'_>, line: usize) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = parts
            .next()
            .ok_or_else(|| ObjError::ParseError(format!("line {}: expected {} components", line, N)))?;
        *value = token
            .parse()
            .map_err(|_| ObjError::ParseError(format!("line {}: invalid number '{}'", line, token)))?;
    }
    Ok(values)
}

/// Resolve a 1-based or negative (relative) OBJ index
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, ObjError> {
    let raw: i64 = token
        .parse()
        .map_err(|_| ObjError::ParseError(format!("line {}: invalid index '{}'", line, token)))?;
    let resolved = if raw > 0 { raw - 1 } else { count as i64 + raw };
    if raw == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(ObjError::InvalidFormat(format!(
            "line {}: index {} out of range (have {})",
            line, raw, count
        )));
    }
    Ok(resolved as usize)
}

fn parse_corner(token: &str, positions: usize, uvs: usize, normals: usize, line: usize) -> Result<Corner, ObjError> {
    let mut fields = token.split('/');
    let position = resolve_index(fields.next().unwrap_or_default(), positions, line)?;
    let uv = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, uvs, line)?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, normals, line)?),
        _ => None,
    };
    Ok((position, uv, normal))
}

/// Area-weighted average of face normals around each position
fn smooth_normals(positions: &[[f32; 3]], corners: &[Corner]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::zeros(); positions.len()];
    for triangle in corners.chunks_exact(3) {
        let [a, b, c] = [triangle[0].0, triangle[1].0, triangle[2].0];
        let (pa, pb, pc) = (Vec3::from(positions[a]), Vec3::from(positions[b]), Vec3::from(positions[c]));
        let face_normal = (pb - pa).cross(&(pc - pa));
        for index in [a, b, c] {
            accumulated[index] += face_normal;
        }
    }

    accumulated
        .into_iter()
        .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y).into())
        .collect()
}
