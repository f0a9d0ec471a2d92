//! Bounding volumes used for visibility culling
//!
//! Frustums follow the engine's projection conventions (view space looks down
//! -Z, clip depth in `[0, 1]`). Plane normals point into the volume.

use crate::foundation::math::{project_point, Mat4, Point3, Vec3, Vec4};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB containing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Enclosed volume
    pub fn volume(&self) -> f32 {
        let size = self.max - self.min;
        size.x * size.y * size.z
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another
    pub fn contains(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Signed offset so that `normal · p + distance = 0` on the plane
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.norm();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Plane through three points, normal following the winding `a → b → c`
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(&(c - a)).normalize();
        Self {
            normal,
            distance: -normal.dot(&a),
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }
}

/// Corner ordering: bit 0 selects +x, bit 1 selects +y, bit 2 selects the far plane
const CORNER_COUNT: usize = 8;

/// Three corners spanning each face: left, right, bottom, top, near, far
const FACE_CORNERS: [[usize; 3]; 6] = [
    [0, 2, 4],
    [1, 3, 5],
    [0, 1, 4],
    [2, 3, 6],
    [0, 1, 2],
    [4, 5, 6],
];

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Eight corners (bit 0: +x, bit 1: +y, bit 2: far)
    pub corners: [Point3; 8],
    /// Six inward-facing planes (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// View-space frustum of an orthographic projection
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::from_corners(std::array::from_fn(|i| {
            let depth = if i & 4 == 0 { near } else { far };
            Point3::new(
                if i & 1 == 0 { -hw } else { hw },
                if i & 2 == 0 { -hh } else { hh },
                -depth,
            )
        }))
    }

    /// View-space frustum of a perspective projection
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let tan_half = (fov_y * 0.5).tan();
        Self::from_corners(std::array::from_fn(|i| {
            let depth = if i & 4 == 0 { near } else { far };
            let hh = depth * tan_half;
            let hw = hh * aspect;
            Point3::new(
                if i & 1 == 0 { -hw } else { hw },
                if i & 2 == 0 { -hh } else { hh },
                -depth,
            )
        }))
    }

    /// Build a frustum from its eight corners
    pub fn from_corners(corners: [Point3; CORNER_COUNT]) -> Self {
        let center = corners.iter().fold(Vec3::zeros(), |acc, c| acc + c.coords) / CORNER_COUNT as f32;
        let planes = FACE_CORNERS.map(|[a, b, c]| {
            let plane = Plane::from_points(corners[a].coords, corners[b].coords, corners[c].coords);
            if plane.distance_to_point(center) < 0.0 {
                plane.flipped()
            } else {
                plane
            }
        });
        Self { corners, planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for clip depth in `[0, 1]`. Corners are
    /// recovered by unprojecting the clip-space cube; they stay at the origin
    /// if the matrix is singular.
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let row = |r: usize| -> Vec4 { view_proj.row(r).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let to_plane = |v: Vec4| Plane::new(Vec3::new(v.x, v.y, v.z), v.w);

        let corners = view_proj.try_inverse().map_or([Point3::origin(); CORNER_COUNT], |inverse| {
            std::array::from_fn(|i| {
                let ndc = Point3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { 0.0 } else { 1.0 },
                );
                project_point(&inverse, &ndc)
            })
        });

        Self {
            corners,
            planes: [
                to_plane(r3 + r0),
                to_plane(r3 - r0),
                to_plane(r3 + r1),
                to_plane(r3 - r1),
                to_plane(r2),
                to_plane(r3 - r2),
            ],
        }
    }

    /// Transform the frustum by a rigid or affine matrix (e.g. view → world)
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::from_corners(self.corners.map(|c| matrix.transform_point(&c)))
    }

    /// Check whether a point lies inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= -1.0e-4)
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            // Corner of the box furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }

    /// World-space box enclosing all eight corners
    pub fn bounding_box(&self) -> AABB {
        let first = self.corners[0].coords;
        self.corners.iter().skip(1).fold(AABB::new(first, first), |acc, c| AABB {
            min: acc.min.inf(&c.coords),
            max: acc.max.sup(&c.coords),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_from_points() {
        let points = [Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 4.0, 0.0), Vec3::new(0.0, 0.0, 5.0)];
        let aabb = AABB::from_points(&points).expect("non-empty");
        assert_relative_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_relative_eq!(aabb.max, Vec3::new(1.0, 4.0, 5.0));
        assert_relative_eq!(aabb.volume(), 2.0 * 6.0 * 5.0);
        assert!(AABB::from_points(&Vec::<Vec3>::new()).is_none());
    }

    #[test]
    fn test_orthographic_frustum_planes_face_inward() {
        let frustum = Frustum::orthographic(10.0, 10.0, 1.0, 20.0);
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(frustum.contains_point(Vec3::new(4.9, -4.9, -19.9)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.5)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -25.0)));
        assert!(!frustum.contains_point(Vec3::new(6.0, 0.0, -10.0)));
    }

    #[test]
    fn test_perspective_frustum_widens_with_depth() {
        let frustum = Frustum::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.5, 50.0);
        assert!(frustum.contains_point(Vec3::new(9.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(11.0, 0.0, -10.0)));
        let bounds = frustum.bounding_box();
        assert_relative_eq!(bounds.max.x, 50.0, epsilon = 1e-3);
        assert_relative_eq!(bounds.min.z, -50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_transformed_frustum_into_world_space() {
        let eye = Vec3::new(0.0, 10.0, 0.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::z());
        let world = Frustum::orthographic(4.0, 4.0, 1.0, 20.0).transformed(&view.rigid_inverse());

        assert!(world.contains_point(Vec3::new(0.0, 0.0, 0.0)));
        assert!(world.contains_point(Vec3::new(1.5, 5.0, -1.5)));
        assert!(!world.contains_point(Vec3::new(0.0, 15.0, 0.0)));
        assert!(!world.contains_point(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_gribb_hartmann_agrees_with_corner_frustum() {
        let view = Mat4::look_at(Vec3::new(5.0, 5.0, 5.0), Vec3::zeros(), Vec3::y());
        let proj = Mat4::perspective(1.0, 1.5, 0.5, 30.0);
        let extracted = Frustum::from_matrix(&(proj * view));
        let built = Frustum::perspective(1.0, 1.5, 0.5, 30.0).transformed(&view.rigid_inverse());

        let probes = [
            Vec3::zeros(),
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(-20.0, -20.0, -20.0),
            Vec3::new(1.0, 2.0, -3.0),
            Vec3::new(30.0, 0.0, 0.0),
        ];
        for probe in probes {
            assert_eq!(extracted.contains_point(probe), built.contains_point(probe), "probe {:?}", probe);
        }
        for (a, b) in extracted.corners.iter().zip(&built.corners) {
            assert_relative_eq!(a, b, epsilon = 1e-3, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_frustum_aabb_culling() {
        let frustum = Frustum::orthographic(10.0, 10.0, 1.0, 20.0);
        let inside = AABB::from_center_extents(Vec3::new(0.0, 0.0, -10.0), Vec3::new(1.0, 1.0, 1.0));
        let straddling = AABB::from_center_extents(Vec3::new(5.5, 0.0, -10.0), Vec3::new(1.0, 1.0, 1.0));
        let outside = AABB::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(frustum.intersects_aabb(&inside));
        assert!(frustum.intersects_aabb(&straddling));
        assert!(!frustum.intersects_aabb(&outside));
    }
}
