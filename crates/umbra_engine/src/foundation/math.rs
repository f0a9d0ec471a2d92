//! Math utilities and types
//!
//! Provides the vector/matrix aliases used throughout the engine and the
//! projection helpers needed to build light-space cameras.
//!
//! Conventions:
//! - right-handed world space, Y up
//! - view space looks down -Z
//! - clip-space depth is mapped to `[0, 1]`
//! - matrices act on column vectors (`clip = proj * view * world`)

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Tolerance used when testing vectors for degeneracy
    pub const EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Returns true when two directions are (anti)parallel within tolerance
    pub fn is_parallel(a: &Vec3, b: &Vec3) -> bool {
        a.cross(b).norm_squared() <= constants::EPSILON * a.norm_squared() * b.norm_squared()
    }
}

/// Extension trait for Mat4 with camera and projection constructors
pub trait Mat4Ext {
    /// Create a right-handed look-at view matrix (camera looks down -Z)
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create an orthographic projection mapping view depth `[near, far]` to `[0, 1]`
    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4;

    /// Create a perspective projection mapping view depth `[near, far]` to `[0, 1]`
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Bias/scale matrix taking clip-space xy in `[-1, 1]` to texture uv in `[0, 1]`
    ///
    /// V is flipped so that row 0 of the shadow map is the top of the light's view.
    fn texture_transform() -> Mat4;

    /// Invert a matrix made only of rotation and translation
    fn rigid_inverse(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        let depth = far - near;
        Mat4::new(
            2.0 / width, 0.0, 0.0, 0.0,
            0.0, 2.0 / height, 0.0, 0.0,
            0.0, 0.0, -1.0 / depth, -near / depth,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let focal = 1.0 / (fov_y * 0.5).tan();
        let mut result = Mat4::zeros();

        result[(0, 0)] = focal / aspect;
        result[(1, 1)] = focal;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = (near * far) / (near - far);
        result[(3, 2)] = -1.0; // w = view depth

        result
    }

    fn texture_transform() -> Mat4 {
        Mat4::new(
            0.5, 0.0, 0.0, 0.5,
            0.0, -0.5, 0.0, 0.5,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn rigid_inverse(&self) -> Mat4 {
        let rotation_t = self.fixed_view::<3, 3>(0, 0).transpose();
        let translation = self.fixed_view::<3, 1>(0, 3).into_owned();
        let inv_translation = -(rotation_t * translation);

        let mut result = Mat4::identity();
        result.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation_t);
        result.fixed_view_mut::<3, 1>(0, 3).copy_from(&inv_translation);
        result
    }
}

/// Transform a point by a full projective matrix, performing the perspective divide
pub fn project_point(matrix: &Mat4, point: &Point3) -> Point3 {
    let clip = matrix * point.to_homogeneous();
    let w = if clip.w.abs() > constants::EPSILON { clip.w } else { constants::EPSILON };
    Point3::new(clip.x / w, clip.y / w, clip.z / w)
}
