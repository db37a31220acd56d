//! Vector type alias for 3D positions, directions and colors.

use nalgebra::Vector3;

/// 3D vector type for world positions, ray directions and linear RGB radiance.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`, used by the camera, the
/// voxel path tracer and the marching-cubes mesh.
pub type Vec3 = Vector3<f32>;

/// Integer voxel coordinate used by the DDA traversal.
pub type IVec3 = Vector3<i32>;
