//! Renderers turning heat grids into RGB images
//!
//! - [`raster`]: direct palette lookup of the 2D field, with fixed-cell and brush overlays
//! - [`voxel`] + [`tracer`]: voxel grid synced from the 3D volume and a progressive
//!   DDA path tracer over it
//! - [`mesh_raster`]: projection and scanline fill of a marching-cubes mesh

pub mod camera;
pub mod geometry;
pub mod mesh_raster;
pub mod raster;
pub mod tracer;
pub mod voxel;

pub use camera::{Camera, OrbitCamera};
pub use geometry::Aabb;
pub use mesh_raster::rasterize_mesh;
pub use raster::{render_field, BrushCursor, Overlay, HIGHLIGHT_COLOR};
pub use tracer::PathTracer;
pub use voxel::{Material, Voxel, VoxelGrid};
