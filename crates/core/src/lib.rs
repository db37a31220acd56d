//! Cyberfire Core Library
//!
//! Cellular-automaton fire simulation with 2D and 3D variants, plus the renderers
//! that turn the heat field into display-ready images.
//!
//! ## Pipeline
//!
//! Each frame runs in a fixed order:
//! 1. [`HeatField::step`] / [`HeatVolume::step`] advances the automaton
//! 2. (3D) the voxel grid is synced from the heat volume, or a marching-cubes mesh is extracted
//! 3. (3D) the voxel bounding box is recomputed
//! 4. the 2D rasterizer or the voxel path tracer produces an [`RgbImage`]
//!
//! User input reaches the core only through the brush tools in [`tools`] and the
//! camera setters on [`FireSimulation3D`].

pub mod config;
pub mod core_types;
pub mod error;
pub mod grid;
pub mod render;
pub mod simulation;
pub mod solver;
pub mod tools;

pub use config::{FireConfig2D, FireConfig3D, RenderPath, SpreadParams, SpreadPreset, TracerSettings};
pub use core_types::{Palette, RgbImage, Vec3, MAX_INTENSITY};
pub use error::{FireError, Result};
pub use grid::{FixedMask, HeatField, HeatVolume};
pub use render::{Aabb, BrushCursor, Camera, OrbitCamera, Overlay, PathTracer, VoxelGrid};
pub use simulation::{FireSimulation2D, FireSimulation3D};
pub use solver::{extract_isosurface, FrameTimer, Mesh, ProfilerScope};
pub use tools::{GridRect, ModeKind, MouseButton, ToolKind, Toolbox};
