//! Automaton kernels, noise and isosurface extraction
//!
//! The heat grids in [`crate::grid`] call into [`automaton`] for their per-frame
//! step. [`marching_cubes`] turns a 3D heat volume into a capped triangle mesh for
//! the rasterized render path.

pub mod automaton;
pub mod marching_cubes;
mod mc_tables;
pub mod noise;
pub mod profiler;

pub use automaton::{flicker_offset, mix_seed};
pub use marching_cubes::{default_iso_level, extract_isosurface, polygonise, Mesh, Triangle};
pub use noise::perlin_noise;
pub use profiler::{FrameTimer, ProfilerScope};
