//! Frame-level drivers owning the grids, palette and renderer state.

mod fire2d;
mod fire3d;

pub use fire2d::FireSimulation2D;
pub use fire3d::FireSimulation3D;
