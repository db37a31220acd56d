//! Heat-editing tools layered on the heat grids
//!
//! [`brush`] holds the primitives (`apply_heat`, `set_fixed`, `fire_line`,
//! `fire_rect`, ...). [`toolbox`] maps tool and mode identifiers onto those
//! primitives for an input layer.

pub mod bresenham;
pub mod brush;
pub mod toolbox;

pub use bresenham::BresenhamLine;
pub use brush::{
    apply_heat, apply_heat_3d, fire_box, fire_line, fire_rect, heat_delta, set_fixed,
    set_fixed_rect, GridBox, GridRect,
};
pub use toolbox::{Canvas, ModeKind, MouseButton, Stroke, ToolFn, ToolKind, Toolbox};
