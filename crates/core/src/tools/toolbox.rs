//! Tool and mode dispatch for the 2D editor.
//!
//! Tools are a closed set, so each [`ToolKind`] maps to a plain function pointer
//! over a [`Canvas`]. Modes bind one tool to each mouse button; fix-oriented modes
//! also switch the fixed-cell highlight on and restore the previous state when
//! the user leaves them.

use crate::core_types::MAX_INTENSITY;
use crate::error::Result;
use crate::grid::{FixedMask, HeatField};
use crate::tools::brush::{self, GridRect};
use tracing::debug;

/// Mutable view of the 2D state that tools edit.
pub struct Canvas<'a> {
    pub field: &'a mut HeatField,
    pub mask: &'a mut FixedMask,
}

/// One tool invocation.
///
/// Single-point tools use `to`; two-click tools span `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: (i32, i32),
    pub to: (i32, i32),
    pub radius: u32,
    /// Brush strength in `[0, 1]` (slider fraction)
    pub intensity: f32,
    /// Two-click fix rectangle started with the erase button
    pub erase: bool,
}

impl Stroke {
    /// Stroke acting on a single point.
    #[must_use]
    pub fn point(x: i32, y: i32, radius: u32, intensity: f32) -> Self {
        Self {
            from: (x, y),
            to: (x, y),
            radius,
            intensity,
            erase: false,
        }
    }
}

/// Function implementing a tool.
pub type ToolFn = fn(&mut Canvas<'_>, &Stroke) -> Result<()>;

/// Every editing tool of the 2D simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FireBrush,
    FireErase,
    FixBrush,
    FixErase,
    /// Display toggle, never edits the canvas
    HighlightFixed,
    FireLine,
    FireRect,
    FixRect,
}

impl ToolKind {
    /// Function that applies the tool, `None` for display-only tools.
    #[must_use]
    pub fn handler(self) -> Option<ToolFn> {
        match self {
            ToolKind::FireBrush => Some(fire_brush),
            ToolKind::FireErase => Some(fire_erase),
            ToolKind::FixBrush => Some(fix_brush),
            ToolKind::FixErase => Some(fix_erase),
            ToolKind::HighlightFixed => None,
            ToolKind::FireLine => Some(fire_line),
            ToolKind::FireRect => Some(fire_rect),
            ToolKind::FixRect => Some(fix_rect),
        }
    }

    /// Tools that act between an anchor click and a second click.
    #[must_use]
    pub fn is_two_click(self) -> bool {
        matches!(
            self,
            ToolKind::FireLine | ToolKind::FireRect | ToolKind::FixRect
        )
    }
}

fn fire_brush(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    let (x, y) = stroke.to;
    brush::apply_heat(canvas.field, x, y, stroke.radius, stroke.intensity)
}

fn fire_erase(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    let (x, y) = stroke.to;
    brush::apply_heat(canvas.field, x, y, stroke.radius, -stroke.intensity)
}

fn fix_brush(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    let (x, y) = stroke.to;
    brush::set_fixed(canvas.mask, x, y, stroke.radius, true);
    Ok(())
}

fn fix_erase(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    let (x, y) = stroke.to;
    brush::set_fixed(canvas.mask, x, y, stroke.radius, false);
    Ok(())
}

fn fire_line(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    brush::fire_line(
        canvas.field,
        stroke.from,
        stroke.to,
        stroke.radius,
        stroke.intensity,
    )
}

fn fire_rect(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    let level = (stroke.intensity.clamp(0.0, 1.0) * f32::from(MAX_INTENSITY)).round() as u8;
    brush::fire_rect(
        canvas.field,
        GridRect::from_corners(stroke.from, stroke.to),
        Some(level),
    );
    Ok(())
}

fn fix_rect(canvas: &mut Canvas<'_>, stroke: &Stroke) -> Result<()> {
    brush::set_fixed_rect(
        canvas.mask,
        GridRect::from_corners(stroke.from, stroke.to),
        !stroke.erase,
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Tool pairings offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeKind {
    #[default]
    Fire,
    Fix,
    FireLine,
    FireRect,
    FixRect,
}

impl ModeKind {
    /// Tool bound to a mouse button in this mode.
    #[must_use]
    pub fn tool(self, button: MouseButton) -> ToolKind {
        let (left, right) = match self {
            ModeKind::Fire => (ToolKind::FireBrush, ToolKind::FireErase),
            ModeKind::Fix => (ToolKind::FixBrush, ToolKind::FixErase),
            ModeKind::FireLine => (ToolKind::FireLine, ToolKind::FireLine),
            ModeKind::FireRect => (ToolKind::FireRect, ToolKind::FireRect),
            ModeKind::FixRect => (ToolKind::FixRect, ToolKind::FixRect),
        };
        match button {
            MouseButton::Left => left,
            MouseButton::Right => right,
        }
    }

    /// Modes that force the fixed-cell highlight on while active.
    #[must_use]
    pub fn highlights_fixed(self) -> bool {
        matches!(self, ModeKind::Fix | ModeKind::FixRect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    point: (i32, i32),
    erase: bool,
}

/// Active mode, highlight state and pending two-click anchor.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    mode: ModeKind,
    highlight: bool,
    /// Highlight state captured when entering a highlighting mode
    saved_highlight: Option<bool>,
    anchor: Option<Anchor>,
}

impl Toolbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> ModeKind {
        self.mode
    }

    /// Switch modes, dropping any pending anchor.
    ///
    /// Leaving a highlighting mode turns the highlight back off if it was off when
    /// the mode was entered.
    pub fn set_mode(&mut self, mode: ModeKind) {
        if mode == self.mode {
            return;
        }
        if let Some(previous) = self.saved_highlight.take() {
            if !previous {
                self.highlight = false;
            }
        }
        self.anchor = None;
        if mode.highlights_fixed() {
            self.saved_highlight = Some(self.highlight);
            self.highlight = true;
        }
        debug!("Tool mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Whether fixed cells should be drawn highlighted.
    #[must_use]
    pub fn highlight_active(&self) -> bool {
        self.highlight
    }

    /// The `HighlightFixed` tool: flip the highlight.
    pub fn toggle_highlight(&mut self) {
        self.highlight = !self.highlight;
    }

    /// First point of a pending two-click tool.
    #[must_use]
    pub fn pending_anchor(&self) -> Option<(i32, i32)> {
        self.anchor.map(|a| a.point)
    }

    /// Handle a button press at a cell.
    ///
    /// Brush tools apply immediately. Two-click tools store the first press as an
    /// anchor and apply on the second, then clear the anchor.
    ///
    /// # Returns
    ///
    /// `true` when the canvas was edited
    ///
    /// # Errors
    ///
    /// Propagates brush parameter errors (e.g. a zero heat radius).
    pub fn press(
        &mut self,
        canvas: &mut Canvas<'_>,
        button: MouseButton,
        at: (i32, i32),
        radius: u32,
        intensity: f32,
    ) -> Result<bool> {
        let tool = self.mode.tool(button);
        let Some(handler) = tool.handler() else {
            return Ok(false);
        };

        if !tool.is_two_click() {
            handler(canvas, &Stroke::point(at.0, at.1, radius, intensity))?;
            return Ok(true);
        }

        match self.anchor.take() {
            None => {
                self.anchor = Some(Anchor {
                    point: at,
                    erase: tool == ToolKind::FixRect && button == MouseButton::Right,
                });
                Ok(false)
            }
            Some(anchor) => {
                let stroke = Stroke {
                    from: anchor.point,
                    to: at,
                    radius,
                    intensity,
                    erase: anchor.erase,
                };
                handler(canvas, &stroke)?;
                Ok(true)
            }
        }
    }

    /// Handle a drag with a button held: brushes paint, two-click tools wait.
    ///
    /// # Errors
    ///
    /// Propagates brush parameter errors.
    pub fn drag(
        &mut self,
        canvas: &mut Canvas<'_>,
        button: MouseButton,
        at: (i32, i32),
        radius: u32,
        intensity: f32,
    ) -> Result<bool> {
        let tool = self.mode.tool(button);
        match tool.handler() {
            Some(handler) if !tool.is_two_click() => {
                handler(canvas, &Stroke::point(at.0, at.1, radius, intensity))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct State {
        field: HeatField,
        mask: FixedMask,
    }

    impl State {
        fn new() -> Self {
            Self {
                field: HeatField::new(16, 16).unwrap(),
                mask: FixedMask::new(16, 16).unwrap(),
            }
        }

        fn canvas(&mut self) -> Canvas<'_> {
            Canvas {
                field: &mut self.field,
                mask: &mut self.mask,
            }
        }
    }

    #[test]
    fn test_brush_buttons() {
        let mut state = State::new();
        let mut tools = Toolbox::new();
        assert!(tools
            .press(&mut state.canvas(), MouseButton::Left, (4, 4), 2, 1.0)
            .unwrap());
        assert_eq!(state.field.get(4, 4), 255);

        tools
            .press(&mut state.canvas(), MouseButton::Right, (4, 4), 2, 1.0)
            .unwrap();
        assert_eq!(state.field.get(4, 4), 0);
    }

    #[test]
    fn test_two_click_line() {
        let mut state = State::new();
        let mut tools = Toolbox::new();
        tools.set_mode(ModeKind::FireLine);

        let edited = tools
            .press(&mut state.canvas(), MouseButton::Left, (1, 1), 1, 1.0)
            .unwrap();
        assert!(!edited);
        assert_eq!(tools.pending_anchor(), Some((1, 1)));
        assert_eq!(state.field.get(1, 1), 0);

        // Drags don't complete a two-click tool
        assert!(!tools
            .drag(&mut state.canvas(), MouseButton::Left, (3, 1), 1, 1.0)
            .unwrap());

        tools
            .press(&mut state.canvas(), MouseButton::Left, (4, 1), 1, 1.0)
            .unwrap();
        assert_eq!(tools.pending_anchor(), None);
        assert!((1..=4).all(|x| state.field.get(x, 1) == 255));
    }

    #[test]
    fn test_fix_rect_erase_with_right_button() {
        let mut state = State::new();
        state.mask.set(2, 2, true);
        state.mask.set(3, 3, true);
        let mut tools = Toolbox::new();
        tools.set_mode(ModeKind::FixRect);

        tools
            .press(&mut state.canvas(), MouseButton::Right, (0, 0), 1, 1.0)
            .unwrap();
        tools
            .press(&mut state.canvas(), MouseButton::Left, (2, 2), 1, 1.0)
            .unwrap();
        assert!(!state.mask.is_fixed(2, 2));
        assert!(state.mask.is_fixed(3, 3));
    }

    #[test]
    fn test_highlight_restored_after_fix_mode() {
        let mut tools = Toolbox::new();
        assert!(!tools.highlight_active());

        tools.set_mode(ModeKind::Fix);
        assert!(tools.highlight_active());
        tools.set_mode(ModeKind::Fire);
        assert!(!tools.highlight_active());

        // Highlight switched on by the user survives a trip through a fix mode
        tools.toggle_highlight();
        tools.set_mode(ModeKind::FixRect);
        tools.set_mode(ModeKind::FireRect);
        assert!(tools.highlight_active());
    }

    #[test]
    fn test_mode_switch_drops_anchor() {
        let mut state = State::new();
        let mut tools = Toolbox::new();
        tools.set_mode(ModeKind::FireRect);
        tools
            .press(&mut state.canvas(), MouseButton::Left, (1, 1), 1, 1.0)
            .unwrap();
        tools.set_mode(ModeKind::Fire);
        assert_eq!(tools.pending_anchor(), None);
    }

    #[test]
    fn test_handler_table() {
        assert!(ToolKind::HighlightFixed.handler().is_none());
        assert!(ToolKind::FixRect.is_two_click());
        assert!(!ToolKind::FixBrush.is_two_click());
        assert_eq!(ModeKind::Fix.tool(MouseButton::Right), ToolKind::FixErase);
    }
}
