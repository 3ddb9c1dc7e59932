//! Input intent and UI commands
//!
//! Hosts translate raw device events into a `TickInput` (consumed by the
//! simulation tick) and discrete `UiCommand`s (applied by the run controller
//! between frames).

use glam::Vec2;

use crate::consts::{CELL, PAINT_H, PAINT_W, PAINT_X, PAINT_Y, SCREEN_H, SCREEN_W};

/// A paint grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Screen position of the cell's center pixel
    pub fn screen_center(self) -> Vec2 {
        Vec2::new(
            (PAINT_X + self.x * CELL + 1) as f32,
            (PAINT_Y + self.y * CELL + 1) as f32,
        )
    }
}

/// Pointer state for direct-manipulation painting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Cell under the pointer, if it is over the paint area
    pub cell: Option<GridPoint>,
    /// Button or touch currently held
    pub down: bool,
    /// A press happened since the last tick (latched until consumed)
    pub pressed: bool,
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Movement axes, each in [-1, 1]
    pub axes: Vec2,
    /// Discrete action trigger (dash)
    pub action: bool,
    /// Pointer / grid input
    pub pointer: PointerState,
}

impl TickInput {
    /// Set movement axes, clamping each to [-1, 1]
    pub fn set_axes(&mut self, x: f32, y: f32) {
        let clamp = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        self.axes = Vec2::new(clamp(x), clamp(y));
    }

    /// Record a pointer press at logical screen coordinates
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pointer.cell = screen_to_grid(x, y);
        if self.pointer.cell.is_some() {
            self.pointer.down = true;
            self.pointer.pressed = true;
        }
    }

    /// Record pointer movement at logical screen coordinates
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(cell) = screen_to_grid(x, y) {
            self.pointer.cell = Some(cell);
        }
    }

    pub fn pointer_up(&mut self) {
        self.pointer.down = false;
    }

    /// Clear one-shot triggers after a tick consumed them
    pub fn clear_one_shots(&mut self) {
        self.action = false;
        self.pointer.pressed = false;
    }
}

/// Map a logical screen position (320x180 space) to a paint cell
pub fn screen_to_grid(x: f32, y: f32) -> Option<GridPoint> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let x = x as i32;
    let y = y as i32;
    if x < PAINT_X || x >= PAINT_X + PAINT_W || y < PAINT_Y || y >= PAINT_Y + PAINT_H {
        return None;
    }
    Some(GridPoint::new((x - PAINT_X) / CELL, (y - PAINT_Y) / CELL))
}

/// Map a client-space position inside an element rect to logical screen space
pub fn client_to_screen(client_x: f32, client_y: f32, left: f32, top: f32, width: f32, height: f32) -> (f32, f32) {
    let w = width.max(1.0);
    let h = height.max(1.0);
    ((client_x - left) * SCREEN_W / w, (client_y - top) * SCREEN_H / h)
}

/// Painter tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Paint,
    Erase,
    Pulse,
}

/// Discrete UI actions applied between frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    TogglePause,
    ToggleFps,
    ToggleMute,
    TogglePerfMode,
    ToggleScanlines,
    ToggleReducedMotion,
    ToggleHighContrast,
    ClearArt,
    BrushSmaller,
    BrushLarger,
    SelectColor(u8),
    SelectTool(Tool),
    PickPalette(usize),
    SetVolume(f32),
}

impl UiCommand {
    /// Keyboard binding for a key name (`KeyboardEvent.key`)
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        let cmd = match key.as_str() {
            "p" => Self::TogglePause,
            "f" => Self::ToggleFps,
            "m" => Self::ToggleMute,
            "c" => Self::ClearArt,
            "[" => Self::BrushSmaller,
            "]" => Self::BrushLarger,
            k if k.len() == 1 => {
                let c = k.as_bytes()[0];
                if (b'1'..=b'8').contains(&c) {
                    Self::SelectColor(c - b'1')
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(cmd)
    }
}
