//! Paint grid for the painter variant
//!
//! Cells hold a color (0 = empty, 1..=8 = color index + 1) and a pulse phase
//! used by the renderer to animate painted cells.

use crate::consts::{COLOR_COUNT, GRID_H, GRID_W};
use crate::input::{GridPoint, Tool};
use crate::in_grid;
use crate::rng::SeededRng;

/// Result of one brush application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrushOutcome {
    /// Cells inside the brush footprint
    pub touched: u32,
    /// Cells that went from empty to painted
    pub newly_painted: u32,
}

#[derive(Debug, Clone)]
pub struct PaintCanvas {
    colors: Vec<u8>,
    pulse: Vec<u8>,
}

impl Default for PaintCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintCanvas {
    pub fn new() -> Self {
        let n = (GRID_W * GRID_H) as usize;
        Self {
            colors: vec![0; n],
            pulse: vec![0; n],
        }
    }

    #[inline]
    fn index(x: i32, y: i32) -> usize {
        (y * GRID_W + x) as usize
    }

    pub fn clear(&mut self) {
        self.colors.fill(0);
        self.pulse.fill(0);
    }

    /// Stored color at a cell (0 = empty)
    pub fn color_at(&self, cell: GridPoint) -> u8 {
        if in_grid(cell.x, cell.y) {
            self.colors[Self::index(cell.x, cell.y)]
        } else {
            0
        }
    }

    pub fn pulse_at(&self, cell: GridPoint) -> u8 {
        if in_grid(cell.x, cell.y) {
            self.pulse[Self::index(cell.x, cell.y)]
        } else {
            0
        }
    }

    /// Raw row-major color cells
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Raw row-major pulse phases
    pub fn pulses(&self) -> &[u8] {
        &self.pulse
    }

    pub fn painted_cells(&self) -> usize {
        self.colors.iter().filter(|&&c| c != 0).count()
    }

    /// Apply a circular brush of `radius` cells centered on `center`
    pub fn apply_brush(
        &mut self,
        center: GridPoint,
        radius: i32,
        tool: Tool,
        color: u8,
        wave: u32,
        rng: &mut SeededRng,
    ) -> BrushOutcome {
        let mut outcome = BrushOutcome::default();
        let r2 = radius * radius;
        // Stored colors are 1-based; 0 is an empty cell
        let stored = color.min(COLOR_COUNT - 1) + 1;

        for oy in -radius..=radius {
            let y = center.y + oy;
            if !(0..GRID_H).contains(&y) {
                continue;
            }
            for ox in -radius..=radius {
                let x = center.x + ox;
                if !(0..GRID_W).contains(&x) || ox * ox + oy * oy > r2 {
                    continue;
                }
                let i = Self::index(x, y);
                outcome.touched += 1;
                match tool {
                    Tool::Erase => {
                        self.colors[i] = 0;
                        self.pulse[i] = 0;
                    }
                    Tool::Pulse => {
                        if self.colors[i] != 0 {
                            self.pulse[i] = self.pulse[i].wrapping_add(48);
                        }
                    }
                    Tool::Paint => {
                        if self.colors[i] == 0 {
                            outcome.newly_painted += 1;
                        }
                        self.colors[i] = stored;
                        self.pulse[i] = (wave.wrapping_add(rng.below(255))) as u8;
                    }
                }
            }
        }

        outcome
    }
}

/// Cells on the Bresenham line from `a` to `b`, both ends included
pub fn line_cells(a: GridPoint, b: GridPoint) -> Vec<GridPoint> {
    let (mut x0, mut y0) = (a.x, a.y);
    let dx = (b.x - x0).abs();
    let dy = -(b.y - y0).abs();
    let sx = if x0 < b.x { 1 } else { -1 };
    let sy = if y0 < b.y { 1 } else { -1 };
    let mut err = dx + dy;

    let mut cells = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    loop {
        cells.push(GridPoint::new(x0, y0));
        if x0 == b.x && y0 == b.y {
            break;
        }
        let e2 = err * 2;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    cells
}
