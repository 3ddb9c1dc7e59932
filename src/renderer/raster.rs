//! Paint layer rasterizer
//!
//! Cells are expanded to CELL x CELL blocks of packed RGBA pixels. Colors are
//! looked up per palette, color and wave phase from a precomputed table, so
//! the per-frame cost is one table read per painted cell.

use crate::consts::{CELL, GRID_H, GRID_W, PAINT_H, PAINT_W};
use crate::palette::{PALETTE_COUNT, PALETTES, Rgb};
use crate::sim::PaintCanvas;

/// Wave table length (phase is masked with `WAVE_LEN - 1`)
pub const WAVE_LEN: usize = 1024;
const COLORS: usize = 8;

/// Pack an opaque color so its in-memory bytes are `[r, g, b, 255]`
#[inline]
pub fn pack_rgba(r: u8, g: u8, b: u8) -> u32 {
    u32::from_ne_bytes([r, g, b, 255])
}

/// Sine wave sampled over one period, centered on 128
pub fn wave_table() -> [u8; WAVE_LEN] {
    let mut table = [0u8; WAVE_LEN];
    for (i, w) in table.iter_mut().enumerate() {
        let s = (i as f32 / WAVE_LEN as f32 * std::f32::consts::TAU).sin();
        *w = (128.0 + s * 127.0) as u8;
    }
    table
}

/// Precomputed shimmer colors: `[palette][color][wave]`
#[derive(Debug, Clone)]
pub struct ColorLut {
    high_contrast: bool,
    table: Vec<u32>,
}

impl ColorLut {
    pub fn new(high_contrast: bool) -> Self {
        let wave = wave_table();
        let amp: i32 = if high_contrast { 18 } else { 48 };
        let mut table = Vec::with_capacity(PALETTE_COUNT * COLORS * WAVE_LEN);

        for palette in &PALETTES {
            for &[r, g, b] in &palette.colors {
                for &osc in &wave {
                    let osc = osc as i32;
                    let shift = |base: u8, delta: i32| (base as i32 + delta).clamp(0, 255) as u8;
                    table.push(pack_rgba(
                        shift(r, ((osc - 128) * amp) >> 8),
                        shift(g, ((127 - osc) * amp) >> 8),
                        shift(b, ((osc - 128) * amp) >> 9),
                    ));
                }
            }
        }

        Self {
            high_contrast,
            table,
        }
    }

    pub fn high_contrast(&self) -> bool {
        self.high_contrast
    }

    /// Packed color for a palette, color index and wave phase (all wrap)
    #[inline]
    pub fn get(&self, palette: usize, color: usize, wave: usize) -> u32 {
        let p = palette % PALETTE_COUNT;
        let c = color % COLORS;
        let w = wave & (WAVE_LEN - 1);
        self.table[(p * COLORS + c) * WAVE_LEN + w]
    }
}

/// Packed pixels of the paint area
#[derive(Debug, Clone)]
pub struct PaintLayer {
    pixels: Vec<u32>,
}

impl Default for PaintLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintLayer {
    pub const WIDTH: usize = PAINT_W as usize;
    pub const HEIGHT: usize = PAINT_H as usize;

    pub fn new() -> Self {
        Self {
            pixels: vec![pack_rgba(0, 0, 0); Self::WIDTH * Self::HEIGHT],
        }
    }

    /// Redraw the whole layer from the canvas
    pub fn rasterize(&mut self, canvas: &PaintCanvas, lut: &ColorLut, mood: usize, wave: u32) {
        self.pixels.fill(pack_rgba(0, 0, 0));
        let colors = canvas.colors();
        let pulses = canvas.pulses();
        let cell = CELL as usize;

        for gy in 0..GRID_H as usize {
            let row = gy * GRID_W as usize;
            for gx in 0..GRID_W as usize {
                let ci = colors[row + gx];
                if ci == 0 {
                    continue;
                }
                let phase = wave as usize + pulses[row + gx] as usize;
                let color = lut.get(mood, ci as usize - 1, phase);
                let origin = gy * cell * Self::WIDTH + gx * cell;
                for dy in 0..cell {
                    let o = origin + dy * Self::WIDTH;
                    self.pixels[o..o + cell].fill(color);
                }
            }
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// RGBA bytes ready for upload (`ImageData`, textures)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < Self::WIDTH && y < Self::HEIGHT).then(|| self.pixels[y * Self::WIDTH + x])
    }
}

/// CSS color string for a palette color
pub fn css_rgb([r, g, b]: Rgb) -> String {
    format!("rgb({},{},{})", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{GridPoint, Tool};
    use crate::rng::SeededRng;

    #[test]
    fn test_packed_bytes_are_rgba() {
        let px = [pack_rgba(10, 20, 30)];
        let bytes: &[u8] = bytemuck::cast_slice(&px);
        assert_eq!(bytes, &[10, 20, 30, 255]);
    }

    #[test]
    fn test_wave_table_range() {
        let wave = wave_table();
        assert_eq!(wave[0], 128);
        assert_eq!(wave[256], 255);
        assert!(wave[768] <= 1);
    }

    #[test]
    fn test_lut_shimmer_stays_near_base() {
        let lut = ColorLut::new(false);
        let base = PALETTES[0].colors[3];
        for w in [0, 100, 256, 700] {
            let [r, g, b, a] = lut.get(0, 3, w).to_ne_bytes();
            assert_eq!(a, 255);
            assert!((r as i32 - base[0] as i32).abs() <= 48);
            assert!((g as i32 - base[1] as i32).abs() <= 48);
            assert!((b as i32 - base[2] as i32).abs() <= 24);
        }
        // Phase and indices wrap
        assert_eq!(lut.get(0, 3, 5), lut.get(PALETTE_COUNT, 11, 5 + WAVE_LEN));
    }

    #[test]
    fn test_high_contrast_is_flatter() {
        let soft = ColorLut::new(false);
        let hc = ColorLut::new(true);
        let spread = |lut: &ColorLut| {
            let [a, ..] = lut.get(1, 0, 256).to_ne_bytes();
            let [b, ..] = lut.get(1, 0, 768).to_ne_bytes();
            (a as i32 - b as i32).abs()
        };
        assert!(spread(&hc) < spread(&soft));
    }

    #[test]
    fn test_rasterize_expands_cells() {
        let mut canvas = PaintCanvas::new();
        let mut rng = SeededRng::new(1);
        canvas.apply_brush(GridPoint::new(2, 1), 0, Tool::Paint, 4, 0, &mut rng);

        let lut = ColorLut::new(false);
        let mut layer = PaintLayer::new();
        layer.rasterize(&canvas, &lut, 0, 0);

        let expected = lut.get(0, 4, canvas.pulse_at(GridPoint::new(2, 1)) as usize);
        for y in 3..6 {
            for x in 6..9 {
                assert_eq!(layer.pixel(x, y), Some(expected));
            }
        }
        assert_eq!(layer.pixel(5, 3), Some(pack_rgba(0, 0, 0)));
        assert_eq!(layer.pixel(6, 6), Some(pack_rgba(0, 0, 0)));
        assert_eq!(layer.pixel(PaintLayer::WIDTH, 0), None);
        assert_eq!(layer.as_bytes().len(), PaintLayer::WIDTH * PaintLayer::HEIGHT * 4);
    }
}
