//! Rendering module
//!
//! Renderers only read the simulation: they get a `FrameView` once per frame,
//! after that frame's ticks ran, and draw it. The paint layer is rasterized
//! into packed RGBA pixels; the browser build blits them with Canvas 2D.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod raster;

use crate::settings::Settings;
use crate::sim::{SimulationState, Variant};

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use raster::{ColorLut, PaintLayer};

/// Width of the HUD progress bar (pixels)
pub const METER_WIDTH: f32 = 84.0;
/// Painter progress bar wraps every this many strokes
const STROKE_METER_SPAN: u32 = 80;

/// Read-only snapshot handed to a renderer
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub state: &'a SimulationState,
    pub settings: &'a Settings,
    /// Host time in seconds
    pub time: f64,
    /// Measured frames per second, when the overlay is on
    pub fps: Option<u32>,
    /// Frame time matching `fps`
    pub frame_ms: Option<f64>,
    /// Banner text (unlock messages)
    pub message: Option<&'static str>,
}

impl FrameView<'_> {
    /// Fill of the HUD bar in pixels
    pub fn meter_fill(&self) -> f32 {
        match self.state.variant {
            Variant::Painter => {
                let strokes = self.state.counters.strokes % STROKE_METER_SPAN;
                (strokes as f32 / STROKE_METER_SPAN as f32 * METER_WIDTH).min(METER_WIDTH)
            }
            Variant::Collector => self.state.meter.level() * METER_WIDTH,
        }
    }

    pub fn paused(&self) -> bool {
        self.state.phase == crate::sim::RunPhase::Paused
    }
}

/// Something that can draw a frame
pub trait Renderer {
    fn render(&mut self, frame: &FrameView<'_>);

    /// Called when palette-affecting settings change
    fn settings_changed(&mut self, _settings: &Settings) {}
}

/// Headless renderer keeping a summary of what it was asked to draw
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    /// `(frame time, tick count seen, painted cells)` per rendered frame
    pub frames: Vec<(f64, u64, usize)>,
    lut: Option<ColorLut>,
    layer: PaintLayer,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rasterized paint layer
    pub fn layer(&self) -> &PaintLayer {
        &self.layer
    }
}

impl Renderer for FrameLog {
    fn render(&mut self, frame: &FrameView<'_>) {
        let lut = self
            .lut
            .get_or_insert_with(|| ColorLut::new(frame.settings.high_contrast));
        self.layer.rasterize(
            &frame.state.canvas,
            lut,
            frame.state.mood_index(),
            frame.state.wave,
        );
        self.frames.push((
            frame.time,
            frame.state.time_ticks,
            frame.state.canvas.painted_cells(),
        ));
    }

    fn settings_changed(&mut self, settings: &Settings) {
        if self.lut.as_ref().map(ColorLut::high_contrast) != Some(settings.high_contrast) {
            self.lut = Some(ColorLut::new(settings.high_contrast));
        }
    }
}
