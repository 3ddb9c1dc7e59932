//! Canvas 2D renderer (browser)
//!
//! Draws at the logical 320x180 resolution; CSS scales the canvas up with
//! nearest-neighbour filtering.

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use super::raster::{ColorLut, PaintLayer, css_rgb};
use super::{FrameView, METER_WIDTH, Renderer};
use crate::consts::*;
use crate::palette;
use crate::settings::Settings;
use crate::sim::{ParticleKind, Variant};

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    lut: ColorLut,
    layer: PaintLayer,
}

impl CanvasRenderer {
    /// Attach to a canvas. Returns `None` when no 2D context is available.
    pub fn new(canvas: &HtmlCanvasElement, settings: &Settings) -> Option<Self> {
        canvas.set_width(SCREEN_W as u32);
        canvas.set_height(SCREEN_H as u32);
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        ctx.set_image_smoothing_enabled(false);

        log::info!("Canvas renderer ready ({}x{})", SCREEN_W, SCREEN_H);
        Some(Self {
            ctx,
            lut: ColorLut::new(settings.high_contrast),
            layer: PaintLayer::new(),
        })
    }

    #[allow(deprecated)]
    fn fill(&self, style: &str) {
        self.ctx.set_fill_style(&JsValue::from_str(style));
    }

    fn rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.fill_rect(x, y, w, h);
    }

    fn triangle(&self, a: (f64, f64), b: (f64, f64), c: (f64, f64)) {
        self.ctx.begin_path();
        self.ctx.move_to(a.0, a.1);
        self.ctx.line_to(b.0, b.1);
        self.ctx.line_to(c.0, c.1);
        self.ctx.close_path();
        self.ctx.fill();
    }

    fn draw_background(&self, frame: &FrameView<'_>) {
        let hc = frame.settings.high_contrast;
        let perf = frame.settings.perf_mode;
        let (w, h) = (SCREEN_W as f64, SCREEN_H as f64);

        self.fill(if hc { "#000" } else { "#456fdf" });
        self.rect(0.0, 0.0, w, h);

        // Drifting clouds
        if !perf {
            self.fill(if hc { "#fff" } else { "#d8d8d8" });
            let t = frame.time * 1000.0;
            for i in 0..6 {
                let fi = i as f64;
                let x = ((fi * 56.0 + t * 0.01 * (fi + 1.0)) % (w + 20.0) - 20.0).floor();
                let y = 8.0 + (i & 1) as f64 * 8.0;
                self.rect(x, y, 16.0, 6.0);
                self.rect(x + 4.0, y - 3.0, 10.0, 3.0);
            }
        }

        // Pyramids
        self.fill(if hc { "#777" } else { "#ff7f3f" });
        self.triangle((45.0, 120.0), (120.0, 30.0), (190.0, 120.0));
        self.triangle((130.0, 120.0), (210.0, 20.0), (290.0, 120.0));
        self.fill(if hc { "#444" } else { "#bc6b00" });
        self.triangle((70.0, 120.0), (120.0, 55.0), (165.0, 120.0));
        self.triangle((160.0, 120.0), (210.0, 42.0), (260.0, 120.0));

        // Patterned ground
        self.fill(if hc { "#111" } else { "#7d7408" });
        self.rect(0.0, 120.0, w, 60.0);
        if !perf {
            self.fill(if hc { "#333" } else { "#d0be2c" });
            for y in (120..SCREEN_H as i32).step_by(4) {
                for x in (0..SCREEN_W as i32).step_by(6) {
                    if (x + y) & 8 == 0 {
                        self.rect(x as f64, y as f64, 2.0, 2.0);
                    }
                }
            }
        }
    }

    fn draw_paint_area(&mut self, frame: &FrameView<'_>) {
        let hc = frame.settings.high_contrast;
        let (px, py) = (PAINT_X as f64, PAINT_Y as f64);
        let (pw, ph) = (PAINT_W as f64, PAINT_H as f64);

        self.fill(if hc { "#fff" } else { "#a96c15" });
        self.rect(px - 6.0, py - 6.0, pw + 12.0, ph + 12.0);
        self.fill("#000");
        self.rect(px - 2.0, py - 2.0, pw + 4.0, ph + 4.0);

        let state = frame.state;
        self.layer
            .rasterize(&state.canvas, &self.lut, state.mood_index(), state.wave);
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(self.layer.as_bytes()),
            PaintLayer::WIDTH as u32,
            PaintLayer::HEIGHT as u32,
        );
        match image {
            Ok(image) => {
                let _ = self.ctx.put_image_data(&image, px, py);
            }
            Err(e) => log::warn!("Paint layer upload failed: {:?}", e),
        }
    }

    fn draw_collector(&self, frame: &FrameView<'_>) {
        let state = frame.state;
        let mood = state.mood_index();

        for (_, gem) in state.gems.iter_active() {
            let bob = if frame.settings.reduced_motion {
                0.0
            } else {
                (frame.time * 4.0 + gem.phase as f64).sin() * 1.5
            };
            self.fill(&css_rgb(palette::color(mood, 3)));
            self.rect(gem.pos.x as f64 - 2.0, gem.pos.y as f64 - 2.0 + bob, 4.0, 4.0);
            self.fill("#fff");
            self.rect(gem.pos.x as f64 - 1.0, gem.pos.y as f64 - 2.0 + bob, 1.0, 1.0);
        }

        let p = &state.player;
        self.fill(&css_rgb(palette::color(mood, 0)));
        self.rect(p.pos.x as f64 - 3.0, p.pos.y as f64 - 3.0, 6.0, 6.0);
        if p.dash_cooldown == 0 {
            self.fill("#fff");
            self.rect(p.pos.x as f64 - 1.0, p.pos.y as f64 - 1.0, 2.0, 2.0);
        }
    }

    fn draw_particles(&self, frame: &FrameView<'_>) {
        if frame.settings.reduced_motion {
            return;
        }
        let mood = frame.state.mood_index();
        frame.state.particles.for_each_active(|_, p| {
            let style = match p.kind {
                ParticleKind::Paint(c) => css_rgb(palette::color(mood, c)),
                ParticleKind::Spark => css_rgb(palette::color(mood, 3)),
                ParticleKind::Dash => "#ffffff".to_string(),
                ParticleKind::Burst => css_rgb(palette::color(mood, 7)),
            };
            self.fill(&style);
            self.rect(p.pos.x.floor() as f64, p.pos.y.floor() as f64, 1.0, 1.0);
        });
    }

    fn draw_hud(&self, frame: &FrameView<'_>) {
        self.fill("#111");
        self.rect(6.0, 6.0, METER_WIDTH as f64 + 2.0, 12.0);
        self.fill("#8effff");
        self.rect(7.0, 7.0, frame.meter_fill().floor() as f64, 10.0);

        self.ctx.set_font("8px monospace");
        self.fill("#fff");
        let counter = match frame.state.variant {
            Variant::Painter => format!("{}", frame.state.counters.strokes),
            Variant::Collector => format!("{}", frame.state.counters.score),
        };
        let _ = self.ctx.fill_text(&counter, 96.0, 15.0);
        let _ = self
            .ctx
            .fill_text(palette::palette(frame.state.mood_index()).name, 220.0, 15.0);

        if let Some(msg) = frame.message {
            let _ = self.ctx.fill_text(msg, 8.0, SCREEN_H as f64 - 8.0);
        }
        if let Some(fps) = frame.fps {
            let _ = self
                .ctx
                .fill_text(&format!("FPS {}", fps), SCREEN_W as f64 - 44.0, SCREEN_H as f64 - 16.0);
        }
        if let Some(ms) = frame.frame_ms {
            let _ = self
                .ctx
                .fill_text(&format!("FT {:.1}ms", ms), SCREEN_W as f64 - 44.0, SCREEN_H as f64 - 8.0);
        }

        if frame.paused() {
            self.fill("rgba(0,0,0,0.6)");
            self.rect(0.0, 0.0, SCREEN_W as f64, SCREEN_H as f64);
            self.fill("#fff");
            let _ = self.ctx.fill_text("PAUSED", 145.0, 90.0);
        }
    }

    fn draw_scanlines(&self, frame: &FrameView<'_>) {
        if !frame.settings.effective_scanlines() {
            return;
        }
        let (w, h) = (SCREEN_W as f64, SCREEN_H as f64);
        self.fill("rgba(0,0,0,0.12)");
        for y in (0..SCREEN_H as i32).step_by(3) {
            self.rect(0.0, y as f64, w, 1.0);
        }
        self.fill("rgba(255,140,60,0.07)");
        self.rect(0.0, 0.0, w, 4.0);
        self.rect(0.0, h - 4.0, w, 4.0);
    }
}

impl Renderer for CanvasRenderer {
    fn render(&mut self, frame: &FrameView<'_>) {
        self.draw_background(frame);
        match frame.state.variant {
            Variant::Painter => self.draw_paint_area(frame),
            Variant::Collector => self.draw_collector(frame),
        }
        self.draw_particles(frame);
        self.draw_hud(frame);
        self.draw_scanlines(frame);
    }

    fn settings_changed(&mut self, settings: &Settings) {
        if self.lut.high_contrast() != settings.high_contrast {
            self.lut = ColorLut::new(settings.high_contrast);
        }
    }
}
