//! World Painter - shared simulation core for the painter and collector games
//!
//! Core modules:
//! - `rng`: Deterministic xorshift stream and text seeding
//! - `pool`: Fixed-capacity slot pool for particles and gems
//! - `stepper`: Fixed timestep accumulator
//! - `sim`: Deterministic simulation (canvas, player, mood, tick)
//! - `audio`: Look-ahead music scheduler and audio command model
//! - `renderer`: Read-only frame views and the paint layer rasterizer
//! - `persistence`: Versioned save record with tolerant loading
//! - `run`: Top-level run controller tying the pieces together

pub mod audio;
pub mod input;
pub mod palette;
pub mod persistence;
pub mod pool;
pub mod renderer;
pub mod rng;
pub mod run;
pub mod settings;
pub mod sim;
pub mod stepper;

pub use pool::{ObjectPool, SlotId};
pub use rng::SeededRng;
pub use run::RunController;
pub use settings::Settings;
pub use stepper::TimeStepper;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const FIXED_DT: f64 = 1.0 / 60.0;
    /// Largest wall-clock delta accepted per frame; anything beyond is dropped
    pub const MAX_FRAME_DELTA: f64 = 0.25;

    /// Logical screen size (pixels)
    pub const SCREEN_W: f32 = 320.0;
    pub const SCREEN_H: f32 = 180.0;

    /// Paint grid dimensions (cells)
    pub const GRID_W: i32 = 64;
    pub const GRID_H: i32 = 48;
    /// Cell size on screen (pixels)
    pub const CELL: i32 = 3;
    /// Paint area origin on screen
    pub const PAINT_X: i32 = 64;
    pub const PAINT_Y: i32 = 18;
    pub const PAINT_W: i32 = GRID_W * CELL;
    pub const PAINT_H: i32 = GRID_H * CELL;

    /// Brush radius limits (cells)
    pub const BRUSH_MIN: i32 = 1;
    pub const BRUSH_MAX: i32 = 4;
    pub const BRUSH_DEFAULT: i32 = 2;
    /// Number of selectable paint colors
    pub const COLOR_COUNT: u8 = 8;

    /// Particle pool capacity
    pub const PARTICLE_MAX: usize = 180;
    /// Downward pull on particles (pixels/s²)
    pub const PARTICLE_GRAVITY: f32 = 16.0;

    /// Strokes needed for one gem
    pub const STROKES_PER_GEM: u32 = 40;

    /// Collector gem pool capacity
    pub const GEM_COUNT: usize = 20;
    /// Pickup radius around the player (pixels)
    pub const PICKUP_RADIUS: f32 = 8.0;
    /// Play field margin gems keep from the screen edge
    pub const GEM_MARGIN: f32 = 8.0;

    /// Player movement
    pub const PLAYER_ACCEL: f32 = 600.0;
    pub const PLAYER_DRAG: f32 = 4.0;
    pub const PLAYER_MAX_SPEED: f32 = 120.0;
    pub const DASH_SPEED: f32 = 220.0;
    pub const DASH_COOLDOWN_TICKS: u32 = 36;

    /// Mood meter units; the meter is full at this value
    pub const MOOD_METER_FULL: u32 = 1000;
    /// Meter units added per collected gem (8 gems fill the meter)
    pub const MOOD_PER_GEM: u32 = 125;
    /// Ticks before the mood shifts on its own (20 s)
    pub const MOOD_TIMER_TICKS: u32 = 20 * 60;

    /// Score per collected gem
    pub const GEM_SCORE: u64 = 10;
}

/// Whether a cell coordinate lies on the paint grid
#[inline]
pub fn in_grid(gx: i32, gy: i32) -> bool {
    (0..consts::GRID_W).contains(&gx) && (0..consts::GRID_H).contains(&gy)
}

/// Wrap a value into [0, max)
#[inline]
pub fn wrap(value: f32, max: f32) -> f32 {
    let v = value % max;
    if v < 0.0 { v + max } else { v }
}
