//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering, audio or platform dependencies

pub mod canvas;
pub mod mood;
pub mod state;
pub mod tick;

pub use canvas::{BrushOutcome, PaintCanvas, line_cells};
pub use mood::{MoodCycle, MoodMeter, MoodTimer, Unlocks};
pub use state::{
    Brush, Counters, Gem, Particle, ParticleKind, Player, RunPhase, SimEvent, SimOptions,
    SimulationState, Variant,
};
pub use tick::{collect_gem, paint_at, shift_mood, tick};
