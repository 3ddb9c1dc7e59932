//! Simulation state and core entity types
//!
//! Everything the tick mutates lives in `SimulationState`, including the
//! run's RNG, so two states built from the same seed and fed the same inputs
//! stay identical tick for tick.

use glam::Vec2;

use super::canvas::PaintCanvas;
use super::mood::{MoodCycle, MoodMeter, MoodTimer, Unlocks};
use crate::consts::*;
use crate::input::{GridPoint, Tool};
use crate::pool::ObjectPool;
use crate::rng::SeededRng;

/// Which game runs on the shared core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Grid painting with stroke milestones
    #[default]
    Painter,
    /// Free movement collecting gems
    Collector,
}

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Not started yet (title card)
    Title,
    /// Ticks advance
    Playing,
    /// Ticks suspended; rendering and music continue
    Paused,
}

/// Visual kind of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleKind {
    /// Paint splash in a palette color
    Paint(u8),
    /// Gem pickup sparkle
    #[default]
    Spark,
    /// Dash trail
    Dash,
    /// Mood shift celebration
    Burst,
}

/// A particle for visual effects (pool payload)
#[derive(Debug, Clone, Default)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in seconds
    pub life: f32,
    pub kind: ParticleKind,
}

/// A collectible gem (pool payload)
#[derive(Debug, Clone, Default)]
pub struct Gem {
    pub pos: Vec2,
    /// Cosmetic bob phase
    pub phase: f32,
}

/// The player (collector) or brush cursor (painter)
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Last non-zero movement direction
    pub facing: Vec2,
    /// Ticks until the next dash is allowed
    pub dash_cooldown: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(SCREEN_W / 2.0, SCREEN_H / 2.0),
            vel: Vec2::ZERO,
            facing: Vec2::X,
            dash_cooldown: 0,
        }
    }
}

/// Painter brush settings and drag tracking
#[derive(Debug, Clone)]
pub struct Brush {
    pub tool: Tool,
    /// Radius in cells, `BRUSH_MIN..=BRUSH_MAX`
    pub radius: i32,
    /// Color index, `0..COLOR_COUNT`
    pub color: u8,
    /// A drag is in progress
    pub drawing: bool,
    /// Last cell painted during the drag
    pub last_cell: Option<GridPoint>,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            tool: Tool::Paint,
            radius: BRUSH_DEFAULT,
            color: 0,
            drawing: false,
            last_cell: None,
        }
    }
}

/// Score and milestone counters
#[derive(Debug, Clone, Default)]
pub struct Counters {
    /// Paint-tool brush applications
    pub strokes: u32,
    /// Cells that went from empty to painted
    pub cells_painted: u32,
    /// Gems awarded (painter) or collected (collector)
    pub gems: u32,
    /// Collector score
    pub score: u64,
    /// Best score across runs (strokes for the painter, score for the collector)
    pub best: u64,
    /// Completed mood shifts
    pub mood_shifts: u32,
    /// Unlock messages shown so far
    pub messages: u32,
}

/// Cosmetic switches that change how much the tick spawns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimOptions {
    pub reduced_motion: bool,
    pub perf_mode: bool,
}

/// One-shot events for the run controller (audio, persistence, HUD)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Periodic paint blip (every 8th stroke)
    PaintBlip,
    /// A gem was awarded for stroke milestones
    GemAwarded { gems: u32 },
    /// A palette unlocked
    PaletteUnlocked { count: u32, message: u32 },
    /// A gem was picked up
    GemCollected { score: u64 },
    /// Mood advanced
    MoodShift { mood: usize },
    /// Player dashed
    Dash,
    /// Best score improved
    NewBest { best: u64 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub variant: Variant,
    /// Run seed for reproducibility
    pub seed: u32,
    pub rng: SeededRng,
    pub phase: RunPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Cosmetic color wave phase, 0..1024
    pub wave: u32,
    pub player: Player,
    pub brush: Brush,
    pub canvas: PaintCanvas,
    pub particles: ObjectPool<Particle>,
    pub gems: ObjectPool<Gem>,
    pub mood: MoodCycle,
    pub meter: MoodMeter,
    pub mood_timer: MoodTimer,
    pub unlocks: Unlocks,
    pub counters: Counters,
    pub options: SimOptions,
    events: Vec<SimEvent>,
}

impl SimulationState {
    /// Create a running state with the given seed
    pub fn new(variant: Variant, seed: u32) -> Self {
        let gem_capacity = match variant {
            Variant::Painter => 0,
            Variant::Collector => GEM_COUNT,
        };
        let rng = SeededRng::new(seed);
        let mut state = Self {
            variant,
            seed: rng.state(),
            rng,
            phase: RunPhase::Playing,
            time_ticks: 0,
            wave: 0,
            player: Player::default(),
            brush: Brush::default(),
            canvas: PaintCanvas::new(),
            particles: ObjectPool::new(PARTICLE_MAX),
            gems: ObjectPool::new(gem_capacity),
            mood: MoodCycle::default(),
            meter: MoodMeter::default(),
            mood_timer: MoodTimer::new(MOOD_TIMER_TICKS),
            unlocks: Unlocks::default(),
            counters: Counters::default(),
            options: SimOptions::default(),
            events: Vec::new(),
        };
        state.spawn_gems();
        state
    }

    /// Create a running state seeded from text
    pub fn from_seed_text(variant: Variant, text: &str) -> Self {
        Self::new(variant, crate::rng::hash_seed(text))
    }

    /// Fill every free gem slot at a random position
    fn spawn_gems(&mut self) {
        while !self.gems.is_full() {
            let pos = random_field_pos(&mut self.rng);
            let phase = self.rng.next_f32() * std::f32::consts::TAU;
            if self.gems.allocate(Gem { pos, phase }).is_none() {
                break;
            }
        }
    }

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Playing
    }

    /// Toggle between playing and paused (no effect on the title card)
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            RunPhase::Playing => RunPhase::Paused,
            RunPhase::Paused => RunPhase::Playing,
            RunPhase::Title => RunPhase::Title,
        };
    }

    /// Wipe the painting and the per-run counters
    pub fn clear_art(&mut self) {
        self.canvas.clear();
        self.particles.clear();
        self.brush.drawing = false;
        self.brush.last_cell = None;
        self.counters.strokes = 0;
        self.counters.cells_painted = 0;
        self.counters.gems = 0;
        self.counters.messages = 0;
    }

    /// Drop all transient entities (run teardown)
    pub fn discard_entities(&mut self) {
        self.particles.clear();
        self.gems.clear();
        self.events.clear();
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.brush.tool = tool;
    }

    /// Grow or shrink the brush, clamped to the allowed radius range
    pub fn adjust_brush(&mut self, delta: i32) {
        self.brush.radius = (self.brush.radius + delta).clamp(BRUSH_MIN, BRUSH_MAX);
    }

    pub fn select_color(&mut self, color: u8) {
        self.brush.color = color.min(COLOR_COUNT - 1);
    }

    /// Choose a palette among the unlocked ones
    pub fn pick_palette(&mut self, index: usize) {
        self.mood.select(index, self.unlocks.count());
    }

    pub fn mood_index(&self) -> usize {
        self.mood.index()
    }
}

/// Random position inside the play field, away from the screen edges
pub fn random_field_pos(rng: &mut SeededRng) -> Vec2 {
    Vec2::new(
        rng.range_f32(GEM_MARGIN, SCREEN_W - GEM_MARGIN),
        rng.range_f32(GEM_MARGIN, SCREEN_H - GEM_MARGIN),
    )
}

/// Whether a position lies inside the gem play field
pub fn in_field(pos: Vec2) -> bool {
    (GEM_MARGIN..=SCREEN_W - GEM_MARGIN).contains(&pos.x)
        && (GEM_MARGIN..=SCREEN_H - GEM_MARGIN).contains(&pos.y)
}
