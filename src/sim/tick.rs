//! Fixed timestep simulation tick
//!
//! Advances the state by exactly one step. Nothing in here reads the wall
//! clock; `dt` is always the fixed step handed over by the stepper.

use glam::Vec2;

use super::canvas::line_cells;
use super::state::{
    Gem, Particle, ParticleKind, RunPhase, SimEvent, SimulationState, Variant, in_field,
    random_field_pos,
};
use crate::consts::*;
use crate::input::{GridPoint, TickInput, Tool};
use crate::pool::{ObjectPool, SlotId};
use crate::rng::SeededRng;
use crate::wrap;

/// Ticks of a dash during which the speed cap is lifted
const DASH_BOOST_TICKS: u32 = 8;
/// Respawn attempts before accepting a spot near the player
const RESPAWN_ATTEMPTS: u32 = 4;

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimulationState, input: &TickInput, dt: f32) {
    if state.phase != RunPhase::Playing {
        return;
    }

    state.time_ticks += 1;
    let wave_step = if state.options.reduced_motion { 2 } else { 5 };
    state.wave = (state.wave + wave_step) & 1023;

    match state.variant {
        Variant::Painter => update_painter(state, input),
        Variant::Collector => update_collector(state, input, dt),
    }

    update_particles(&mut state.particles, dt);
}

// === Painter ===

fn update_painter(state: &mut SimulationState, input: &TickInput) {
    let pointer = input.pointer;
    if let Some(cell) = pointer.cell {
        state.player.pos = cell.screen_center();
    }

    if pointer.pressed {
        if let Some(cell) = pointer.cell {
            paint_at(state, cell);
            state.brush.last_cell = Some(cell);
            state.brush.drawing = true;
        }
    } else if pointer.down && state.brush.drawing {
        if let (Some(cell), Some(last)) = (pointer.cell, state.brush.last_cell) {
            if cell != last {
                // The drag's start cell was painted already
                for c in line_cells(last, cell).into_iter().skip(1) {
                    paint_at(state, c);
                }
                state.brush.last_cell = Some(cell);
            }
        }
    }

    if !pointer.down {
        state.brush.drawing = false;
    }
}

/// Apply one brush application at `cell` and evaluate stroke milestones
pub fn paint_at(state: &mut SimulationState, cell: GridPoint) {
    let brush = state.brush.clone();
    let outcome = state.canvas.apply_brush(
        cell,
        brush.radius,
        brush.tool,
        brush.color,
        state.wave,
        &mut state.rng,
    );

    if !state.options.reduced_motion {
        let count = if state.options.perf_mode { 2 } else { 4 };
        let kind = match brush.tool {
            Tool::Paint => ParticleKind::Paint(brush.color),
            Tool::Erase | Tool::Pulse => ParticleKind::Spark,
        };
        burst(&mut state.particles, &mut state.rng, cell.screen_center(), kind, count);
    }

    if brush.tool != Tool::Paint {
        return;
    }

    let counters = &mut state.counters;
    counters.cells_painted += outcome.newly_painted;
    counters.strokes += 1;
    let strokes = counters.strokes;

    if strokes as u64 > counters.best {
        counters.best = strokes as u64;
        state.push_event(SimEvent::NewBest {
            best: strokes as u64,
        });
    }

    if strokes % STROKES_PER_GEM == 0 {
        state.counters.gems += 1;
        let gems = state.counters.gems;
        state.push_event(SimEvent::GemAwarded { gems });
        // Every second gem unlocks a palette
        if gems % 2 == 0 {
            try_unlock(state);
        }
    }

    if strokes % 8 == 0 {
        state.push_event(SimEvent::PaintBlip);
    }
}

fn try_unlock(state: &mut SimulationState) {
    if state.unlocks.unlock_next() {
        let message = state.counters.messages;
        state.counters.messages += 1;
        log::info!("Palette unlocked ({} total)", state.unlocks.count());
        state.push_event(SimEvent::PaletteUnlocked {
            count: state.unlocks.count(),
            message,
        });
    }
}

// === Collector ===

fn update_collector(state: &mut SimulationState, input: &TickInput, dt: f32) {
    let mut dashed = false;
    {
        let p = &mut state.player;
        p.dash_cooldown = p.dash_cooldown.saturating_sub(1);

        if input.axes != Vec2::ZERO {
            p.facing = input.axes.normalize_or(p.facing);
        }

        p.vel += input.axes * PLAYER_ACCEL * dt;
        p.vel *= (1.0 - PLAYER_DRAG * dt).max(0.0);

        if input.action && p.dash_cooldown == 0 {
            p.vel = p.facing * DASH_SPEED;
            p.dash_cooldown = DASH_COOLDOWN_TICKS;
            dashed = true;
        }

        let boosting = p.dash_cooldown > DASH_COOLDOWN_TICKS.saturating_sub(DASH_BOOST_TICKS);
        if !boosting {
            p.vel = p.vel.clamp_length_max(PLAYER_MAX_SPEED);
        }

        p.pos += p.vel * dt;
        p.pos.x = wrap(p.pos.x, SCREEN_W);
        if p.pos.y < 0.0 {
            p.pos.y = 0.0;
            p.vel.y = 0.0;
        } else if p.pos.y > SCREEN_H {
            p.pos.y = SCREEN_H;
            p.vel.y = 0.0;
        }
    }

    if dashed {
        let pos = state.player.pos;
        burst(&mut state.particles, &mut state.rng, pos, ParticleKind::Dash, 6);
        state.push_event(SimEvent::Dash);
    }

    // Snapshot hits first; collecting mutates the pool
    let r2 = PICKUP_RADIUS * PICKUP_RADIUS;
    let player = state.player.pos;
    let hits: Vec<SlotId> = state
        .gems
        .iter_active()
        .filter(|(_, g)| g.pos.distance_squared(player) <= r2)
        .map(|(id, _)| id)
        .collect();
    for id in hits {
        collect_gem(state, id);
    }

    if state.mood_timer.tick() {
        shift_mood(state);
    }
}

/// Collect the gem in `id` and respawn it elsewhere
///
/// Returns false if the slot held no gem.
pub fn collect_gem(state: &mut SimulationState, id: SlotId) -> bool {
    let Some(old) = state.gems.get(id).map(|g| g.pos) else {
        return false;
    };
    state.gems.release(id);

    if !state.options.reduced_motion {
        let count = if state.options.perf_mode { 3 } else { 6 };
        burst(&mut state.particles, &mut state.rng, old, ParticleKind::Spark, count);
    }

    // Respawn away from the pickup spot and the player
    let clear = PICKUP_RADIUS * PICKUP_RADIUS * 4.0;
    let player = state.player.pos;
    let mut pos = random_field_pos(&mut state.rng);
    for _ in 0..RESPAWN_ATTEMPTS {
        if pos.distance_squared(old) > clear && pos.distance_squared(player) > clear {
            break;
        }
        pos = random_field_pos(&mut state.rng);
    }
    debug_assert!(in_field(pos));
    let phase = state.rng.next_f32() * std::f32::consts::TAU;
    // The slot released above is free, so this cannot fail
    state.gems.allocate(Gem { pos, phase });

    let counters = &mut state.counters;
    counters.gems += 1;
    counters.score += GEM_SCORE;
    let score = counters.score;
    let new_best = score > counters.best;
    if new_best {
        counters.best = score;
    }
    state.push_event(SimEvent::GemCollected { score });
    if new_best {
        state.push_event(SimEvent::NewBest { best: score });
    }

    if state.meter.fill(MOOD_PER_GEM) {
        shift_mood(state);
    }
    true
}

/// Advance the mood, reset meter and timer, and celebrate
pub fn shift_mood(state: &mut SimulationState) {
    let mood = state.mood.advance();
    state.meter.reset();
    state.mood_timer.rearm();
    state.counters.mood_shifts += 1;
    log::debug!("Mood shift -> {}", mood);
    state.push_event(SimEvent::MoodShift { mood });

    if !state.options.reduced_motion {
        let center = Vec2::new(SCREEN_W / 2.0, SCREEN_H / 2.0);
        let count = if state.options.perf_mode { 8 } else { 16 };
        burst(&mut state.particles, &mut state.rng, center, ParticleKind::Burst, count);
    }

    // Unlocks land on alternating shifts
    if state.counters.mood_shifts % 2 == 0 {
        try_unlock(state);
    }
}

// === Particles ===

/// Spawn up to `count` particles at `pos`; silently stops when the pool is full
pub fn burst(
    pool: &mut ObjectPool<Particle>,
    rng: &mut SeededRng,
    pos: Vec2,
    kind: ParticleKind,
    count: u32,
) -> u32 {
    let speed_scale = match kind {
        ParticleKind::Burst => 3.0,
        ParticleKind::Dash => 0.5,
        ParticleKind::Paint(_) | ParticleKind::Spark => 1.0,
    };
    let mut spawned = 0;
    for _ in 0..count {
        let slot = pool.allocate_with(|p| {
            let angle = rng.next_f32() * std::f32::consts::TAU;
            let speed = (8.0 + rng.next_f32() * 18.0) * speed_scale;
            p.pos = pos;
            p.vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            p.life = 0.25 + rng.next_f32() * 0.35;
            p.kind = kind;
        });
        if slot.is_none() {
            break;
        }
        spawned += 1;
    }
    spawned
}

/// Integrate particles and release the expired ones
pub fn update_particles(pool: &mut ObjectPool<Particle>, dt: f32) {
    pool.retain_active(|_, p| {
        p.life -= dt;
        if p.life <= 0.0 {
            return false;
        }
        p.vel.y += PARTICLE_GRAVITY * dt;
        p.pos += p.vel * dt;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerState;
    use crate::sim::mood::Unlocks;

    const DT: f32 = FIXED_DT as f32;

    fn press(cell: GridPoint) -> TickInput {
        TickInput {
            pointer: PointerState {
                cell: Some(cell),
                down: true,
                pressed: true,
            },
            ..Default::default()
        }
    }

    fn release() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_paused_state_does_not_tick() {
        let mut state = SimulationState::new(Variant::Painter, 5);
        state.toggle_pause();
        tick(&mut state, &press(GridPoint::new(3, 3)), DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.counters.strokes, 0);
    }

    #[test]
    fn test_forty_paint_actions_award_a_gem() {
        let mut state = SimulationState::from_seed_text(Variant::Painter, "2024-1-1");
        let mut gem_events = 0;

        for i in 0..40 {
            let cell = GridPoint::new((i % 8) * 8, (i / 8) * 8);
            tick(&mut state, &press(cell), DT);
            tick(&mut state, &release(), DT);
            for event in state.drain_events() {
                if let SimEvent::GemAwarded { .. } = event {
                    gem_events += 1;
                    assert_eq!(i, 39, "gem must land on the 40th action");
                }
            }
        }

        assert_eq!(state.counters.strokes, 40);
        assert_eq!(state.counters.gems, 1);
        assert_eq!(gem_events, 1);
        assert_eq!(state.counters.best, 40);
    }

    #[test]
    fn test_unlock_on_alternating_gems() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        let mut unlock_at = Vec::new();
        for i in 0..(STROKES_PER_GEM * 4) {
            paint_at(&mut state, GridPoint::new((i % 64) as i32, 0));
            let gems = state.counters.gems;
            for event in state.drain_events() {
                if let SimEvent::PaletteUnlocked { count, .. } = event {
                    unlock_at.push((gems, count));
                }
            }
        }
        assert_eq!(state.counters.gems, 4);
        assert_eq!(unlock_at, vec![(2, 2), (4, 3)]);
        assert!(state.unlocks.all_unlocked());
    }

    #[test]
    fn test_drag_paints_line_without_recounting_start() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        state.brush.radius = 1;
        tick(&mut state, &press(GridPoint::new(10, 10)), DT);
        let drag = TickInput {
            pointer: PointerState {
                cell: Some(GridPoint::new(14, 10)),
                down: true,
                pressed: false,
            },
            ..Default::default()
        };
        tick(&mut state, &drag, DT);
        // Start cell plus four cells along the line
        assert_eq!(state.counters.strokes, 5);
        assert_eq!(state.brush.last_cell, Some(GridPoint::new(14, 10)));

        tick(&mut state, &release(), DT);
        assert!(!state.brush.drawing);
    }

    #[test]
    fn test_erase_does_not_count_strokes() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        paint_at(&mut state, GridPoint::new(5, 5));
        state.set_tool(Tool::Erase);
        paint_at(&mut state, GridPoint::new(5, 5));
        assert_eq!(state.counters.strokes, 1);
        assert_eq!(state.canvas.painted_cells(), 0);
    }

    #[test]
    fn test_paint_with_raw_brush_color() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        state.brush.color = u8::MAX;
        paint_at(&mut state, GridPoint::new(5, 5));
        assert_eq!(state.canvas.color_at(GridPoint::new(5, 5)), crate::consts::COLOR_COUNT);
        assert_eq!(state.counters.strokes, 1);
    }

    #[test]
    fn test_reduced_motion_spawns_no_particles() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        state.options.reduced_motion = true;
        paint_at(&mut state, GridPoint::new(5, 5));
        assert_eq!(state.particles.active_count(), 0);

        state.options.reduced_motion = false;
        paint_at(&mut state, GridPoint::new(5, 5));
        assert_eq!(state.particles.active_count(), 4);
    }

    #[test]
    fn test_particles_expire() {
        let mut state = SimulationState::new(Variant::Painter, 3);
        paint_at(&mut state, GridPoint::new(5, 5));
        assert!(state.particles.active_count() > 0);
        // Max life is 0.6s
        for _ in 0..40 {
            tick(&mut state, &release(), DT);
        }
        assert_eq!(state.particles.active_count(), 0);
    }

    #[test]
    fn test_burst_stops_when_pool_full() {
        let mut pool = ObjectPool::<Particle>::new(5);
        let mut rng = SeededRng::new(1);
        let n = burst(&mut pool, &mut rng, Vec2::ZERO, ParticleKind::Spark, 8);
        assert_eq!(n, 5);
        assert!(pool.is_full());
        assert_eq!(burst(&mut pool, &mut rng, Vec2::ZERO, ParticleKind::Spark, 1), 0);
    }

    #[test]
    fn test_collect_always_available_gems() {
        let mut state = SimulationState::from_seed_text(Variant::Collector, "2024-1-1");
        let capacity = state.gems.capacity();
        assert_eq!(capacity, GEM_COUNT);

        for _ in 0..25 {
            let (id, pos) = state
                .gems
                .iter_active()
                .map(|(id, g)| (id, g.pos))
                .next()
                .unwrap();
            state.player.pos = pos;
            state.player.vel = Vec2::ZERO;
            tick(&mut state, &TickInput::default(), DT);

            assert!(state.gems.active_count() <= capacity);
            assert_eq!(state.gems.active_count(), capacity);
            let respawned = state.gems.get(id).unwrap().pos;
            assert!(in_field(respawned));
            assert_ne!(respawned, pos);
        }
        assert!(state.counters.gems >= 25);
        assert_eq!(state.counters.score, state.counters.gems as u64 * GEM_SCORE);
    }

    #[test]
    fn test_meter_full_shifts_mood() {
        let mut state = SimulationState::new(Variant::Collector, 11);
        let per_shift = MOOD_METER_FULL.div_ceil(MOOD_PER_GEM);
        let mut shifts = 0;
        for _ in 0..per_shift {
            let id = state.gems.iter_active().next().map(|(id, _)| id).unwrap();
            assert!(collect_gem(&mut state, id));
            shifts += state
                .drain_events()
                .filter(|e| matches!(e, SimEvent::MoodShift { .. }))
                .count();
        }
        assert_eq!(shifts, 1);
        assert_eq!(state.mood_index(), 1);
        assert_eq!(state.meter.units(), 0);
    }

    #[test]
    fn test_mood_timer_shifts_and_cycles() {
        let mut state = SimulationState::new(Variant::Collector, 11);
        // Park the player off-field so nothing is collected
        state.player.pos = Vec2::new(SCREEN_W / 2.0, 0.0);
        state.gems.clear();
        for _ in 0..MOOD_TIMER_TICKS * 3 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.counters.mood_shifts, 3);
        assert_eq!(state.mood_index(), 0);
        assert_eq!(state.unlocks.count(), 2);
    }

    #[test]
    fn test_dash_has_cooldown() {
        let mut state = SimulationState::new(Variant::Collector, 2);
        state.gems.clear();
        let dash = TickInput {
            action: true,
            ..Default::default()
        };
        tick(&mut state, &dash, DT);
        assert!(state.player.vel.length() > PLAYER_MAX_SPEED);
        let dashes = state
            .drain_events()
            .filter(|e| *e == SimEvent::Dash)
            .count();
        assert_eq!(dashes, 1);

        tick(&mut state, &dash, DT);
        assert_eq!(state.drain_events().filter(|e| *e == SimEvent::Dash).count(), 0);
    }

    #[test]
    fn test_player_wraps_and_clamps() {
        let mut state = SimulationState::new(Variant::Collector, 2);
        state.gems.clear();
        state.player.pos = Vec2::new(SCREEN_W - 0.5, SCREEN_H - 0.5);
        state.player.vel = Vec2::new(100.0, 100.0);
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.player.pos.x < 10.0);
        assert_eq!(state.player.pos.y, SCREEN_H);
        assert_eq!(state.player.vel.y, 0.0);
    }

    #[test]
    fn test_determinism() {
        let mut a = SimulationState::new(Variant::Collector, 99_999);
        let mut b = SimulationState::new(Variant::Collector, 99_999);
        let mut input = TickInput::default();
        for i in 0..600 {
            input.set_axes(((i / 40) % 3) as f32 - 1.0, ((i / 70) % 3) as f32 - 1.0);
            input.action = i % 90 == 0;
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.counters.score, b.counters.score);
        assert_eq!(a.rng, b.rng);
        let ga: Vec<_> = a.gems.iter_active().map(|(_, g)| g.pos).collect();
        let gb: Vec<_> = b.gems.iter_active().map(|(_, g)| g.pos).collect();
        assert_eq!(ga, gb);
    }

    #[test]
    fn test_unlock_count_saturates_in_collector() {
        let mut state = SimulationState::new(Variant::Collector, 4);
        state.unlocks = Unlocks::with_count(3);
        shift_mood(&mut state);
        shift_mood(&mut state);
        assert!(
            !state
                .drain_events()
                .any(|e| matches!(e, SimEvent::PaletteUnlocked { .. }))
        );
    }
}
