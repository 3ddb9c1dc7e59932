//! Run controller
//!
//! Owns everything a run needs (simulation, stepper, input, audio, save
//! record) and exposes the two host entry points: `frame` for the display
//! callback and `audio_tick` for the audio timer. Both run on the same
//! thread and never overlap.

use crate::audio::{AudioBackend, AudioScheduler, Mixer, Sfx, play_sfx};
use crate::input::{TickInput, UiCommand};
use crate::palette;
use crate::persistence::{self, PersistenceStore, SaveRecord};
use crate::renderer::{FrameView, Renderer};
use crate::rng::resolve_seed_text;
use crate::settings::Settings;
use crate::sim::{RunPhase, SimEvent, SimulationState, Unlocks, Variant, tick};
use crate::stepper::{FpsMeter, FrameStep, TimeStepper};

/// How long an unlock message stays on screen (seconds)
const MESSAGE_SECONDS: f64 = 3.0;

pub struct RunController<A: AudioBackend> {
    variant: Variant,
    seed_text: String,
    state: SimulationState,
    stepper: TimeStepper,
    fps: FpsMeter,
    input: TickInput,
    audio: A,
    scheduler: AudioScheduler,
    mixer: Mixer,
    store: Box<dyn PersistenceStore>,
    record: SaveRecord,
    dirty: bool,
    settings_changed: bool,
    message: Option<(&'static str, f64)>,
}

impl<A: AudioBackend> RunController<A> {
    /// Load the save record and sit on the title card
    pub fn new(variant: Variant, mut audio: A, store: Box<dyn PersistenceStore>) -> Self {
        let record = persistence::load(store.as_ref());
        let mixer = Mixer::new(record.settings.volume, record.settings.muted);
        mixer.apply(&mut audio);

        let mut state = SimulationState::new(variant, 1);
        state.phase = RunPhase::Title;

        Self {
            variant,
            seed_text: String::new(),
            state,
            stepper: TimeStepper::default(),
            fps: FpsMeter::default(),
            input: TickInput::default(),
            audio,
            scheduler: AudioScheduler::default(),
            mixer,
            store,
            record,
            dirty: false,
            settings_changed: true,
            message: None,
        }
    }

    /// Start a run from the optional user seed (today's date otherwise)
    pub fn start(&mut self, seed: Option<&str>) {
        self.seed_text = resolve_seed_text(seed);
        self.begin();
        // Audio starts from the user gesture that started the run
        self.scheduler.start(&mut self.audio);
    }

    /// Start over with the same seed
    pub fn restart(&mut self) {
        if self.seed_text.is_empty() {
            self.seed_text = resolve_seed_text(None);
        }
        self.begin();
    }

    fn begin(&mut self) {
        let mut state = SimulationState::from_seed_text(self.variant, &self.seed_text);
        state.unlocks = Unlocks::with_count(self.record.unlocked_count);
        state.counters.best = self.record.best_score;
        state.options = self.record.settings.sim_options();
        self.state = state;
        self.stepper.reset();
        self.input = TickInput::default();
        self.message = None;
        log::info!(
            "Run started: {:?}, seed '{}' ({:#010x})",
            self.variant,
            self.seed_text,
            self.state.seed
        );
    }

    /// Stop audio, drop pooled entities and flush the save
    pub fn teardown(&mut self) {
        self.scheduler.stop();
        self.state.discard_entities();
        self.state.phase = RunPhase::Title;
        self.input = TickInput::default();
        self.persist();
        log::info!("Run torn down after {} ticks", self.state.time_ticks);
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn seed_text(&self) -> &str {
        &self.seed_text
    }

    pub fn settings(&self) -> &Settings {
        &self.record.settings
    }

    pub fn record(&self) -> &SaveRecord {
        &self.record
    }

    /// Input the host writes into between frames
    pub fn input_mut(&mut self) -> &mut TickInput {
        &mut self.input
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn scheduler(&self) -> &AudioScheduler {
        &self.scheduler
    }

    pub fn fps(&self) -> &FpsMeter {
        &self.fps
    }

    pub fn toggle_pause(&mut self) {
        self.state.toggle_pause();
        log::info!("Phase: {:?}", self.state.phase);
    }

    /// Pause if playing (tab hidden, focus lost)
    pub fn pause(&mut self) {
        if self.state.is_running() {
            self.toggle_pause();
        }
    }

    /// Apply a discrete UI command
    pub fn apply(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::TogglePause => self.toggle_pause(),
            UiCommand::ToggleFps => self.update_settings(|s| s.show_fps = !s.show_fps),
            UiCommand::ToggleMute => self.update_settings(|s| s.muted = !s.muted),
            UiCommand::TogglePerfMode => self.update_settings(|s| s.perf_mode = !s.perf_mode),
            UiCommand::ToggleScanlines => self.update_settings(|s| s.scanlines = !s.scanlines),
            UiCommand::ToggleReducedMotion => {
                self.update_settings(|s| s.reduced_motion = !s.reduced_motion)
            }
            UiCommand::ToggleHighContrast => {
                self.update_settings(|s| s.high_contrast = !s.high_contrast)
            }
            UiCommand::SetVolume(v) => self.update_settings(|s| s.set_volume(v)),
            UiCommand::ClearArt => self.state.clear_art(),
            UiCommand::BrushSmaller => self.state.adjust_brush(-1),
            UiCommand::BrushLarger => self.state.adjust_brush(1),
            UiCommand::SelectColor(c) => self.state.select_color(c),
            UiCommand::SelectTool(t) => self.state.set_tool(t),
            UiCommand::PickPalette(i) => self.state.pick_palette(i),
        }
    }

    /// Change settings; they are clamped, applied and saved
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        let before = self.record.settings.clone();
        f(&mut self.record.settings);
        let volume = &mut self.record.settings.volume;
        *volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            before.volume
        };

        if self.record.settings == before {
            return;
        }
        let settings = &self.record.settings;
        self.state.options = settings.sim_options();
        self.mixer = Mixer::new(settings.volume, settings.muted);
        self.mixer.apply(&mut self.audio);
        self.settings_changed = true;
        self.dirty = true;
        self.persist();
    }

    /// Display callback: run due ticks, then render exactly once
    pub fn frame(&mut self, now: f64, renderer: &mut dyn Renderer) -> FrameStep {
        let step = {
            let state = &mut self.state;
            let input = &mut self.input;
            self.stepper.advance(now, |dt| {
                tick(state, input, dt as f32);
                input.clear_one_shots();
            })
        };
        if step.dt > 0.0 {
            self.fps.record(step.dt);
        }

        self.handle_events(now);
        if self.dirty {
            self.persist();
        }
        if self.message.is_some_and(|(_, until)| now >= until) {
            self.message = None;
        }

        if self.settings_changed {
            renderer.settings_changed(&self.record.settings);
            self.settings_changed = false;
        }
        let settings = &self.record.settings;
        renderer.render(&FrameView {
            state: &self.state,
            settings,
            time: now,
            fps: settings.show_fps.then(|| self.fps.fps()),
            frame_ms: settings.show_fps.then(|| self.fps.frame_ms()),
            message: self.message.map(|(text, _)| text),
        });
        step
    }

    /// Audio timer callback
    pub fn audio_tick(&mut self) -> usize {
        self.scheduler.schedule(&mut self.audio)
    }

    fn handle_events(&mut self, now: f64) {
        let events: Vec<SimEvent> = self.state.drain_events().collect();
        for event in events {
            match event {
                SimEvent::PaintBlip => self.sfx(Sfx::Paint),
                SimEvent::GemAwarded { gems } => log::debug!("Gem awarded ({})", gems),
                SimEvent::PaletteUnlocked { count, message } => {
                    self.record.unlocked_count = self.record.unlocked_count.max(count);
                    self.dirty = true;
                    self.message = Some((palette::unlock_message(message), now + MESSAGE_SECONDS));
                    self.sfx(Sfx::Unlock);
                }
                SimEvent::GemCollected { .. } => self.sfx(Sfx::Gem),
                SimEvent::MoodShift { .. } => self.sfx(Sfx::MoodShift),
                SimEvent::Dash => self.sfx(Sfx::Dash),
                SimEvent::NewBest { best } => {
                    if best > self.record.best_score {
                        self.record.best_score = best;
                        self.dirty = true;
                    }
                }
            }
        }
    }

    fn sfx(&mut self, sfx: Sfx) {
        play_sfx(&mut self.audio, sfx);
    }

    fn persist(&mut self) {
        if let Err(e) = persistence::save(self.store.as_mut(), &self.record) {
            log::warn!("Failed to save: {}", e);
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CommandRecorder, Sound};
    use crate::consts::FIXED_DT;
    use crate::input::{GridPoint, PointerState};
    use crate::persistence::MemoryStore;
    use crate::renderer::FrameLog;

    fn controller(variant: Variant, store: &MemoryStore) -> RunController<CommandRecorder> {
        RunController::new(variant, CommandRecorder::new(), Box::new(store.clone()))
    }

    fn press(ctl: &mut RunController<CommandRecorder>, cell: GridPoint) {
        ctl.input_mut().pointer = PointerState {
            cell: Some(cell),
            down: true,
            pressed: true,
        };
    }

    #[test]
    fn test_title_does_not_tick() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        let mut log = FrameLog::new();
        ctl.frame(0.0, &mut log);
        let step = ctl.frame(0.1, &mut log);
        assert!(step.ticks > 0);
        assert_eq!(ctl.state().time_ticks, 0);
        assert_eq!(log.frames.len(), 2);
    }

    #[test]
    fn test_ticks_run_before_render() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("2024-1-1"));
        let mut log = FrameLog::new();

        ctl.frame(1.0, &mut log);
        press(&mut ctl, GridPoint::new(10, 10));
        ctl.frame(1.0 + 3.0 * FIXED_DT + 1e-9, &mut log);

        let (_, ticks, painted) = log.frames[1];
        assert_eq!(ticks, 3);
        assert!(painted > 0, "render saw the paint from this frame's ticks");
        // The press was consumed by the first tick only
        assert_eq!(ctl.state().counters.strokes, 1);
        assert!(!ctl.input_mut().pointer.pressed);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Collector, &store);
        ctl.start(Some("seed"));
        let mut log = FrameLog::new();
        ctl.frame(0.0, &mut log);
        ctl.frame(0.1, &mut log);
        let ticks = ctl.state().time_ticks;
        ctl.apply(UiCommand::TogglePause);
        ctl.frame(0.2, &mut log);
        assert_eq!(ctl.state().time_ticks, ticks);
        assert_eq!(log.frames.len(), 3);
        ctl.apply(UiCommand::TogglePause);
        ctl.frame(0.3, &mut log);
        assert!(ctl.state().time_ticks > ticks);
    }

    #[test]
    fn test_best_score_persisted() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("2024-1-1"));
        let mut log = FrameLog::new();
        let mut now = 0.0;
        ctl.frame(now, &mut log);
        for i in 0..10 {
            press(&mut ctl, GridPoint::new(i * 4, 5));
            now += FIXED_DT * 1.5;
            ctl.frame(now, &mut log);
        }
        assert_eq!(ctl.record().best_score, 10);
        let saved = persistence::load(&store);
        assert_eq!(saved.best_score, 10);

        // A new controller restores it
        let mut again = controller(Variant::Painter, &store);
        again.start(Some("other"));
        assert_eq!(again.state().counters.best, 10);
    }

    #[test]
    fn test_unlock_saves_and_shows_message() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("x"));
        ctl.state.counters.strokes = 79;
        ctl.state.counters.gems = 1;
        ctl.state.push_event(SimEvent::PaletteUnlocked {
            count: 2,
            message: 1,
        });
        let mut log = FrameLog::new();
        ctl.frame(0.0, &mut log);
        assert_eq!(ctl.record().unlocked_count, 2);
        assert_eq!(persistence::load(&store).unlocked_count, 2);
        assert_eq!(ctl.message.map(|(m, _)| m), Some(palette::unlock_message(1)));

        ctl.frame(MESSAGE_SECONDS + 0.1, &mut log);
        assert!(ctl.message.is_none());
    }

    #[test]
    fn test_paint_blip_reaches_audio() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("x"));
        ctl.audio_mut().take();
        ctl.state.push_event(SimEvent::PaintBlip);
        ctl.frame(0.0, &mut FrameLog::new());
        let cmds = ctl.audio().commands();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0].sound, Sound::Tone { .. }));
    }

    #[test]
    fn test_music_starts_with_run_and_stops_on_teardown() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Collector, &store);
        assert!(!ctl.scheduler().is_playing());
        ctl.start(None);
        assert!(ctl.scheduler().is_playing());
        assert!(ctl.audio_tick() > 0);

        ctl.teardown();
        assert!(!ctl.scheduler().is_playing());
        assert_eq!(ctl.audio_tick(), 0);
        assert_eq!(ctl.state().gems.active_count(), 0);
        assert_eq!(ctl.phase(), RunPhase::Title);
    }

    #[test]
    fn test_settings_applied_and_saved() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.apply(UiCommand::ToggleMute);
        assert_eq!(ctl.audio().master_gain(), 0.0);
        ctl.apply(UiCommand::ToggleMute);
        ctl.apply(UiCommand::SetVolume(7.0));
        assert_eq!(ctl.audio().master_gain(), 1.0);
        assert_eq!(persistence::load(&store).settings.volume, 1.0);

        ctl.update_settings(|s| s.reduced_motion = true);
        assert!(ctl.state().options.reduced_motion);
        assert!(persistence::load(&store).settings.reduced_motion);
    }

    #[test]
    fn test_perf_mode_command() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("a"));
        ctl.apply(UiCommand::TogglePerfMode);
        assert!(ctl.settings().perf_mode);
        assert!(ctl.state().options.perf_mode);
        assert!(!ctl.settings().effective_scanlines());
        assert!(persistence::load(&store).settings.perf_mode);
    }

    #[test]
    fn test_scanlines_command() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        assert!(ctl.settings().scanlines);
        ctl.apply(UiCommand::ToggleScanlines);
        assert!(!ctl.settings().scanlines);
        assert!(!persistence::load(&store).settings.scanlines);
    }

    #[test]
    fn test_reduced_motion_command() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("a"));
        ctl.apply(UiCommand::ToggleReducedMotion);
        assert!(ctl.state().options.reduced_motion);

        let mut log = FrameLog::new();
        ctl.frame(0.0, &mut log);
        press(&mut ctl, GridPoint::new(3, 3));
        ctl.frame(FIXED_DT * 1.5, &mut log);
        assert_eq!(ctl.state().particles.active_count(), 0);
        assert!(persistence::load(&store).settings.reduced_motion);
    }

    #[test]
    fn test_high_contrast_command_reaches_renderer() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("a"));
        ctl.apply(UiCommand::ToggleHighContrast);
        assert!(ctl.settings().high_contrast);
        assert!(persistence::load(&store).settings.high_contrast);

        let mut log = FrameLog::new();
        ctl.frame(0.0, &mut log);
        press(&mut ctl, GridPoint::new(3, 3));
        ctl.frame(FIXED_DT * 1.5, &mut log);
        let lut = crate::renderer::ColorLut::new(true);
        let state = ctl.state();
        let cell = GridPoint::new(3, 3);
        let expected = lut.get(
            state.mood_index(),
            state.canvas.color_at(cell) as usize - 1,
            (state.wave + state.canvas.pulse_at(cell) as u32) as usize,
        );
        assert_eq!(log.layer().pixel(9, 9), Some(expected));
    }

    #[test]
    fn test_palette_pick_limited_to_unlocked() {
        let store = MemoryStore::new();
        let mut ctl = controller(Variant::Painter, &store);
        ctl.start(Some("a"));
        ctl.apply(UiCommand::PickPalette(2));
        assert_eq!(ctl.state().mood_index(), 0);

        ctl.state.unlocks = Unlocks::with_count(3);
        ctl.apply(UiCommand::PickPalette(2));
        assert_eq!(ctl.state().mood_index(), 2);
    }

    #[test]
    fn test_corrupt_save_falls_back() {
        let store = MemoryStore::with_contents("\u{0}garbage");
        let mut ctl = controller(Variant::Painter, &store);
        assert_eq!(ctl.record(), &SaveRecord::default());
        ctl.start(Some("a"));
        assert_eq!(ctl.state().unlocks.count(), 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let store = MemoryStore::new();
        let mut a = controller(Variant::Collector, &store);
        let mut b = controller(Variant::Collector, &MemoryStore::new());
        a.start(Some("2024-1-1"));
        b.start(Some(" 2024-1-1 "));
        assert_eq!(a.state().seed, b.state().seed);
        assert_eq!(a.seed_text(), "2024-1-1");
    }
}
