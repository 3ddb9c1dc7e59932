//! Audio system
//!
//! Procedurally generated music and sound effects - no external files needed!
//! The scheduler and the sfx helpers only produce `AudioCommand`s; a backend
//! turns them into sound (Web Audio in the browser, a recorder elsewhere).

pub mod pattern;
pub mod recorder;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub use pattern::{Percussion, REST, STEPS_PER_ROW, Song, VoiceSpec};
pub use recorder::CommandRecorder;
pub use scheduler::{AudioScheduler, LOOK_AHEAD, START_DELAY, TIMER_INTERVAL_MS};
#[cfg(target_arch = "wasm32")]
pub use web::WebAudioBackend;

/// Length of the shared noise burst (seconds)
pub const NOISE_SECONDS: f64 = 0.06;
/// Fixed bus levels under the master gain
pub const MUSIC_BUS_GAIN: f32 = 0.7;
pub const SFX_BUS_GAIN: f32 = 0.8;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timbre {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// What a command plays
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sound {
    /// Pitched oscillator
    Tone { hz: f32, timbre: Timbre },
    /// The shared decaying noise burst
    Noise,
}

/// Mixer bus a command is routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Music,
    Sfx,
}

impl Bus {
    pub fn gain(self) -> f32 {
        match self {
            Bus::Music => MUSIC_BUS_GAIN,
            Bus::Sfx => SFX_BUS_GAIN,
        }
    }
}

/// One sound placed at an absolute backend time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioCommand {
    /// Start time on the backend clock (seconds)
    pub time: f64,
    pub sound: Sound,
    /// Seconds
    pub duration: f64,
    /// Peak gain before bus and master levels
    pub gain: f32,
    pub bus: Bus,
}

impl AudioCommand {
    pub fn tone(time: f64, duration: f64, note: i32, timbre: Timbre, gain: f32, bus: Bus) -> Self {
        Self {
            time,
            sound: Sound::Tone {
                hz: midi_to_hz(note),
                timbre,
            },
            duration,
            gain,
            bus,
        }
    }

    pub fn noise(time: f64, gain: f32, bus: Bus) -> Self {
        Self {
            time,
            sound: Sound::Noise,
            duration: NOISE_SECONDS,
            gain,
            bus,
        }
    }
}

/// Sink for audio commands with its own monotonic clock
pub trait AudioBackend {
    /// Whether the backend can make sound at all
    fn is_available(&self) -> bool;

    /// Backend clock in seconds
    fn current_time(&self) -> f64;

    /// Queue a command for playback at `cmd.time`
    fn submit(&mut self, cmd: &AudioCommand);

    /// Set the master output level (0.0 - 1.0)
    fn set_master_gain(&mut self, gain: f32);

    /// Resume a suspended output (browsers require a user gesture)
    fn resume(&mut self) {}
}

/// A missing backend is a silent one
impl<B: AudioBackend> AudioBackend for Option<B> {
    fn is_available(&self) -> bool {
        self.as_ref().is_some_and(B::is_available)
    }

    fn current_time(&self) -> f64 {
        self.as_ref().map_or(0.0, B::current_time)
    }

    fn submit(&mut self, cmd: &AudioCommand) {
        if let Some(backend) = self {
            backend.submit(cmd);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        if let Some(backend) = self {
            backend.set_master_gain(gain);
        }
    }

    fn resume(&mut self) {
        if let Some(backend) = self {
            backend.resume();
        }
    }
}

/// Master volume and mute state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer {
    volume: f32,
    muted: bool,
}

impl Default for Mixer {
    fn default() -> Self {
        Self {
            volume: crate::settings::DEFAULT_VOLUME,
            muted: false,
        }
    }
}

impl Mixer {
    pub fn new(volume: f32, muted: bool) -> Self {
        let mut mixer = Self { volume: 0.0, muted };
        mixer.set_volume(volume);
        mixer
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Get effective volume
    pub fn master_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// Push the current level to a backend
    pub fn apply(&self, backend: &mut impl AudioBackend) {
        backend.set_master_gain(self.master_gain());
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    /// Periodic blip while painting
    Paint,
    /// Palette unlocked
    Unlock,
    /// Gem picked up
    Gem,
    /// Mood shifted
    MoodShift,
    /// Player dashed
    Dash,
}

impl Sfx {
    /// Commands for this effect starting at `t`
    pub fn commands(self, t: f64) -> Vec<AudioCommand> {
        use Timbre::*;
        let b = Bus::Sfx;
        match self {
            Sfx::Paint => vec![AudioCommand::tone(t, 0.05, 79, Square, 0.04, b)],
            Sfx::Unlock => vec![
                AudioCommand::tone(t, 0.08, 72, Triangle, 0.06, b),
                AudioCommand::tone(t + 0.06, 0.12, 79, Square, 0.06, b),
            ],
            Sfx::Gem => vec![
                AudioCommand::tone(t, 0.06, 84, Square, 0.05, b),
                AudioCommand::tone(t + 0.04, 0.08, 91, Triangle, 0.04, b),
            ],
            Sfx::MoodShift => [72, 76, 79, 84]
                .iter()
                .enumerate()
                .map(|(i, &n)| AudioCommand::tone(t + i as f64 * 0.07, 0.1, n, Triangle, 0.05, b))
                .collect(),
            Sfx::Dash => vec![
                AudioCommand::noise(t, 0.05, b),
                AudioCommand::tone(t, 0.07, 55, Sawtooth, 0.03, b),
            ],
        }
    }
}

/// Play a sound effect now; silently does nothing without a backend
pub fn play_sfx(backend: &mut impl AudioBackend, sfx: Sfx) -> usize {
    if !backend.is_available() {
        return 0;
    }
    let commands = sfx.commands(backend.current_time());
    for cmd in &commands {
        backend.submit(cmd);
    }
    commands.len()
}

/// Equal-tempered frequency of a MIDI note (A4 = 69 = 440 Hz)
pub fn midi_to_hz(note: i32) -> f32 {
    440.0 * 2f32.powf((note - 69) as f32 / 12.0)
}

/// Decaying white noise burst, `NOISE_SECONDS` long at `sample_rate`
pub fn noise_burst(sample_rate: f32, seed: u64) -> Vec<f32> {
    let len = ((sample_rate as f64 * NOISE_SECONDS).round() as usize).max(1);
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..len)
        .map(|i| rng.random_range(-1.0f32..1.0) * (1.0 - i as f32 / len as f32))
        .collect()
}
