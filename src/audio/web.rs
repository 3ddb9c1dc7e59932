//! Web Audio backend
//!
//! Routes commands through music and sfx buses into a master gain, the same
//! graph for scheduled music and immediate effects.

use web_sys::{AudioBuffer, AudioContext, GainNode, OscillatorType};

use super::{AudioBackend, AudioCommand, Bus, Sound, Timbre, noise_burst};

/// Gain floor for exponential ramps (they cannot reach zero)
const SILENT: f32 = 0.0001;
/// Attack time of tone envelopes (seconds)
const ATTACK: f64 = 0.01;

pub struct WebAudioBackend {
    ctx: AudioContext,
    master: GainNode,
    music: GainNode,
    sfx: GainNode,
    noise: Option<AudioBuffer>,
}

impl WebAudioBackend {
    /// Build the audio graph. Returns `None` (audio disabled) when the
    /// browser refuses to create a context.
    pub fn new(master_gain: f32, noise_seed: u64) -> Option<Self> {
        let ctx = match AudioContext::new() {
            Ok(ctx) => ctx,
            Err(_) => {
                log::warn!("Failed to create AudioContext - audio disabled");
                return None;
            }
        };

        let master = ctx.create_gain().ok()?;
        let music = ctx.create_gain().ok()?;
        let sfx = ctx.create_gain().ok()?;
        music.gain().set_value(Bus::Music.gain());
        sfx.gain().set_value(Bus::Sfx.gain());
        master.gain().set_value(master_gain);
        music.connect_with_audio_node(&master).ok()?;
        sfx.connect_with_audio_node(&master).ok()?;
        master.connect_with_audio_node(&ctx.destination()).ok()?;

        let noise = Self::create_noise(&ctx, noise_seed);
        if noise.is_none() {
            log::warn!("Noise buffer unavailable - drums disabled");
        }

        log::info!("Web Audio ready ({} Hz)", ctx.sample_rate());
        Some(Self {
            ctx,
            master,
            music,
            sfx,
            noise,
        })
    }

    fn create_noise(ctx: &AudioContext, seed: u64) -> Option<AudioBuffer> {
        let rate = ctx.sample_rate();
        let mut samples = noise_burst(rate, seed);
        let buffer = ctx.create_buffer(1, samples.len() as u32, rate).ok()?;
        buffer.copy_to_channel(&mut samples[..], 0).ok()?;
        Some(buffer)
    }

    fn bus(&self, bus: Bus) -> &GainNode {
        match bus {
            Bus::Music => &self.music,
            Bus::Sfx => &self.sfx,
        }
    }

    fn play_tone(&self, cmd: &AudioCommand, hz: f32, timbre: Timbre) -> Option<()> {
        let osc = self.ctx.create_oscillator().ok()?;
        let gain = self.ctx.create_gain().ok()?;
        let t = cmd.time;

        osc.set_type(match timbre {
            Timbre::Sine => OscillatorType::Sine,
            Timbre::Square => OscillatorType::Square,
            Timbre::Triangle => OscillatorType::Triangle,
            Timbre::Sawtooth => OscillatorType::Sawtooth,
        });
        osc.frequency().set_value_at_time(hz, t).ok()?;
        gain.gain().set_value_at_time(SILENT, t).ok()?;
        gain.gain()
            .exponential_ramp_to_value_at_time(cmd.gain.max(SILENT), t + ATTACK)
            .ok()?;
        gain.gain()
            .exponential_ramp_to_value_at_time(SILENT, t + cmd.duration)
            .ok()?;

        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(self.bus(cmd.bus)).ok()?;
        osc.start_with_when(t).ok()?;
        osc.stop_with_when(t + cmd.duration + 0.02).ok()?;
        Some(())
    }

    fn play_noise(&self, cmd: &AudioCommand) -> Option<()> {
        let buffer = self.noise.as_ref()?;
        let src = self.ctx.create_buffer_source().ok()?;
        let gain = self.ctx.create_gain().ok()?;
        src.set_buffer(Some(buffer));
        gain.gain().set_value(cmd.gain);
        src.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(self.bus(cmd.bus)).ok()?;
        src.start_with_when(cmd.time).ok()?;
        Some(())
    }
}

impl AudioBackend for WebAudioBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn submit(&mut self, cmd: &AudioCommand) {
        let played = match cmd.sound {
            Sound::Tone { hz, timbre } => self.play_tone(cmd, hz, timbre),
            Sound::Noise => self.play_noise(cmd),
        };
        if played.is_none() {
            log::debug!("Dropped audio command at {:.3}s", cmd.time);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master.gain().set_value(gain);
    }

    fn resume(&mut self) {
        // Browsers start contexts suspended until a user gesture
        if self.ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }
    }
}
