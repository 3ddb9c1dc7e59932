//! Look-ahead music scheduler
//!
//! A host timer calls `schedule` every ~25 ms. Each call queues every step
//! whose start falls inside the look-ahead window on the backend clock, so
//! playback stays sample-accurate even when the timer itself jitters.

use super::pattern::{STEPS_PER_ROW, Song};
use super::{AudioBackend, AudioCommand, Bus};

/// Delay between `start` and the first step (seconds)
pub const START_DELAY: f64 = 0.05;
/// Default look-ahead window (seconds)
pub const LOOK_AHEAD: f64 = 0.12;
/// Recommended host timer interval (milliseconds)
pub const TIMER_INTERVAL_MS: i32 = 25;

/// Accepted tempo range (BPM)
const TEMPO_MIN: f64 = 40.0;
const TEMPO_MAX: f64 = 300.0;

#[derive(Debug, Clone)]
pub struct AudioScheduler {
    song: Song,
    tempo: f64,
    step_dur: f64,
    look_ahead: f64,
    playing: bool,
    /// Global step counter (row cursor is derived from it)
    step: u64,
    next_time: f64,
    anchor_time: f64,
    anchor_step: u64,
}

impl Default for AudioScheduler {
    fn default() -> Self {
        Self::new(Song::theme())
    }
}

impl AudioScheduler {
    pub fn new(song: Song) -> Self {
        let tempo = song.tempo.clamp(TEMPO_MIN, TEMPO_MAX);
        let step_dur = song.step_duration(tempo);
        Self {
            song,
            tempo,
            step_dur,
            look_ahead: LOOK_AHEAD,
            playing: false,
            step: 0,
            next_time: 0.0,
            anchor_time: 0.0,
            anchor_step: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Next step to be scheduled
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Backend time of the next step
    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn step_duration(&self) -> f64 {
        self.step_dur
    }

    pub fn look_ahead(&self) -> f64 {
        self.look_ahead
    }

    /// Begin playback a short moment from now.
    ///
    /// No-op when already playing or when the backend cannot make sound.
    pub fn start(&mut self, backend: &mut impl AudioBackend) -> bool {
        if self.playing || !backend.is_available() {
            return false;
        }
        backend.resume();
        self.playing = true;
        self.anchor_step = self.step;
        self.anchor_time = backend.current_time() + START_DELAY;
        self.next_time = self.anchor_time;
        log::info!("Music started at {:.3}s ({} bpm)", self.next_time, self.tempo);
        true
    }

    /// Stop scheduling; commands already queued still play out
    pub fn stop(&mut self) {
        if self.playing {
            log::info!("Music stopped at step {}", self.step);
        }
        self.playing = false;
    }

    /// Change tempo from the next step on, keeping already queued steps
    pub fn set_tempo(&mut self, bpm: f64) {
        if !bpm.is_finite() {
            return;
        }
        self.tempo = bpm.clamp(TEMPO_MIN, TEMPO_MAX);
        self.step_dur = self.song.step_duration(self.tempo);
        self.anchor_step = self.step;
        self.anchor_time = self.next_time;
    }

    #[inline]
    fn time_of(&self, step: u64) -> f64 {
        self.anchor_time + (step - self.anchor_step) as f64 * self.step_dur
    }

    /// Queue every step starting before `now + look_ahead`.
    ///
    /// Steps are emitted strictly in order, one step apart. After a timer
    /// stall the late steps are still queued (the backend plays them at
    /// once) so the sequence never has a hole. Returns the number of
    /// commands emitted.
    pub fn schedule(&mut self, backend: &mut impl AudioBackend) -> usize {
        if !self.playing || !backend.is_available() {
            return 0;
        }

        let now = backend.current_time();
        if self.next_time < now {
            log::debug!("Audio timer late by {:.3}s, catching up", now - self.next_time);
        }

        let horizon = now + self.look_ahead;
        let mut emitted = 0;
        while self.next_time < horizon {
            emitted += self.emit_step(backend);
            self.step += 1;
            self.next_time = self.time_of(self.step);
        }
        emitted
    }

    fn emit_step(&self, backend: &mut impl AudioBackend) -> usize {
        let t = self.next_time;
        let mut emitted = 0;

        for (v, voice) in self.song.voices.iter().enumerate() {
            if let Some(note) = self.song.note(self.step, v) {
                backend.submit(&AudioCommand::tone(
                    t,
                    self.step_dur * voice.hold,
                    note,
                    voice.timbre,
                    voice.gain,
                    Bus::Music,
                ));
                emitted += 1;
            }
        }

        if let Some(drums) = &self.song.percussion {
            let i = (self.step % STEPS_PER_ROW as u64) as usize;
            for gain in drums.hits(i) {
                backend.submit(&AudioCommand::noise(t, gain, Bus::Music));
                emitted += 1;
            }
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CommandRecorder, Sound, Timbre};
    use proptest::prelude::*;

    fn voice_times(rec: &CommandRecorder, timbre: Timbre) -> Vec<f64> {
        rec.commands()
            .iter()
            .filter(|c| matches!(c.sound, Sound::Tone { timbre: t, .. } if t == timbre))
            .map(|c| c.time)
            .collect()
    }

    #[test]
    fn test_start_anchors_after_delay() {
        let mut rec = CommandRecorder::new();
        rec.set_time(2.0);
        let mut sched = AudioScheduler::default();
        assert!(sched.start(&mut rec));
        assert!((sched.next_time() - 2.05).abs() < 1e-12);
        // Second start is a no-op
        assert!(!sched.start(&mut rec));
        assert_eq!(rec.resume_count(), 1);
    }

    #[test]
    fn test_start_without_backend_is_noop() {
        let mut rec = CommandRecorder::unavailable();
        let mut sched = AudioScheduler::default();
        assert!(!sched.start(&mut rec));
        assert!(!sched.is_playing());
        assert_eq!(sched.schedule(&mut rec), 0);
    }

    #[test]
    fn test_schedule_fills_look_ahead_window() {
        let mut rec = CommandRecorder::new();
        let mut sched = AudioScheduler::default();
        sched.start(&mut rec);
        sched.schedule(&mut rec);

        // Only the step at 0.05 falls inside [0, 0.12)
        assert_eq!(sched.step(), 1);
        assert!(sched.next_time() >= rec.current_time() + LOOK_AHEAD);
        // Lead, bass and the beat drum
        assert_eq!(rec.commands().len(), 3);

        rec.set_time(0.1);
        sched.schedule(&mut rec);
        assert_eq!(sched.step(), 2);

        let lead = voice_times(&rec, Timbre::Square);
        assert_eq!(lead.len(), 2);
        assert!((lead[1] - lead[0] - sched.step_duration()).abs() < 1e-9);
        // Bass rests on odd steps
        assert_eq!(voice_times(&rec, Timbre::Triangle).len(), 1);
        let noise = rec
            .commands()
            .iter()
            .filter(|c| c.sound == Sound::Noise)
            .count();
        assert_eq!(noise, 1);
    }

    #[test]
    fn test_stacked_drums_on_offbeat() {
        let mut rec = CommandRecorder::new();
        let mut sched = AudioScheduler::default();
        sched.start(&mut rec);
        // Drive the timer through one full row
        for _ in 0..100 {
            sched.schedule(&mut rec);
            rec.advance(0.02);
        }
        let step4 = 0.05 + 4.0 * sched.step_duration();
        let hits: Vec<f32> = rec
            .commands()
            .iter()
            .filter(|c| c.sound == Sound::Noise && (c.time - step4).abs() < 1e-9)
            .map(|c| c.gain)
            .collect();
        assert_eq!(hits, vec![0.04, 0.03]);
    }

    #[test]
    fn test_stop_halts_emission() {
        let mut rec = CommandRecorder::new();
        let mut sched = AudioScheduler::default();
        sched.start(&mut rec);
        sched.schedule(&mut rec);
        sched.stop();
        let before = rec.commands().len();
        rec.advance(1.0);
        assert_eq!(sched.schedule(&mut rec), 0);
        assert_eq!(rec.commands().len(), before);
    }

    /// One voice on every step, no percussion
    fn drone() -> Song {
        let mut song = Song::theme();
        song.voices.truncate(1);
        song.rows = vec![vec![[60; STEPS_PER_ROW]]];
        song.percussion = None;
        song
    }

    #[test]
    fn test_stall_catches_up_without_gaps() {
        let mut rec = CommandRecorder::new();
        let mut sched = AudioScheduler::new(drone());
        sched.start(&mut rec);
        sched.schedule(&mut rec);
        let before = sched.next_time();
        let queued = rec.commands().len();

        rec.advance(1.0);
        sched.schedule(&mut rec);

        let step = sched.step_duration();
        let times = voice_times(&rec, Timbre::Square);
        assert!((times[queued] - before).abs() < 1e-9);
        for w in times.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-9, "gap {}", w[1] - w[0]);
        }
        assert!(sched.next_time() >= rec.current_time() + LOOK_AHEAD);
    }

    #[test]
    fn test_tempo_change_reanchors() {
        let mut rec = CommandRecorder::new();
        let mut sched = AudioScheduler::default();
        sched.start(&mut rec);
        sched.schedule(&mut rec);
        let pivot = sched.next_time();
        sched.set_tempo(66.0);
        let slow = 60.0 / 66.0 / 4.0;
        assert!((sched.step_duration() - slow).abs() < 1e-12);

        rec.set_time(0.15);
        sched.schedule(&mut rec);
        rec.set_time(0.3);
        sched.schedule(&mut rec);

        let lead = voice_times(&rec, Timbre::Square);
        let after: Vec<f64> = lead.into_iter().filter(|&t| t >= pivot - 1e-9).collect();
        assert_eq!(after.len(), 2);
        assert!((after[0] - pivot).abs() < 1e-9);
        assert!((after[1] - after[0] - slow).abs() < 1e-9);

        sched.set_tempo(1000.0);
        assert_eq!(sched.tempo(), 300.0);
    }

    proptest! {
        /// Command times never go backwards across calls, and consecutive
        /// steps are exactly one step apart even across timer stalls
        #[test]
        fn prop_monotonic_and_step_spaced(advances in prop::collection::vec(0.0f64..0.6, 1..60)) {
            let mut rec = CommandRecorder::new();
            let mut sched = AudioScheduler::new(drone());
            sched.start(&mut rec);
            let mut last_next = sched.next_time();
            for dt in advances {
                rec.advance(dt);
                sched.schedule(&mut rec);
                prop_assert!(sched.next_time() >= last_next);
                last_next = sched.next_time();
            }

            let step = sched.step_duration();
            let times: Vec<f64> = rec.commands().iter().map(|c| c.time).collect();
            prop_assert!(times.windows(2).all(|w| w[1] >= w[0]));

            let steps = voice_times(&rec, Timbre::Square);
            prop_assert_eq!(steps.len() as u64, sched.step());
            for w in steps.windows(2) {
                prop_assert!((w[1] - w[0] - step).abs() < 1e-9);
            }
        }
    }
}
