//! Step-sequenced song data

use super::Timbre;

/// Rest sentinel in a note row
pub const REST: i32 = -1;
/// Steps in one pattern row
pub const STEPS_PER_ROW: usize = 16;

/// How a melodic voice sounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpec {
    pub timbre: Timbre,
    pub gain: f32,
    /// Note length as a fraction of one step
    pub hold: f64,
}

/// Noise hits on a fixed grid: every 4th step and the off-beat of each half bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percussion {
    /// Gain on `step % 4 == 0`
    pub beat_gain: f32,
    /// Extra hit on `step % 8 == 4`
    pub offbeat_gain: f32,
}

impl Percussion {
    /// Gains of the hits on a step within a row (both may fire)
    pub fn hits(&self, step_in_row: usize) -> impl Iterator<Item = f32> {
        let beat = (step_in_row % 4 == 0).then_some(self.beat_gain);
        let offbeat = (step_in_row % 8 == 4).then_some(self.offbeat_gain);
        beat.into_iter().chain(offbeat)
    }
}

/// A looping song: per-voice note rows played in order
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// Beats per minute
    pub tempo: f64,
    pub steps_per_beat: u32,
    pub voices: Vec<VoiceSpec>,
    /// `rows[r][v]` is voice `v`'s notes for row `r`
    pub rows: Vec<Vec<[i32; STEPS_PER_ROW]>>,
    pub percussion: Option<Percussion>,
}

impl Default for Song {
    fn default() -> Self {
        Self::theme()
    }
}

impl Song {
    /// Chiptune theme: square lead, triangle bass, noise drums
    pub fn theme() -> Self {
        const LEAD_A: [i32; 16] = [64, 67, 71, 72, 71, 67, 64, -1, 64, 67, 71, 74, 71, 67, 64, -1];
        const BASS_A: [i32; 16] = [40, -1, 40, -1, 43, -1, 35, -1, 38, -1, 40, -1, 35, -1, 31, -1];
        const LEAD_B: [i32; 16] = [64, 67, 71, 72, 74, 72, 71, -1, 67, 71, 74, 76, 74, 71, 67, -1];
        const BASS_B: [i32; 16] = [36, -1, 36, -1, 43, -1, 38, -1, 40, -1, 40, -1, 35, -1, 31, -1];

        Self {
            tempo: 132.0,
            steps_per_beat: 4,
            voices: vec![
                VoiceSpec {
                    timbre: Timbre::Square,
                    gain: 0.06,
                    hold: 0.9,
                },
                VoiceSpec {
                    timbre: Timbre::Triangle,
                    gain: 0.07,
                    hold: 0.95,
                },
            ],
            rows: vec![
                vec![LEAD_A, BASS_A],
                vec![LEAD_A, BASS_A],
                vec![LEAD_B, BASS_B],
                vec![LEAD_A, BASS_A],
            ],
            percussion: Some(Percussion {
                beat_gain: 0.04,
                offbeat_gain: 0.03,
            }),
        }
    }

    /// Seconds per step at `tempo`
    pub fn step_duration(&self, tempo: f64) -> f64 {
        60.0 / tempo / self.steps_per_beat.max(1) as f64
    }

    /// Total steps before the song loops
    pub fn len_steps(&self) -> u64 {
        (self.rows.len().max(1) * STEPS_PER_ROW) as u64
    }

    /// Note for `voice` at global `step`, `None` on a rest
    pub fn note(&self, step: u64, voice: usize) -> Option<i32> {
        if self.rows.is_empty() {
            return None;
        }
        let row = ((step / STEPS_PER_ROW as u64) % self.rows.len() as u64) as usize;
        let i = (step % STEPS_PER_ROW as u64) as usize;
        let note = *self.rows[row].get(voice)?.get(i)?;
        (note != REST).then_some(note)
    }
}
