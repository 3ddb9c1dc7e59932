//! Backend that records commands against a manually driven clock
//!
//! Used by the native build and in tests.

use super::{AudioBackend, AudioCommand};

#[derive(Debug, Clone)]
pub struct CommandRecorder {
    now: f64,
    available: bool,
    master_gain: f32,
    resumes: u32,
    commands: Vec<AudioCommand>,
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            available: true,
            master_gain: 1.0,
            resumes: 0,
            commands: Vec::new(),
        }
    }

    /// A backend that reports no audio output
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Set the clock; it never moves backwards
    pub fn set_time(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn advance(&mut self, dt: f64) {
        if dt > 0.0 {
            self.now += dt;
        }
    }

    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    /// Take recorded commands, leaving the log empty
    pub fn take(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn resume_count(&self) -> u32 {
        self.resumes
    }
}

impl AudioBackend for CommandRecorder {
    fn is_available(&self) -> bool {
        self.available
    }

    fn current_time(&self) -> f64 {
        self.now
    }

    fn submit(&mut self, cmd: &AudioCommand) {
        if self.available {
            self.commands.push(*cmd);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }

    fn resume(&mut self) {
        self.resumes += 1;
    }
}
