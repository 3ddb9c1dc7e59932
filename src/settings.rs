//! Game settings and preferences
//!
//! Persisted inside the save record. Loading is tolerant: every field that is
//! missing or has the wrong type falls back to its default on its own.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::sim::SimOptions;

/// Default master volume
pub const DEFAULT_VOLUME: f32 = 0.65;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    // === Performance ===
    /// Fewer particles, no scanlines
    #[serde(deserialize_with = "flag_or_false")]
    pub perf_mode: bool,

    // === Visual Effects ===
    /// CRT scanline overlay
    #[serde(rename = "scanline", deserialize_with = "flag_or_true")]
    pub scanlines: bool,

    // === HUD ===
    /// Show FPS counter
    #[serde(deserialize_with = "flag_or_false")]
    pub show_fps: bool,

    // === Audio ===
    #[serde(deserialize_with = "flag_or_false")]
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    #[serde(deserialize_with = "volume_or_default")]
    pub volume: f32,

    // === Accessibility ===
    /// Reduced motion (no particles, slower color wave)
    #[serde(deserialize_with = "flag_or_false")]
    pub reduced_motion: bool,
    /// High contrast palette
    #[serde(deserialize_with = "flag_or_false")]
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            perf_mode: false,
            scanlines: true,
            show_fps: false,
            muted: false,
            volume: DEFAULT_VOLUME,
            reduced_motion: false,
            high_contrast: false,
        }
    }
}

impl Settings {
    /// Build settings from arbitrary JSON, defaulting field by field
    pub fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_else(|e| {
            log::warn!("Settings unreadable, using defaults: {}", e);
            Self::default()
        })
    }

    /// Set master volume, clamped to [0, 1]; non-finite input is ignored
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    /// Scanlines are skipped in perf mode
    pub fn effective_scanlines(&self) -> bool {
        self.scanlines && !self.perf_mode
    }

    /// Switches the simulation cares about
    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            reduced_motion: self.reduced_motion,
            perf_mode: self.perf_mode,
        }
    }
}

/// Take the field if it has the right type, else `fallback`
fn lenient<'de, D, T>(deserializer: D, fallback: T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or(fallback))
}

fn flag_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    lenient(deserializer, false)
}

fn flag_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    lenient(deserializer, true)
}

fn volume_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let mut settings = Settings::default();
    settings.set_volume(lenient(deserializer, DEFAULT_VOLUME)?);
    Ok(settings.volume)
}
