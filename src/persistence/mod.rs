//! Save/load persistence
//!
//! Features:
//! - Versioned JSON record (best score, unlocked palettes, settings)
//! - Tolerant loading: per-field defaults, legacy keys accepted
//! - Pluggable stores (memory, file with tmp + rename, LocalStorage)

#[cfg(target_arch = "wasm32")]
pub mod local_storage;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::palette::PALETTE_COUNT;
use crate::settings::Settings;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

/// Current record version
pub const SAVE_VERSION: u32 = 3;
/// Storage key / file stem
pub const SAVE_KEY: &str = "world_painter_v3";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage is not available")]
    Unavailable,
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("storage rejected the operation: {0}")]
    Rejected(String),
}

/// A place a single save record string lives
pub trait PersistenceStore {
    /// Stored text, `None` when nothing was saved yet
    fn read(&self) -> Result<Option<String>, PersistError>;

    fn write(&mut self, data: &str) -> Result<(), PersistError>;
}

/// Everything that survives between runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub version: u32,
    pub best_score: u64,
    /// Unlocked palettes, `1..=PALETTE_COUNT`
    pub unlocked_count: u32,
    pub settings: Settings,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            best_score: 0,
            unlocked_count: 1,
            settings: Settings::default(),
        }
    }
}

impl SaveRecord {
    /// Parse stored text. Only non-JSON input is an error; anything else
    /// degrades field by field.
    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(obj) = value.as_object() else {
            return defaults;
        };

        let version = obj
            .get("version")
            .and_then(Value::as_u64)
            .map_or(0, |v| v.min(u32::MAX as u64) as u32);
        if version > SAVE_VERSION {
            log::warn!("Save record version {} is newer than {}", version, SAVE_VERSION);
        }

        let best_score = obj
            .get("bestScore")
            .or_else(|| obj.get("best"))
            .and_then(non_negative_int)
            .unwrap_or(defaults.best_score);

        let unlocked_count = obj
            .get("unlockedCount")
            .or_else(|| obj.get("paletteUnlock"))
            .and_then(non_negative_int)
            .map_or(defaults.unlocked_count, |n| {
                n.clamp(1, PALETTE_COUNT as u64) as u32
            });

        let settings = obj
            .get("settings")
            .map(Settings::from_value)
            .unwrap_or(defaults.settings);

        Self {
            version: SAVE_VERSION,
            best_score,
            unlocked_count,
            settings,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Integer value of a JSON number, truncating fractions; negatives rejected
fn non_negative_int(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
}

/// Load the record, falling back to defaults on any failure
pub fn load(store: &dyn PersistenceStore) -> SaveRecord {
    match store.read() {
        Ok(Some(text)) => match SaveRecord::from_json(&text) {
            Ok(record) => {
                log::info!(
                    "Loaded save (best {}, {} palettes)",
                    record.best_score,
                    record.unlocked_count
                );
                record
            }
            Err(e) => {
                log::warn!("Ignoring save data: {}", e);
                SaveRecord::default()
            }
        },
        Ok(None) => {
            log::info!("No save data, using defaults");
            SaveRecord::default()
        }
        Err(e) => {
            log::warn!("Failed to read save data: {}", e);
            SaveRecord::default()
        }
    }
}

pub fn save(store: &mut dyn PersistenceStore, record: &SaveRecord) -> Result<(), PersistError> {
    let json = record.to_json()?;
    store.write(&json)?;
    log::debug!("Saved ({} bytes)", json.len());
    Ok(())
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
    writes: Rc<RefCell<u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(text: &str) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(text.to_string());
        store
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Number of successful writes
    pub fn write_count(&self) -> u32 {
        *self.writes.borrow()
    }
}

impl PersistenceStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        *self.slot.borrow_mut() = Some(data.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

/// JSON file store; writes go to a temp file first, then replace the save
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PersistenceStore for FileStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BrokenStore;

    impl PersistenceStore for BrokenStore {
        fn read(&self) -> Result<Option<String>, PersistError> {
            Err(PersistError::Unavailable)
        }

        fn write(&mut self, _data: &str) -> Result<(), PersistError> {
            Err(PersistError::Rejected("quota".into()))
        }
    }

    #[test]
    fn test_roundtrip_through_memory() {
        let mut store = MemoryStore::new();
        let record = SaveRecord {
            best_score: 120,
            unlocked_count: 2,
            ..Default::default()
        };
        save(&mut store, &record).unwrap();
        assert_eq!(load(&store), record);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_empty_and_garbage_give_defaults() {
        assert_eq!(load(&MemoryStore::new()), SaveRecord::default());
        assert_eq!(load(&MemoryStore::with_contents("{not json")), SaveRecord::default());
        assert_eq!(load(&MemoryStore::with_contents("42")), SaveRecord::default());
        assert_eq!(load(&BrokenStore), SaveRecord::default());
    }

    #[test]
    fn test_legacy_keys() {
        let text = json!({
            "best": 77.9,
            "paletteUnlock": 9,
            "settings": { "perfMode": true }
        })
        .to_string();
        let record = load(&MemoryStore::with_contents(&text));
        assert_eq!(record.best_score, 77);
        assert_eq!(record.unlocked_count as usize, PALETTE_COUNT);
        assert!(record.settings.perf_mode);
        assert_eq!(record.version, SAVE_VERSION);
    }

    #[test]
    fn test_invalid_fields_default_independently() {
        let text = json!({
            "version": 3,
            "bestScore": -5,
            "unlockedCount": 0,
            "settings": "loud"
        })
        .to_string();
        let record = load(&MemoryStore::with_contents(&text));
        assert_eq!(record.best_score, 0);
        assert_eq!(record.unlocked_count, 1);
        assert_eq!(record.settings, Settings::default());
    }

    #[test]
    fn test_write_failure_reported() {
        let err = save(&mut BrokenStore, &SaveRecord::default()).unwrap_err();
        assert!(matches!(err, PersistError::Rejected(_)));
    }

    #[test]
    fn test_serialized_shape() {
        let value: Value = serde_json::from_str(&SaveRecord::default().to_json().unwrap()).unwrap();
        assert_eq!(value["version"], json!(SAVE_VERSION));
        assert_eq!(value["bestScore"], json!(0));
        assert_eq!(value["unlockedCount"], json!(1));
        assert!(value["settings"].is_object());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("world_painter_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = FileStore::new(dir.join("save.json"));
        assert!(store.read().unwrap().is_none());

        let record = SaveRecord {
            best_score: 9,
            ..Default::default()
        };
        save(&mut store, &record).unwrap();
        assert_eq!(load(&store), record);
        assert!(!dir.join("save.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
