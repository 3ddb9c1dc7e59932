//! Browser LocalStorage store

use web_sys::Storage;

use super::{PersistError, PersistenceStore};

pub struct LocalStorageStore {
    key: String,
}

impl LocalStorageStore {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }

    fn storage() -> Result<Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistError::Unavailable)
    }
}

impl PersistenceStore for LocalStorageStore {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Self::storage()?
            .get_item(&self.key)
            .map_err(|e| PersistError::Rejected(format!("{:?}", e)))
    }

    fn write(&mut self, data: &str) -> Result<(), PersistError> {
        Self::storage()?
            .set_item(&self.key, data)
            .map_err(|e| PersistError::Rejected(format!("{:?}", e)))
    }
}
