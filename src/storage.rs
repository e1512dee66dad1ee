use crate::{error::StorageError, ffi};
use std::{cell::RefCell, collections::HashMap, fmt};

/// Key-value store used to remember the last connected wallet.
///
/// Shaped after the browser's `Storage` interface.
pub trait KeyValueStore {
    /// `Ok(None)` when the key was never set
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In memory store, nothing survives the application.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// The browser's `window.localStorage`.
///
/// Every operation fails with [`StorageError::Unavailable`] when the page
/// has no local storage or is denied access to it (sandboxed iframe).
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn with<T>(
        f: impl FnOnce(&ffi::browser::Storage) -> Result<T, wasm_bindgen::JsValue>,
    ) -> Result<T, StorageError> {
        let storage = available(ffi::browser::local_storage())?;
        f(&storage).map_err(|error| {
            StorageError::Refused(error.as_string().unwrap_or_else(|| format!("{error:?}")))
        })
    }
}

/// a storage that cannot be looked up is as good as no storage
fn available<S, E: fmt::Debug>(lookup: Result<Option<S>, E>) -> Result<S, StorageError> {
    match lookup {
        Ok(Some(storage)) => Ok(storage),
        Ok(None) => Err(StorageError::Unavailable),
        Err(error) => {
            log::debug!("localStorage is not accessible: {error:?}");
            Err(StorageError::Unavailable)
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::with(|storage| storage.get_item(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::with(|storage| storage.set_item(key, value))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::with(|storage| storage.remove_item(key))
    }
}
