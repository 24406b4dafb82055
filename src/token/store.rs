//! Token Store
//!
//! Persistent storage of token data and the in-memory token cache.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::error::{CredentialError, DispatchError, StorageError};
use crate::token::PrivateTokenData;

/// Default prefix of storage keys holding token data.
pub const DEFAULT_KEY_PREFIX: &str = "token.";

/// Durable storage for encoded token data (keychain, file, database...).
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    /// Read the blob stored under a key.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DispatchError>;

    /// Write a blob under a key, replacing any previous value.
    async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), DispatchError>;

    /// Delete the blob under a key.
    async fn delete(&self, key: &str) -> Result<bool, DispatchError>;

    /// List all stored keys.
    async fn keys(&self) -> Result<Vec<String>, DispatchError>;
}

/// In-memory credential storage implementation.
pub struct InMemoryCredentialStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryCredentialStorage {
    /// Create new in-memory credential storage.
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCredentialStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStorage for InMemoryCredentialStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DispatchError> {
        Ok(lock(&self.blobs)?.get(key).cloned())
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), DispatchError> {
        lock(&self.blobs)?.insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DispatchError> {
        Ok(lock(&self.blobs)?.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DispatchError> {
        Ok(lock(&self.blobs)?.keys().cloned().collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, DispatchError> {
    mutex.lock().map_err(|_| {
        DispatchError::Storage(StorageError::ReadFailed {
            message: "storage lock poisoned".to_string(),
        })
    })
}

/// Mock credential storage for testing.
#[derive(Default)]
pub struct MockCredentialStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    write_history: Mutex<Vec<(String, Vec<u8>)>>,
    read_history: Mutex<Vec<String>>,
    delete_history: Mutex<Vec<String>>,
    next_error: Mutex<Option<DispatchError>>,
    should_fail: Mutex<bool>,
}

impl MockCredentialStorage {
    /// Create new mock credential storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: DispatchError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Pre-populate a raw blob, bypassing encoding.
    pub fn add_blob(&self, key: &str, data: impl Into<Vec<u8>>) -> &Self {
        self.blobs.lock().unwrap().insert(key.to_string(), data.into());
        self
    }

    /// Get the raw blob currently stored under a key.
    pub fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    /// Get write history.
    pub fn get_write_history(&self) -> Vec<(String, Vec<u8>)> {
        self.write_history.lock().unwrap().clone()
    }

    /// Get read history.
    pub fn get_read_history(&self) -> Vec<String> {
        self.read_history.lock().unwrap().clone()
    }

    /// Get delete history.
    pub fn get_delete_history(&self) -> Vec<String> {
        self.delete_history.lock().unwrap().clone()
    }

    fn check_error(&self, failure: fn(String) -> StorageError) -> Result<(), DispatchError> {
        if *self.should_fail.lock().unwrap() {
            return Err(DispatchError::Storage(failure(
                "Mock storage failure".to_string(),
            )));
        }

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialStorage for MockCredentialStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DispatchError> {
        self.check_error(|message| StorageError::ReadFailed { message })?;

        self.read_history.lock().unwrap().push(key.to_string());
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), DispatchError> {
        self.check_error(|message| StorageError::WriteFailed { message })?;

        self.write_history
            .lock()
            .unwrap()
            .push((key.to_string(), data.clone()));
        self.blobs.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DispatchError> {
        self.check_error(|message| StorageError::DeleteFailed { message })?;

        self.delete_history.lock().unwrap().push(key.to_string());
        Ok(self.blobs.lock().unwrap().remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DispatchError> {
        self.check_error(|message| StorageError::ReadFailed { message })?;
        Ok(self.blobs.lock().unwrap().keys().cloned().collect())
    }
}

/// Token cache backed by credential storage.
///
/// Cached records are shared as `Arc<PrivateTokenData>`. Storing a token
/// publishes a new `Arc` in one step, so a reader holds either the old or the
/// new record, never a mix.
///
/// Paths that touch storage and then the cache hold `update_lock`; a cached
/// entry always reflects the last completed storage update.
pub struct TokenStore<S: CredentialStorage> {
    storage: Arc<S>,
    key_prefix: String,
    cache: RwLock<HashMap<String, Arc<PrivateTokenData>>>,
    update_lock: AsyncMutex<()>,
}

impl<S: CredentialStorage> TokenStore<S> {
    /// Create a token store with the default key prefix.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_key_prefix(storage, DEFAULT_KEY_PREFIX)
    }

    /// Create a token store with a custom key prefix.
    pub fn with_key_prefix(storage: Arc<S>, key_prefix: impl Into<String>) -> Self {
        Self {
            storage,
            key_prefix: key_prefix.into(),
            cache: RwLock::new(HashMap::new()),
            update_lock: AsyncMutex::new(()),
        }
    }

    fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }

    /// Get a cached token without touching storage.
    pub fn cached(&self, name: &str) -> Option<Arc<PrivateTokenData>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(name).cloned())
    }

    fn publish(&self, token: Arc<PrivateTokenData>) {
        match self.cache.write() {
            Ok(mut cache) => {
                cache.insert(token.name().to_string(), token);
            }
            Err(poisoned) => {
                poisoned
                    .into_inner()
                    .insert(token.name().to_string(), token);
            }
        }
    }

    fn evict(&self, name: &str) -> bool {
        match self.cache.write() {
            Ok(mut cache) => cache.remove(name).is_some(),
            Err(poisoned) => poisoned.into_inner().remove(name).is_some(),
        }
    }

    /// Load a token by name.
    ///
    /// Returns the cached record, or decodes the stored one. Corrupted or
    /// invalid stored data is deleted and `None` is returned; the caller has
    /// to provision a new token.
    pub async fn load(&self, name: &str) -> Result<Option<Arc<PrivateTokenData>>, DispatchError> {
        if let Some(token) = self.cached(name) {
            return Ok(Some(token));
        }

        let _guard = self.update_lock.lock().await;
        // Published by another caller while this one waited.
        if let Some(token) = self.cached(name) {
            return Ok(Some(token));
        }

        let key = self.storage_key(name);
        let Some(data) = self.storage.read(&key).await? else {
            return Ok(None);
        };

        match PrivateTokenData::deserialize(&data) {
            Some(token) if token.name() == name => {
                let token = Arc::new(token);
                self.publish(token.clone());
                debug!(token = name, "Token loaded from storage");
                Ok(Some(token))
            }
            _ => {
                warn!(token = name, "Discarding corrupted token data");
                self.storage.delete(&key).await?;
                Ok(None)
            }
        }
    }

    /// Persist a token and publish it in the cache.
    ///
    /// Replaces any token with the same name. Invalid data is rejected.
    pub async fn store(&self, token: PrivateTokenData) -> Result<Arc<PrivateTokenData>, DispatchError> {
        let data = token.serialize().ok_or_else(|| {
            DispatchError::Credential(CredentialError::InvalidData {
                name: token.name().to_string(),
            })
        })?;

        let _guard = self.update_lock.lock().await;
        self.storage.write(&self.storage_key(token.name()), data).await?;

        let token = Arc::new(token);
        self.publish(token.clone());
        debug!(token = token.name(), "Token stored");
        Ok(token)
    }

    /// Remove a token from storage and cache.
    pub async fn remove(&self, name: &str) -> Result<bool, DispatchError> {
        let _guard = self.update_lock.lock().await;
        let removed = self.storage.delete(&self.storage_key(name)).await?;
        let evicted = self.evict(name);
        debug!(token = name, "Token removed");
        Ok(removed || evicted)
    }

    /// Remove every token managed by this store.
    pub async fn remove_all(&self) -> Result<u32, DispatchError> {
        let _guard = self.update_lock.lock().await;
        let mut removed = 0;
        for key in self.storage.keys().await? {
            if key.starts_with(&self.key_prefix) && self.storage.delete(&key).await? {
                removed += 1;
            }
        }
        match self.cache.write() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        debug!(removed, "All tokens removed");
        Ok(removed)
    }
}
