//! Persistent storage adapters.
//!
//! - [`MemoryStorage`] implements [`StoragePort`] over a `HashMap`; it
//!   stands in for the flash page on the host.
//! - [`ConfigStore`] implements [`ConfigPort`] on top of any
//!   [`StoragePort`].  The config blob is a fixed header followed by the
//!   `postcard` encoding of [`SystemConfig`]:
//!
//! ```text
//!   ┌────────────┬──────────┬──────────────────────┐
//!   │ magic (4)  │ ver (2)  │ postcard payload ... │
//!   │ 0xC0FF1CE5 │ 0x0200   │                      │
//!   └────────────┴──────────┴──────────────────────┘
//!   little-endian
//! ```
//!
//! Foreign, truncated or out-of-range blobs are rejected at load time.

use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "refill";
const CONFIG_KEY: &str = "syscfg";

pub const CONFIG_MAGIC: u32 = 0xC0FF_1CE5;
pub const CONFIG_VERSION: u16 = 0x0200;
const HEADER_LEN: usize = 6;
const MAX_BLOB_SIZE: usize = 512;

// ───────────────────────────────────────────────────────────────
// In-memory key-value store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: HashMap<String, Vec<u8>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of stored keys, to exercise `Full` handling.
    pub fn with_capacity_limit(keys: usize) -> Self {
        Self {
            store: HashMap::new(),
            capacity: Some(keys),
        }
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.get(&composite) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        if let Some(limit) = self.capacity {
            if !self.store.contains_key(&composite) && self.store.len() >= limit {
                return Err(StorageError::Full);
            }
        }
        self.store.insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::composite_key(namespace, key))
    }
}

// ───────────────────────────────────────────────────────────────
// Config persistence
// ───────────────────────────────────────────────────────────────

/// [`ConfigPort`] that stores a versioned config blob in a [`StoragePort`].
pub struct ConfigStore<S> {
    storage: S,
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Load the stored config, falling back to defaults when nothing
    /// usable is stored.
    pub fn load_or_default(&self) -> SystemConfig {
        match self.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound) => {
                info!("ConfigStore: no stored config, using defaults");
                SystemConfig::default()
            }
            Err(e) => {
                warn!("ConfigStore: stored config rejected ({}), using defaults", e);
                SystemConfig::default()
            }
        }
    }
}

fn encode(config: &SystemConfig) -> Result<Vec<u8>, ConfigError> {
    let mut blob = Vec::with_capacity(MAX_BLOB_SIZE);
    blob.extend_from_slice(&CONFIG_MAGIC.to_le_bytes());
    blob.extend_from_slice(&CONFIG_VERSION.to_le_bytes());
    let payload = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
    blob.extend_from_slice(&payload);
    if blob.len() > MAX_BLOB_SIZE {
        return Err(ConfigError::StorageFull);
    }
    Ok(blob)
}

fn decode(blob: &[u8]) -> Result<SystemConfig, ConfigError> {
    if blob.len() < HEADER_LEN {
        return Err(ConfigError::Corrupted);
    }
    let magic = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]);
    let version = u16::from_le_bytes([blob[4], blob[5]]);
    if magic != CONFIG_MAGIC {
        warn!("ConfigStore: bad magic 0x{:08X}", magic);
        return Err(ConfigError::Corrupted);
    }
    if version != CONFIG_VERSION {
        warn!("ConfigStore: unsupported version 0x{:04X}", version);
        return Err(ConfigError::Corrupted);
    }
    postcard::from_bytes(&blob[HEADER_LEN..]).map_err(|_| ConfigError::Corrupted)
}

impl<S: StoragePort> ConfigPort for ConfigStore<S> {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = self.storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf)?;
        let config = decode(&buf[..len])?;
        config.validate()?;
        info!("ConfigStore: loaded config ({} bytes)", len);
        Ok(config)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let blob = encode(config)?;
        self.storage.write(CONFIG_NAMESPACE, CONFIG_KEY, &blob)?;
        info!("ConfigStore: config saved ({} bytes)", blob.len());
        Ok(())
    }
}
