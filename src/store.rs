//! State store - persists configuration and the canonical collection
//!
//! Two JSON files live in the data directory:
//! - `config.json`: settings, priority rules, type filters, watch lists
//! - `notifications.json`: the canonical records of both providers
//!
//! Access is serialized through an fs2 lock on `.lock`; writes go to a
//! temp file first and are renamed into place. Commands that load, mutate
//! and save hold one [`StoreLock`] across all three steps.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::engine::CanonicalState;

const CONFIG_FILE: &str = "config.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";
const LOCK_FILE: &str = ".lock";

pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/gitfeed`
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("gitfeed")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn notifications_path(&self) -> PathBuf {
        self.dir.join(NOTIFICATIONS_FILE)
    }

    fn open_lock(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir {}", self.dir.display()))?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        Ok(lock)
    }

    /// Run `operation` while holding the shared lock
    fn with_shared_lock<T>(&self, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        use fs2::FileExt;

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let result = operation();
        let _ = lock.unlock();
        result
    }

    /// Run `operation` while holding the exclusive lock
    fn with_exclusive_lock<T>(&self, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        use fs2::FileExt;

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;
        let result = operation();
        let _ = lock.unlock();
        result
    }

    /// Take the exclusive lock for a whole read-modify-write.
    ///
    /// Blocks until every other holder has released the lock; it is released
    /// when the returned guard is dropped.
    pub fn lock_exclusive(&self) -> Result<StoreLock<'_>> {
        use fs2::FileExt;

        let file = self.open_lock()?;
        file.lock_exclusive()?;
        debug!(dir = %self.dir.display(), "Acquired exclusive store lock");
        Ok(StoreLock { store: self, file })
    }

    fn read_config(&self) -> Result<ConfigStore> {
        let config: ConfigStore = read_json(&self.config_path())?;
        Ok(config.normalized())
    }

    fn read_notifications(&self) -> Result<CanonicalState> {
        read_json(&self.notifications_path())
    }

    fn write_all(&self, config: &ConfigStore, state: &CanonicalState) -> Result<()> {
        write_json_atomic(&self.config_path(), config)?;
        write_json_atomic(&self.notifications_path(), state)
    }

    /// Load configuration; a missing file yields defaults
    pub fn load_config(&self) -> Result<ConfigStore> {
        self.with_shared_lock(|| self.read_config())
    }

    /// Load the canonical collection; a missing file yields an empty state
    pub fn load_notifications(&self) -> Result<CanonicalState> {
        self.with_shared_lock(|| self.read_notifications())
    }

    /// Load both files under one shared lock
    pub fn load(&self) -> Result<(ConfigStore, CanonicalState)> {
        self.with_shared_lock(|| Ok((self.read_config()?, self.read_notifications()?)))
    }

    pub fn save_config(&self, config: &ConfigStore) -> Result<()> {
        let path = self.config_path();
        self.with_exclusive_lock(|| write_json_atomic(&path, config))
    }

    pub fn save_notifications(&self, state: &CanonicalState) -> Result<()> {
        let path = self.notifications_path();
        self.with_exclusive_lock(|| write_json_atomic(&path, state))
    }

    /// Save both files under one lock
    pub fn save(&self, config: &ConfigStore, state: &CanonicalState) -> Result<()> {
        self.with_exclusive_lock(|| self.write_all(config, state))
    }
}

/// Exclusive hold on a [`StateStore`]; loads and saves through it take no
/// further lock
pub struct StoreLock<'a> {
    store: &'a StateStore,
    file: File,
}

impl StoreLock<'_> {
    pub fn load(&self) -> Result<(ConfigStore, CanonicalState)> {
        Ok((self.store.read_config()?, self.store.read_notifications()?))
    }

    pub fn save(&self, config: &ConfigStore, state: &CanonicalState) -> Result<()> {
        self.store.write_all(config, state)
    }
}

impl Drop for StoreLock<'_> {
    fn drop(&mut self) {
        use fs2::FileExt;

        let _ = self.file.unlock();
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "No stored file, using defaults");
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        warn!(path = %path.display(), "Stored file is empty, using defaults");
        return Ok(T::default());
    }
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    {
        let mut temp_file = File::create(&temp_path)?;
        temp_file.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;
        temp_file.sync_all()?;
    }
    fs::rename(&temp_path, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    debug!(path = %path.display(), "Saved");
    Ok(())
}
