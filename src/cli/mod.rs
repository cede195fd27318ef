//! CLI command handling
//!
//! Every mutating command opens a [`LockedEngine`], runs one engine operation,
//! and writes the exported state back before releasing the store lock.

pub mod configure;
pub mod list;
pub mod mark;
pub mod output;
pub mod sync;

pub use configure::*;
pub use list::*;
pub use mark::*;
pub use output::*;
pub use sync::*;

use anyhow::Result;
use std::ops::Deref;

use crate::engine::NotificationEngine;
use crate::store::{StateStore, StoreLock};

/// Build a read-only engine from what `store` holds
pub fn open_engine(store: &StateStore) -> Result<NotificationEngine> {
    let (config, canonical) = store.load()?;
    Ok(NotificationEngine::new(config, canonical))
}

/// Engine opened under the store's exclusive lock.
///
/// The lock is held from load until the value is dropped, so a concurrent
/// command cannot save in between and lose this one's changes.
pub struct LockedEngine<'a> {
    lock: StoreLock<'a>,
    engine: NotificationEngine,
}

impl<'a> LockedEngine<'a> {
    pub fn open(store: &'a StateStore) -> Result<Self> {
        let lock = store.lock_exclusive()?;
        let (config, canonical) = lock.load()?;
        Ok(Self {
            lock,
            engine: NotificationEngine::new(config, canonical),
        })
    }

    /// Write the engine's configuration and canonical state back
    pub async fn persist(&self) -> Result<()> {
        let (config, canonical) = self.engine.export().await;
        self.lock.save(&config, &canonical)
    }
}

impl Deref for LockedEngine<'_> {
    type Target = NotificationEngine;

    fn deref(&self) -> &NotificationEngine {
        &self.engine
    }
}
