//! Storage drivers persisting session records between requests.
//!
//! A [`SessionHandler`] owns the durable side of a session: loading and
//! saving attribute maps, deleting them, pruning expired ones, and the
//! per-id lease that keeps two processes from writing the same session at
//! once. Two drivers ship with the crate:
//!
//! - [`MemoryHandler`]: process-local map, useful for tests and single
//!   process servers.
//! - [`FileHandler`]: one JSON file per session in a directory.

use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AttributeMap, SessionId};
use crate::error::SessionError;
use crate::Result;

mod file;
mod memory;

pub use file::FileHandler;
pub use memory::MemoryHandler;

/// What a driver persists for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stored attributes.
    pub attributes: AttributeMap,
    /// Unix timestamp of the last save.
    pub last_activity: u64,
    /// Inactivity window after which the record is expired.
    pub expire_secs: u64,
}

impl SessionRecord {
    /// Create a record stamped at `now`.
    pub fn new(attributes: AttributeMap, now: u64, expire: Duration) -> Self {
        Self {
            attributes,
            last_activity: now,
            expire_secs: expire.as_secs(),
        }
    }

    /// Seconds since the last save.
    pub fn idle_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_activity)
    }

    /// Check if the record outlived its own expiry window.
    pub fn is_expired(&self, now: u64) -> bool {
        self.idle_secs(now) > self.expire_secs
    }

    /// Check if the record has been idle longer than `max_lifetime`.
    pub fn is_stale(&self, now: u64, max_lifetime: Duration) -> bool {
        self.idle_secs(now) > max_lifetime.as_secs()
    }
}

/// Persistence driver for sessions.
///
/// All calls are synchronous and may block on I/O. Failures are reported as
/// [`SessionError::StorageUnavailable`] so the caller can keep its last
/// known-good state.
pub trait SessionHandler: Send + Sync + Debug {
    /// Short driver name for logging.
    fn name(&self) -> &'static str;

    /// Load a record. Missing and expired records both yield `None`.
    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>>;

    /// Persist attributes under `id`, refreshing its activity timestamp.
    fn save(&self, id: &SessionId, attributes: &AttributeMap, expire: Duration) -> Result<()>;

    /// Delete a record. Returns whether one existed.
    fn delete(&self, id: &SessionId) -> Result<bool>;

    /// Delete every record idle for longer than `max_lifetime`.
    ///
    /// Returns the number of records removed.
    fn gc(&self, max_lifetime: Duration) -> Result<usize> {
        let _ = max_lifetime;
        Err(SessionError::GcUnsupported)
    }

    /// Take the write lease on `id` for at most `lease`.
    ///
    /// Fails with [`SessionError::Locked`] while another unexpired lease is
    /// held. An abandoned lease lapses on its own once `lease` has passed.
    fn lock(&self, id: &SessionId, lease: Duration) -> Result<()> {
        let _ = (id, lease);
        Ok(())
    }

    /// Release the write lease on `id`.
    fn unlock(&self, id: &SessionId) -> Result<()> {
        let _ = id;
        Ok(())
    }

    /// All unexpired records, for reporting.
    fn records(&self) -> Result<Vec<(SessionId, SessionRecord)>>;
}
