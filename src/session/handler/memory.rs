//! Process-local session driver.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{SessionHandler, SessionRecord};
use crate::error::SessionError;
use crate::session::{AttributeMap, Clock, SessionId, SystemClock};
use crate::Result;

/// Thread-safe in-memory storage for session records.
#[derive(Debug)]
pub struct MemoryHandler {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
    /// Lease expiry (unix seconds) per locked id.
    leases: RwLock<HashMap<SessionId, u64>>,
    clock: Arc<dyn Clock>,
}

impl MemoryHandler {
    /// Create a new empty handler on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new empty handler on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            leases: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored records, expired ones included.
    pub fn count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if a lease on `id` is currently held.
    pub fn is_locked(&self, id: &SessionId) -> bool {
        let now = self.clock.now();
        self.leases
            .read()
            .map(|leases| leases.get(id).is_some_and(|&until| until > now))
            .unwrap_or(false)
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandler for MemoryHandler {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        let now = self.clock.now();
        let mut records = self
            .records
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        match records.get(id) {
            Some(record) if record.is_expired(now) => {
                records.remove(id);
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }

    fn save(&self, id: &SessionId, attributes: &AttributeMap, expire: Duration) -> Result<()> {
        let record = SessionRecord::new(attributes.clone(), self.clock.now(), expire);
        let mut records = self
            .records
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        records.insert(id.clone(), record);
        Ok(())
    }

    fn delete(&self, id: &SessionId) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(records.remove(id).is_some())
    }

    fn gc(&self, max_lifetime: Duration) -> Result<usize> {
        let now = self.clock.now();
        let mut records = self
            .records
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let before = records.len();
        records.retain(|_, record| !record.is_stale(now, max_lifetime));
        Ok(before - records.len())
    }

    fn lock(&self, id: &SessionId, lease: Duration) -> Result<()> {
        let now = self.clock.now();
        let mut leases = self
            .leases
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        if let Some(&until) = leases.get(id) {
            if until > now {
                return Err(SessionError::Locked(id.to_string()));
            }
        }

        leases.insert(id.clone(), now.saturating_add(lease.as_secs()));
        Ok(())
    }

    fn unlock(&self, id: &SessionId) -> Result<()> {
        let mut leases = self
            .leases
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        leases.remove(id);
        Ok(())
    }

    fn records(&self) -> Result<Vec<(SessionId, SessionRecord)>> {
        let now = self.clock.now();
        let records = self
            .records
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;

        Ok(records
            .iter()
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect())
    }
}
