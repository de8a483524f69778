//! Session lifecycle: start, close, destroy, fork and friends.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::handler::{SessionHandler, SessionRecord};
use super::store::{AttributeMap, AttributeStore, Iter};
use super::token::{generate_token, tokens_match, TOKEN_ATTRIBUTE};
use super::{RequestContext, SessionId, SessionState};
use crate::error::SessionError;
use crate::Result;

/// Attribute recording the client address a fresh session was created for.
pub const CLIENT_ADDRESS_ATTRIBUTE: &str = "session.client.address";

/// Attribute recording the user agent a fresh session was created for.
pub const CLIENT_BROWSER_ATTRIBUTE: &str = "session.client.browser";

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie name the session id travels under.
    pub name: String,
    /// Inactivity window before the stored session expires.
    pub expire: Duration,
    /// How long a write lease is held before it lapses on its own.
    pub lock_lease: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "session_keeper".to_string(),
            expire: Duration::from_secs(900),
            lock_lease: Duration::from_secs(30),
        }
    }
}

/// A visitor session bound to one request/response cycle.
///
/// Attributes are only reachable while the session is
/// [`Active`](SessionState::Active). Dropping an active session closes it,
/// persisting its attributes.
#[derive(Debug)]
pub struct Session {
    handler: Arc<dyn SessionHandler>,
    config: SessionConfig,
    id: Option<SessionId>,
    state: SessionState,
    is_new: bool,
    attributes: AttributeStore,
    /// Attributes as loaded by `start`, restored by `abort`.
    baseline: AttributeMap,
}

impl Session {
    /// Create an unstarted session on top of a storage driver.
    pub fn new(handler: Arc<dyn SessionHandler>, config: SessionConfig) -> Self {
        Self {
            handler,
            config,
            id: None,
            state: SessionState::Unstarted,
            is_new: false,
            attributes: AttributeStore::new(),
            baseline: AttributeMap::new(),
        }
    }

    /// Current identifier; `None` before start and after destroy.
    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    /// Choose the id `start` will try to resume.
    pub fn set_id(&mut self, id: SessionId) -> Result<()> {
        if self.state.is_active() {
            return Err(SessionError::AlreadyStarted);
        }
        self.id = Some(id);
        Ok(())
    }

    /// Session (cookie) name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Change the session name.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        if self.state.is_active() {
            return Err(SessionError::AlreadyStarted);
        }
        self.config.name = name.into();
        Ok(())
    }

    /// Inactivity expiry window.
    pub fn expire(&self) -> Duration {
        self.config.expire
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if attributes are accessible.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Check if the session was created (not resumed) by the last start.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Check if the session has been started and not destroyed.
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Start the session for `request`.
    ///
    /// Resumes the id presented under the session cookie (or the id set
    /// with [`set_id`](Self::set_id), or this session's own id when
    /// reopening after `close`) if storage still holds it; otherwise starts
    /// a fresh session with a new id.
    pub fn start(&mut self, request: &RequestContext) -> Result<()> {
        let candidate = match self.state {
            SessionState::Active => return Err(SessionError::AlreadyStarted),
            SessionState::Destroyed => None,
            SessionState::Closed => self.id.clone(),
            SessionState::Unstarted => self
                .id
                .clone()
                .or_else(|| request.session_id(&self.config.name)),
        };

        if let Some(id) = candidate {
            if let Some(record) = self.resume(&id)? {
                return self.activate(id, record.attributes, false);
            }
            debug!(session = %id, "presented session not in storage, starting fresh");
        }

        let id = SessionId::generate();
        self.handler.lock(&id, self.config.lock_lease)?;

        let mut attributes = AttributeMap::new();
        if let Some(addr) = request.client_addr() {
            attributes.insert(CLIENT_ADDRESS_ATTRIBUTE.to_string(), addr.into());
        }
        if let Some(agent) = request.user_agent() {
            attributes.insert(CLIENT_BROWSER_ATTRIBUTE.to_string(), agent.into());
        }

        self.activate(id, attributes, true)
    }

    /// Lease and load an existing record. The lease is dropped again when
    /// nothing usable is stored.
    fn resume(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        self.handler.lock(id, self.config.lock_lease)?;
        match self.handler.load(id) {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                self.release(id);
                Ok(None)
            }
            Err(e) => {
                self.release(id);
                Err(e)
            }
        }
    }

    fn activate(&mut self, id: SessionId, attributes: AttributeMap, is_new: bool) -> Result<()> {
        self.state.transition_to(SessionState::Active)?;
        debug!(
            session = %id,
            handler = self.handler.name(),
            is_new,
            "session started"
        );
        self.id = Some(id);
        self.is_new = is_new;
        self.attributes = AttributeStore::from_map(attributes.clone());
        self.baseline = attributes;
        Ok(())
    }

    fn release(&self, id: &SessionId) {
        if let Err(e) = self.handler.unlock(id) {
            warn!(session = %id, "failed to release session lease: {}", e);
        }
    }

    fn active_id(&self) -> Result<SessionId> {
        match (&self.id, self.state) {
            (Some(id), SessionState::Active) => Ok(id.clone()),
            _ => Err(SessionError::NotStarted(self.state)),
        }
    }

    /// Destroy the current data and start over with a fresh id.
    pub fn restart(&mut self) -> Result<()> {
        if !self.destroy() {
            warn!("restarting after incomplete destroy; stale record left for gc");
        }
        self.start(&RequestContext::new())
    }

    /// Move the attributes to a new id and drop the old record.
    ///
    /// Either both steps happen or neither does: if the old record cannot be
    /// deleted, the new one is removed again and the session keeps its id.
    pub fn fork(&mut self) -> Result<()> {
        let old = self.active_id()?;
        let new = SessionId::generate();

        self.handler.lock(&new, self.config.lock_lease)?;
        if let Err(e) = self
            .handler
            .save(&new, self.attributes.as_map(), self.config.expire)
        {
            self.release(&new);
            return Err(e);
        }

        if let Err(e) = self.handler.delete(&old) {
            if let Err(cleanup) = self.handler.delete(&new) {
                warn!(session = %new, "failed to roll back forked record: {}", cleanup);
            }
            self.release(&new);
            return Err(e);
        }

        self.release(&old);
        info!(from = %old, to = %new, "session forked");
        self.id = Some(new);
        self.is_new = false;
        Ok(())
    }

    /// Persist the attributes and release the session.
    ///
    /// Does nothing unless the session is active. On storage failure the
    /// session stays active so the write can be retried.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Ok(());
        }
        let id = self.active_id()?;

        self.handler
            .save(&id, self.attributes.as_map(), self.config.expire)?;
        self.release(&id);
        self.state.transition_to(SessionState::Closed)?;
        debug!(session = %id, "session closed");
        Ok(())
    }

    /// Delete stored and local data and forget the id.
    ///
    /// The session always ends up [`Destroyed`](SessionState::Destroyed) with
    /// no attributes; the return value reports whether the storage side
    /// succeeded too.
    pub fn destroy(&mut self) -> bool {
        let mut deleted = true;

        if let Some(id) = self.id.take() {
            if let Err(e) = self.handler.delete(&id) {
                warn!(session = %id, "failed to delete stored session: {}", e);
                deleted = false;
            }
            if self.state.is_active() {
                self.release(&id);
            }
            info!(session = %id, "session destroyed");
        }

        self.attributes.clear();
        self.baseline.clear();
        self.is_new = false;
        self.state = SessionState::Destroyed;
        deleted
    }

    /// Drop changes made since `start` without persisting them.
    ///
    /// Returns `false` if the session was not active.
    pub fn abort(&mut self) -> bool {
        let Ok(id) = self.active_id() else {
            return false;
        };

        self.attributes = AttributeStore::from_map(std::mem::take(&mut self.baseline));
        self.release(&id);
        self.state = SessionState::Closed;
        debug!(session = %id, "session aborted");
        true
    }

    /// Delete stored sessions idle for longer than this session's expiry.
    ///
    /// Returns [`SessionError::GcUnsupported`] if the driver cannot do it.
    pub fn gc(&self) -> Result<usize> {
        let deleted = self.handler.gc(self.config.expire)?;
        info!(handler = self.handler.name(), deleted, "session gc finished");
        Ok(deleted)
    }

    // Token guard

    /// Current anti-forgery token, generating one if needed or forced.
    pub fn get_token(&mut self, force_new: bool) -> Result<String> {
        let store = self.store_mut()?;

        if !force_new {
            if let Some(token) = store.get(TOKEN_ATTRIBUTE).and_then(Value::as_str) {
                return Ok(token.to_string());
            }
        }

        let token = generate_token();
        store.set(TOKEN_ATTRIBUTE, token.clone());
        Ok(token)
    }

    /// Check a presented token against the current one.
    ///
    /// A session that never issued a token matches nothing. On mismatch
    /// with `force_expire` set the session is destroyed.
    pub fn has_token(&mut self, token: &str, force_expire: bool) -> Result<bool> {
        let matched = self
            .store()?
            .get(TOKEN_ATTRIBUTE)
            .and_then(Value::as_str)
            .is_some_and(|expected| tokens_match(expected, token));

        if !matched && force_expire {
            warn!(session = ?self.id, "token mismatch, expiring session");
            self.destroy();
        }
        Ok(matched)
    }

    // Attribute access

    fn store(&self) -> Result<&AttributeStore> {
        if self.state.is_active() {
            Ok(&self.attributes)
        } else {
            Err(SessionError::NotStarted(self.state))
        }
    }

    fn store_mut(&mut self) -> Result<&mut AttributeStore> {
        if self.state.is_active() {
            Ok(&mut self.attributes)
        } else {
            Err(SessionError::NotStarted(self.state))
        }
    }

    /// Get an attribute.
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        Ok(self.store()?.get(name))
    }

    /// Get an attribute or `default` when absent.
    pub fn get_or(&self, name: &str, default: Value) -> Result<Value> {
        Ok(self.store()?.get_or(name, default))
    }

    /// Get an attribute deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        Ok(self.store()?.get_as(name)?)
    }

    /// Set an attribute, returning the previous value.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        Ok(self.store_mut()?.set(name, value))
    }

    /// Check whether an attribute exists.
    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.store()?.has(name))
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Result<Option<Value>> {
        Ok(self.store_mut()?.remove(name))
    }

    /// Remove all attributes; the session stays active.
    pub fn clear(&mut self) -> Result<()> {
        self.store_mut()?.clear();
        Ok(())
    }

    /// Snapshot of all attributes.
    pub fn all(&self) -> Result<AttributeMap> {
        Ok(self.store()?.all())
    }

    /// Iterate over the attributes.
    pub fn iter(&self) -> Result<Iter<'_>> {
        Ok(self.store()?.iter())
    }

    /// Attributes as a JSON object with sorted keys.
    pub fn export(&self) -> Result<Value> {
        let map: serde_json::Map<String, Value> = self
            .store()?
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Ok(Value::Object(map))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state.is_active() {
            if let Err(e) = self.close() {
                warn!(session = ?self.id, "failed to close session on drop: {}", e);
            }
        }
    }
}
