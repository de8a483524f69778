//! Filesystem session driver: one JSON document per session.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};

use super::{SessionHandler, SessionRecord};
use crate::error::SessionError;
use crate::session::{AttributeMap, Clock, SessionId, SystemClock};
use crate::Result;

const FILE_PREFIX: &str = "sess_";
const RECORD_EXT: &str = "json";
const LEASE_EXT: &str = "lock";

/// How long a takeover guard may be held before others may clear it.
const TAKEOVER_SECS: u64 = 5;

/// Stores each session as `sess_<id>.json` under a directory.
///
/// Leases are `sess_<id>.lock` files holding the unix time the lease runs
/// out, so a crashed writer only blocks the session until then.
#[derive(Debug)]
pub struct FileHandler {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileHandler {
    /// Open (creating if needed) a session directory on the system clock.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Open (creating if needed) a session directory on the given clock.
    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            SessionError::storage(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir, clock })
    }

    /// Directory holding the session files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &SessionId) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", FILE_PREFIX, id, RECORD_EXT))
    }

    fn lease_path(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}{}.{}", FILE_PREFIX, id, LEASE_EXT))
    }

    /// Every stored record, expired ones included. Unreadable files are skipped.
    fn scan(&self) -> Result<Vec<(SessionId, SessionRecord)>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SessionError::storage(format!("cannot list {}: {}", self.dir.display(), e))
        })?;

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(id) = record_id(&path) else {
                continue;
            };
            match read_record(&path) {
                Ok(Some(record)) => found.push((id, record)),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), "skipping unreadable session file: {}", e),
            }
        }
        Ok(found)
    }
}

/// Extract the session id from a `sess_<id>.json` path.
fn record_id(path: &Path) -> Option<SessionId> {
    if path.extension()? != RECORD_EXT {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(FILE_PREFIX)?
        .parse()
        .ok()
}

fn read_record(path: &Path) -> Result<Option<SessionRecord>> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
            SessionError::storage(format!("corrupt session file {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SessionError::storage(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Unix time stored in a lease or guard file; unreadable files count as lapsed.
fn read_deadline(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Sibling path no other writer will pick.
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{:016x}", OsRng.next_u64()));
    PathBuf::from(name)
}

/// Create `path` holding `deadline`, failing with `AlreadyExists` if it is
/// there. The file appears with its full content or not at all.
fn create_exclusive(path: &Path, deadline: u64) -> io::Result<()> {
    let scratch = scratch_path(path);
    fs::write(&scratch, deadline.to_string())?;
    let linked = fs::hard_link(&scratch, path);
    let _ = fs::remove_file(&scratch);
    linked
}

/// Overwrite `path` with `deadline` in one step.
fn replace_atomic(path: &Path, deadline: u64) -> io::Result<()> {
    let scratch = scratch_path(path);
    fs::write(&scratch, deadline.to_string())
        .and_then(|_| fs::rename(&scratch, path))
        .map_err(|e| {
            let _ = fs::remove_file(&scratch);
            e
        })
}

fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SessionError::storage(format!(
            "cannot remove {}: {}",
            path.display(),
            e
        ))),
    }
}

impl SessionHandler for FileHandler {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        let path = self.record_path(id);
        match read_record(&path)? {
            Some(record) if record.is_expired(self.clock.now()) => {
                debug!(session = %id, "discarding expired session file");
                remove_file(&path)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn save(&self, id: &SessionId, attributes: &AttributeMap, expire: Duration) -> Result<()> {
        let record = SessionRecord::new(attributes.clone(), self.clock.now(), expire);
        let content = serde_json::to_vec(&record)?;

        // Readers only ever see complete records.
        let path = self.record_path(id);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                SessionError::storage(format!("cannot write {}: {}", path.display(), e))
            })
    }

    fn delete(&self, id: &SessionId) -> Result<bool> {
        remove_file(&self.record_path(id))
    }

    fn gc(&self, max_lifetime: Duration) -> Result<usize> {
        let now = self.clock.now();
        let mut deleted = 0;

        for (id, record) in self.scan()? {
            if record.is_stale(now, max_lifetime) && remove_file(&self.record_path(&id))? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn lock(&self, id: &SessionId, lease: Duration) -> Result<()> {
        let path = self.lease_path(id);
        let now = self.clock.now();
        let until = now.saturating_add(lease.as_secs());

        match create_exclusive(&path, until) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(SessionError::storage(format!(
                    "cannot create lease {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        if read_deadline(&path) > now {
            return Err(SessionError::Locked(id.to_string()));
        }

        // Only the holder of the takeover guard may replace a lapsed lease.
        let guard = path.with_extension("takeover");
        match create_exclusive(&guard, now.saturating_add(TAKEOVER_SECS)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if read_deadline(&guard) <= now {
                    let _ = fs::remove_file(&guard);
                }
                return Err(SessionError::Locked(id.to_string()));
            }
            Err(e) => {
                return Err(SessionError::storage(format!(
                    "cannot create lease guard {}: {}",
                    guard.display(),
                    e
                )))
            }
        }

        let result = if !path.exists() {
            create_exclusive(&path, until).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => SessionError::Locked(id.to_string()),
                _ => SessionError::storage(format!("cannot write lease: {}", e)),
            })
        } else if read_deadline(&path) > now {
            Err(SessionError::Locked(id.to_string()))
        } else {
            debug!(session = %id, "taking over lapsed lease");
            replace_atomic(&path, until)
                .map_err(|e| SessionError::storage(format!("cannot write lease: {}", e)))
        };
        if let Err(e) = fs::remove_file(&guard) {
            warn!(session = %id, "failed to remove lease guard: {}", e);
        }
        result
    }

    fn unlock(&self, id: &SessionId) -> Result<()> {
        remove_file(&self.lease_path(id)).map(|_| ())
    }

    fn records(&self) -> Result<Vec<(SessionId, SessionRecord)>> {
        let now = self.clock.now();
        Ok(self
            .scan()?
            .into_iter()
            .filter(|(_, record)| !record.is_expired(now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use serde_json::json;
    use tempfile::TempDir;

    const TEN_MIN: Duration = Duration::from_secs(600);

    fn handler_at(now: u64) -> (TempDir, Arc<ManualClock>, FileHandler) {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let handler = FileHandler::with_clock(dir.path().join("sessions"), clock.clone()).unwrap();
        (dir, clock, handler)
    }

    #[test]
    fn test_creates_directory() {
        let (_dir, _clock, handler) = handler_at(1_000);
        assert!(handler.dir().is_dir());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_dir, _clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        let mut attrs = AttributeMap::new();
        attrs.insert("user.name".into(), json!("alice"));

        handler.save(&id, &attrs, TEN_MIN).unwrap();

        let record = handler.load(&id).unwrap().unwrap();
        assert_eq!(record.attributes, attrs);
        assert_eq!(record.last_activity, 1_000);
        assert!(handler.dir().join(format!("sess_{}.json", id)).is_file());
    }

    #[test]
    fn test_load_missing() {
        let (_dir, _clock, handler) = handler_at(1_000);
        assert!(handler.load(&SessionId::generate()).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_storage_error() {
        let (_dir, _clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        fs::write(handler.record_path(&id), "{not json").unwrap();

        assert!(matches!(
            handler.load(&id),
            Err(SessionError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_expired_file_removed_on_load() {
        let (_dir, clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        handler
            .save(&id, &AttributeMap::new(), Duration::from_secs(5))
            .unwrap();

        clock.advance(6);
        assert!(handler.load(&id).unwrap().is_none());
        assert!(!handler.record_path(&id).exists());
    }

    #[test]
    fn test_delete() {
        let (_dir, _clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        handler.save(&id, &AttributeMap::new(), TEN_MIN).unwrap();

        assert!(handler.delete(&id).unwrap());
        assert!(!handler.delete(&id).unwrap());
    }

    #[test]
    fn test_gc_and_records_ignore_foreign_files() {
        let (_dir, clock, handler) = handler_at(1_000);
        handler
            .save(&SessionId::generate(), &AttributeMap::new(), TEN_MIN)
            .unwrap();
        fs::write(handler.dir().join("README.txt"), "not a session").unwrap();
        fs::write(handler.dir().join("sess_bad id.json"), "{}").unwrap();

        clock.advance(50);
        let fresh = SessionId::generate();
        handler.save(&fresh, &AttributeMap::new(), TEN_MIN).unwrap();

        assert_eq!(handler.records().unwrap().len(), 2);
        assert_eq!(handler.gc(Duration::from_secs(10)).unwrap(), 1);

        let remaining = handler.records().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, fresh);
    }

    #[test]
    fn test_lease_roundtrip() {
        let (_dir, clock, handler) = handler_at(1_000);
        let id = SessionId::generate();

        handler.lock(&id, Duration::from_secs(30)).unwrap();
        assert!(matches!(
            handler.lock(&id, Duration::from_secs(30)),
            Err(SessionError::Locked(_))
        ));

        // Lapsed lease can be taken over
        clock.advance(31);
        handler.lock(&id, Duration::from_secs(30)).unwrap();

        handler.unlock(&id).unwrap();
        assert!(!handler.lease_path(&id).exists());
        handler.lock(&id, Duration::from_secs(30)).unwrap();
    }

    #[test]
    fn test_lapsed_lease_taken_over_once() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let id = SessionId::generate();

        let holder = FileHandler::with_clock(dir.path(), clock.clone()).unwrap();
        holder.lock(&id, Duration::from_secs(30)).unwrap();
        clock.advance(31);

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let contenders: Vec<_> = (0..8)
            .map(|_| {
                let handler = FileHandler::with_clock(dir.path(), clock.clone()).unwrap();
                let barrier = barrier.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    handler.lock(&id, Duration::from_secs(30))
                })
            })
            .collect();
        let winners: Vec<_> = contenders.into_iter().map(|t| t.join().unwrap()).collect();

        assert_eq!(winners.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(winners
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SessionError::Locked(_))));
        assert!(!holder.lease_path(&id).with_extension("takeover").exists());
        assert_eq!(read_deadline(&holder.lease_path(&id)), 1_061);
    }

    #[test]
    fn test_unreadable_lease_counts_as_lapsed() {
        let (_dir, _clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        fs::write(handler.lease_path(&id), "").unwrap();

        handler.lock(&id, Duration::from_secs(30)).unwrap();
        assert_eq!(read_deadline(&handler.lease_path(&id)), 1_030);
    }

    #[test]
    fn test_stale_takeover_guard_is_cleared() {
        let (_dir, clock, handler) = handler_at(1_000);
        let id = SessionId::generate();
        handler.lock(&id, Duration::from_secs(30)).unwrap();
        let guard = handler.lease_path(&id).with_extension("takeover");
        fs::write(&guard, "1005").unwrap();

        clock.advance(31);
        assert!(matches!(
            handler.lock(&id, Duration::from_secs(30)),
            Err(SessionError::Locked(_))
        ));
        assert!(!guard.exists());
        handler.lock(&id, Duration::from_secs(30)).unwrap();
    }
}
