//! Session persistence on the local filesystem.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use directories::ProjectDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use tally_core::{Session, StoreError, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// File name used under the platform data directory.
const SESSION_FILE: &str = "session.json";

/// On-disk layout. Two stable keys; anything else in the file is ignored.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// A [`TokenStore`] that survives process restarts.
///
/// The pair is held in memory, which is authoritative for the running
/// process, and mirrored to a JSON file. Writes land in a temporary file
/// that is renamed over the real one while holding an exclusive lock, so
/// another process reading the file sees the old pair or the new one.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    session: RwLock<Option<Session>>,
    // Serializes set/clear so memory and disk are updated in the same order.
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Open a store backed by `path`, loading any pair already saved there.
    ///
    /// A missing file means no session. A file that is unreadable as JSON
    /// or holds only half a pair is also treated as no session.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            session: RwLock::new(None),
            write_lock: Mutex::new(()),
            path,
        };

        let loaded = store.load()?;
        debug!(found = loaded.is_some(), "Opened session file");
        *store
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = loaded;

        Ok(store)
    }

    /// Open the store at the default per-user location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_location()?)
    }

    /// Returns the default session file path for this platform.
    pub fn default_location() -> Result<PathBuf, StoreError> {
        let dirs = ProjectDirs::from("", "", "tally").ok_or(StoreError::NoStorageDir)?;
        Ok(dirs.data_dir().join(SESSION_FILE))
    }

    /// Returns the path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn load(&self) -> Result<Option<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let stored: StoredSession = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                return Ok(None);
            }
        };

        match (stored.access_token, stored.refresh_token) {
            (Some(access), Some(refresh)) => Ok(Some(Session::from_raw(access, refresh))),
            (None, None) => Ok(None),
            _ => {
                warn!("Ignoring session file with an incomplete token pair");
                Ok(None)
            }
        }
    }

    fn with_file_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StoreError::io(&lock_path, e))?;

        let result = f();

        lock_file
            .unlock()
            .map_err(|e| StoreError::io(&lock_path, e))?;
        result
    }

    fn persist(&self, session: &Session) -> Result<(), StoreError> {
        let stored = StoredSession {
            access_token: Some(session.access_token().as_str().to_string()),
            refresh_token: Some(session.refresh_token().as_str().to_string()),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        self.with_file_lock(|| {
            let temp_path = self.temp_path();
            write_private(&temp_path, json.as_bytes())
                .map_err(|e| StoreError::io(&temp_path, e))?;

            fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))
        })
    }

    fn remove(&self) -> Result<(), StoreError> {
        self.with_file_lock(|| match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        })
    }
}

/// Write `contents` to a fresh file that is owner-only from creation.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    // A leftover from an interrupted write may carry other permissions.
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn set(&self, session: Session) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());

        self.persist(&session)?;
        debug!("Session saved");
        Ok(())
    }

    /// Re-read the file under the lock so a pair saved by another process
    /// replaces the one held in memory.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn reload(&self) -> Option<Session> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match self.with_file_lock(|| self.load()) {
            Ok(loaded) => {
                let mut session = self
                    .session
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if *session != loaded {
                    debug!(found = loaded.is_some(), "Session changed on disk");
                }
                *session = loaded.clone();
                loaded
            }
            Err(e) => {
                warn!(error = %e, "Could not reload session file, keeping the pair in memory");
                self.get()
            }
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;

        self.remove()?;
        debug!("Session cleared");
        Ok(())
    }
}
