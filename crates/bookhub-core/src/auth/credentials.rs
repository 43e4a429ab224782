//! Token persistence.
//!
//! The request client and session controller depend only on the
//! [`CredentialStore`] trait, so tests run against [`MemoryCredentialStore`]
//! without touching the user's real storage.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, info, warn};

use crate::config::{Config, CredentialBackend, APP_NAME};

/// Key under which the access token is stored
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key under which the refresh token is stored
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Credential file name in the data directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Key/value persistence for session tokens.
///
/// `get` never fails: an unreadable or missing value is reported as absent.
/// `clear` and `clear_all` are idempotent.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn clear(&self, key: &str) -> Result<()>;

    /// Remove both session tokens
    fn clear_all(&self) -> Result<()> {
        self.clear(ACCESS_TOKEN_KEY)?;
        self.clear(REFRESH_TOKEN_KEY)
    }
}

pub type SharedCredentialStore = Arc<dyn CredentialStore>;

/// Open the backend selected in the configuration.
pub fn open_credential_store(config: &Config) -> Result<SharedCredentialStore> {
    let store: SharedCredentialStore = match config.credential_backend {
        CredentialBackend::File => {
            let path = config.data_dir()?.join(CREDENTIALS_FILE);
            Arc::new(FileCredentialStore::open(path)?)
        }
        CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new()),
        CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
    };
    debug!(backend = ?config.credential_backend, "Credential store opened");
    Ok(store)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Memory backend
// ============================================================================

#[derive(Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Tokens kept in a JSON object on disk.
///
/// The file is read once on open and rewritten after every mutation.
pub struct FileCredentialStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileCredentialStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read credential file {}", path.display()))?;
            match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Ignoring unreadable credential file");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        info!(path = %path.display(), entries = values.len(), "Loaded credential file");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write credential file {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credential file permissions")?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut values = lock(&self.values);
        if values.contains_key(key) {
            let mut next = values.clone();
            next.remove(key);
            self.persist(&next)?;
            *values = next;
        }
        Ok(())
    }
}

// ============================================================================
// Keyring backend
// ============================================================================

/// Tokens kept in the OS keychain, one entry per key.
/// Entries are created once per key and reused for the store's lifetime.
pub struct KeyringCredentialStore {
    service: String,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: APP_NAME.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, key: &str) -> Result<Arc<Entry>> {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get(key) {
            return Ok(Arc::clone(entry));
        }
        let entry = Arc::new(
            Entry::new(&self.service, key).context("Failed to create keyring entry")?,
        );
        entries.insert(key.to_string(), Arc::clone(&entry));
        Ok(entry)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        let entry = self.entry(key).ok()?;
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, key, "Failed to read token from keychain");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn clear(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
