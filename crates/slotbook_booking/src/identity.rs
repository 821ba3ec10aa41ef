// --- File: crates/slotbook_booking/src/identity.rs ---
//! Device identity token used to correlate requests for coarse throttling.
//!
//! The token is not a credential. It is read from a store when present,
//! otherwise computed once by a [`FingerprintSource`] and stored. Nothing
//! expires or rotates it. Callers receive the resolved [`DeviceIdentity`] and
//! pass it explicitly to whatever needs it.

use sha2::{Digest, Sha256};
use slotbook_common::{Context, SlotbookError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Fingerprint source failed: {0}")]
    SourceFailed(String),
    #[error("Fingerprint source produced an empty token")]
    EmptyToken,
}

impl From<IdentityError> for SlotbookError {
    fn from(err: IdentityError) -> Self {
        SlotbookError::InternalError(err.to_string())
    }
}

/// Opaque, non-empty device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Computes a fresh device token.
#[cfg_attr(test, mockall::automock)]
pub trait FingerprintSource: Send + Sync {
    fn compute(&self) -> Result<String, IdentityError>;
}

/// Where the token is cached between resolutions.
pub trait IdentityStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, SlotbookError>;
    fn write(&self, token: &str) -> Result<(), SlotbookError>;
}

/// Process-local store; the token lives as long as the store does.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    token: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn read(&self) -> Result<Option<String>, SlotbookError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, token: &str) -> Result<(), SlotbookError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }
}

/// Single-file store, so the token survives restarts of the front end.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn read(&self) -> Result<Option<String>, SlotbookError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading identity file {}", self.path.display()))?;
        let token = raw.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn write(&self, token: &str) -> Result<(), SlotbookError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating identity directory {}", parent.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("writing identity file {}", self.path.display()))
    }
}

/// Stable per-host token: SHA-256 over host attributes, hex encoded.
#[derive(Debug, Default, Clone)]
pub struct HostFingerprint;

impl FingerprintSource for HostFingerprint {
    fn compute(&self) -> Result<String, IdentityError> {
        let attribute = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| std::env::var(key).ok())
                .unwrap_or_default()
        };
        let mut hasher = Sha256::new();
        for part in [
            attribute(&["HOSTNAME", "COMPUTERNAME"]),
            attribute(&["USER", "USERNAME"]),
            std::env::consts::OS.to_string(),
            std::env::consts::ARCH.to_string(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        Ok(hex::encode(&digest[..16]))
    }
}

/// Random token, for hosts without stable attributes.
#[derive(Debug, Default, Clone)]
pub struct RandomFingerprint;

impl FingerprintSource for RandomFingerprint {
    fn compute(&self) -> Result<String, IdentityError> {
        Ok(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Read-if-present, else compute-once-and-store.
pub struct IdentityProvider<S, F> {
    store: S,
    source: F,
}

impl<S: IdentityStore, F: FingerprintSource> IdentityProvider<S, F> {
    pub fn new(store: S, source: F) -> Self {
        Self { store, source }
    }

    /// Returns the cached token or computes and caches a new one.
    ///
    /// A store that cannot be read or written only costs the caching: the
    /// freshly computed token is still returned.
    pub fn resolve(&self) -> Result<DeviceIdentity, IdentityError> {
        match self.store.read() {
            Ok(Some(token)) => {
                if let Some(identity) = DeviceIdentity::new(token) {
                    debug!("Using cached device identity");
                    return Ok(identity);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read cached device identity: {}", e),
        }

        let identity = DeviceIdentity::new(self.source.compute()?).ok_or(IdentityError::EmptyToken)?;
        if let Err(e) = self.store.write(identity.as_str()) {
            warn!("Could not cache device identity: {}", e);
        } else {
            info!("Computed and cached new device identity");
        }
        Ok(identity)
    }
}
