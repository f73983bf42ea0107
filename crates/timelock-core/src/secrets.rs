//! Interval-aligned persistent root secrets
//!
//! One 32-byte root secret exists per hour-long interval, stored as a single
//! file in the secrets directory. Secrets are created lazily on first request
//! and never modified or deleted afterwards.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, TimelockError};
use crate::fsutil;

/// Size of each root secret in bytes.
pub const SECRET_SIZE: usize = 32;

/// Length of time that each secret covers, in seconds.
///
/// Intervals are aligned to this period, with the Unix epoch as the zero
/// point.
const SECRET_INTERVAL_SECS: i64 = 3600;

/// Format for secret file names. Avoids `:` so the names stay valid on
/// every filesystem developers are known to use.
const FILE_NAME_FORMAT: &str = "%Y-%m-%d@%H.%M.%S";

/// Number of lock shards for serializing creators of the same path.
const LOCK_SHARDS: usize = 64;

/// Associates each time with a persistent root secret.
///
/// Concurrent callers for the same interval are serialized on a lock shard
/// keyed by the file path; callers for distinct intervals proceed in
/// parallel. Secret files are published atomically via rename, so readers
/// observe either the full 32-byte secret or no file at all.
#[derive(Debug)]
pub struct SecretStore {
    dir: PathBuf,
    locks: [Mutex<()>; LOCK_SHARDS],
}

impl SecretStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory must already exist; [`crate::manager::KeyManager`]
    /// creates it during startup.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Returns the path of the secret file covering the given time.
    pub fn secret_path(&self, t: DateTime<Utc>) -> PathBuf {
        let aligned = t.timestamp().div_euclid(SECRET_INTERVAL_SECS) * SECRET_INTERVAL_SECS;
        let interval_start = DateTime::<Utc>::from_timestamp(aligned, 0)
            .expect("hour-aligned timestamp within chrono's representable range");
        self.dir.join(interval_start.format(FILE_NAME_FORMAT).to_string())
    }

    /// Returns the root secret for the given time, creating it if absent.
    ///
    /// Different times within the same interval share a root secret.
    pub fn secret_for_time(&self, t: DateTime<Utc>) -> Result<[u8; SECRET_SIZE]> {
        let path = self.secret_path(t);

        if let Some(secret) = read_secret(&path)? {
            return Ok(secret);
        }

        let _guard = self.locks[shard_for(&path)].lock().unwrap();

        // Another worker may have created the secret while we waited.
        if let Some(secret) = read_secret(&path)? {
            return Ok(secret);
        }

        let mut secret = [0u8; SECRET_SIZE];
        OsRng
            .try_fill_bytes(&mut secret)
            .map_err(|e| TimelockError::Entropy(e.to_string()))?;
        write_secret(&path, &secret)?;
        Ok(secret)
    }
}

/// Reads an existing secret file, surfacing any length other than 32 bytes
/// as corruption.
fn read_secret(path: &Path) -> Result<Option<[u8; SECRET_SIZE]>> {
    let contents = fsutil::read_if_exists(path).map_err(|e| TimelockError::SecretIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    match contents {
        None => Ok(None),
        Some(bytes) => {
            let secret: [u8; SECRET_SIZE] =
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| TimelockError::CorruptSecret {
                        path: path.to_path_buf(),
                        expected: SECRET_SIZE,
                        found: bytes.len(),
                    })?;
            Ok(Some(secret))
        }
    }
}

/// Writes a fresh secret file: temporary sibling, read-only mode, atomic
/// rename into place.
fn write_secret(path: &Path, secret: &[u8; SECRET_SIZE]) -> Result<()> {
    let io_err = |e| TimelockError::SecretIo {
        path: path.to_path_buf(),
        source: e,
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("secret");
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    // A crash between write and rename can leave a read-only temporary
    // behind; clear it so the retry can write.
    let _ = fs::remove_file(&tmp);
    fs::write(&tmp, secret).map_err(io_err)?;
    fsutil::set_read_only(&tmp).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

fn shard_for(path: &Path) -> usize {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() as usize) % LOCK_SHARDS
}
