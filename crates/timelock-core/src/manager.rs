//! Associates times to P-256 key pairs
//!
//! The manager glues the secret store and the deriver together: it resolves
//! the PKI identity at startup, range-checks requested times, fetches the
//! covering root secret, and derives the per-second key pair.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use p256::SecretKey;
use uuid::Uuid;

use crate::config::{reconcile, ConfigSource, FileSource, GeneratorSource, MemorySource};
use crate::derive::derive_key_for_time;
use crate::error::{Result, TimelockError};
use crate::secrets::SecretStore;

/// PKI identity and serving options.
#[derive(Debug, Clone)]
pub struct PkiOptions {
    /// Human-readable name of this PKI. Reconciled with the `name` file in
    /// the secrets directory.
    pub name: Option<String>,
    /// Deployment UUID. Reconciled with the `uuid` file in the secrets
    /// directory; minted fresh when neither is present.
    pub id: Option<Uuid>,
    /// Earliest time served, inclusive.
    pub min_time: DateTime<Utc>,
    /// Latest time served, inclusive.
    pub max_time: DateTime<Utc>,
}

/// Associates times to P-256 key pairs.
#[derive(Debug)]
pub struct KeyManager {
    store: SecretStore,
    name: String,
    pki_id: Uuid,
    min_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
}

impl KeyManager {
    /// Opens a key manager over the given secrets directory.
    ///
    /// Creates the directory if needed and reconciles the PKI name and ID
    /// across the supplied options and the `name`/`uuid` files. A value that
    /// conflicts with one already persisted fails startup.
    pub fn open(options: PkiOptions, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| TimelockError::SecretsDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut name_sources: Vec<Box<dyn ConfigSource>> = vec![
            Box::new(MemorySource::new(
                "PKI name",
                options.name.unwrap_or_default(),
            )),
            Box::new(FileSource::new("PKI name", dir.join("name"))),
        ];
        let name = reconcile("PKI name", &mut name_sources)?;

        let mut id_sources: Vec<Box<dyn ConfigSource>> = vec![
            Box::new(MemorySource::new(
                "PKI ID",
                options.id.map(|id| id.to_string()).unwrap_or_default(),
            )),
            Box::new(FileSource::new("PKI ID", dir.join("uuid"))),
            Box::new(GeneratorSource::new("PKI ID", || {
                Ok(Uuid::new_v4().to_string())
            })),
        ];
        let pki_id = Uuid::parse_str(&reconcile("PKI ID", &mut id_sources)?)?;

        Ok(Self {
            store: SecretStore::new(dir),
            name,
            pki_id,
            min_time: options.min_time,
            max_time: options.max_time,
        })
    }

    /// The PKI name of this deployment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The PKI ID of this deployment.
    pub fn pki_id(&self) -> Uuid {
        self.pki_id
    }

    /// Earliest time served, inclusive.
    pub fn min_time(&self) -> DateTime<Utc> {
        self.min_time
    }

    /// Latest time served, inclusive.
    pub fn max_time(&self) -> DateTime<Utc> {
        self.max_time
    }

    /// Returns the private key for the given time.
    ///
    /// Times are normalized to whole seconds of UTC, so any two inputs
    /// denoting the same absolute second yield byte-identical keys. The
    /// public half is available via [`p256::SecretKey::public_key`].
    pub fn key_for_time(&self, t: DateTime<Utc>) -> Result<SecretKey> {
        if t < self.min_time || t > self.max_time {
            return Err(TimelockError::OutOfRange {
                requested: t,
                min: self.min_time,
                max: self.max_time,
            });
        }
        let secret = self.store.secret_for_time(t)?;
        derive_key_for_time(&secret, t)
    }
}
