//! Deterministic derivation of P-256 key pairs from root secrets
//!
//! The derivation is a wire contract: clients that encrypted to a public key
//! served years ago must find the matching private key derivable today.
//! Changing any parameter here (hash, info encoding, retry discipline)
//! invalidates previously issued keys.

use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use p256::SecretKey;
use sha2::Sha256;

use crate::error::{Result, TimelockError};

/// How many candidate scalars to draw before giving up.
const MAX_KEY_ATTEMPTS: usize = 10;

/// P-256 scalars are 32 bytes.
const SCALAR_SIZE: usize = 32;

/// Derives a P-256 private key from a root secret and a time.
///
/// HKDF-SHA-256 with empty salt; the info parameter is the big-endian 8-byte
/// encoding of the time as whole seconds since the Unix epoch, so two inputs
/// denoting the same UTC second derive the same key.
pub fn derive_key_for_time(ikm: &[u8], t: DateTime<Utc>) -> Result<SecretKey> {
    let info = t.timestamp().to_be_bytes();
    let hkdf = Hkdf::<Sha256>::new(None, ikm);

    // Expanding all candidate blocks up front yields the same bytes as
    // reading the HKDF stream 32 bytes at a time.
    let mut candidates = [0u8; SCALAR_SIZE * MAX_KEY_ATTEMPTS];
    hkdf.expand(&info, &mut candidates)
        .map_err(|e| TimelockError::Entropy(e.to_string()))?;

    // Generate-and-check per FIPS 186-4 B.4.2: a candidate is rejected when
    // it is zero or not below the group order. Rejection is vanishingly rare
    // for P-256, so ten attempts in practice never run out.
    for chunk in candidates.chunks_exact(SCALAR_SIZE) {
        if let Ok(key) = SecretKey::from_slice(chunk) {
            return Ok(key);
        }
    }
    Err(TimelockError::KeyAttemptsExhausted(MAX_KEY_ATTEMPTS))
}
