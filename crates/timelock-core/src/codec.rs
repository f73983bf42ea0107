//! SPKI / PKCS #8 codec for P-256 keys
//!
//! Thin wrappers around the RustCrypto `pkcs8` traits so the rest of the
//! crate never touches ASN.1 directly.

use p256::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use p256::{PublicKey, SecretKey};

use crate::error::{Result, TimelockError};

/// Encodes a public key as a DER SubjectPublicKeyInfo message.
pub fn encode_public_key_der(key: &PublicKey) -> Result<Vec<u8>> {
    let doc = key
        .to_public_key_der()
        .map_err(|e| TimelockError::Encoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Encodes a private key as a DER PKCS #8 PrivateKeyInfo message.
pub fn encode_private_key_der(key: &SecretKey) -> Result<Vec<u8>> {
    let doc = key
        .to_pkcs8_der()
        .map_err(|e| TimelockError::Encoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Encodes a public key as a PEM SubjectPublicKeyInfo message.
pub fn encode_public_key_pem(key: &PublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| TimelockError::Encoding(e.to_string()))
}

/// Parses a DER SubjectPublicKeyInfo message as a P-256 public key.
pub fn parse_public_key_der(der: &[u8]) -> Result<PublicKey> {
    PublicKey::from_public_key_der(der).map_err(|e| TimelockError::Encoding(e.to_string()))
}

/// Parses a DER PKCS #8 PrivateKeyInfo message as a P-256 private key.
pub fn parse_private_key_der(der: &[u8]) -> Result<SecretKey> {
    SecretKey::from_pkcs8_der(der).map_err(|e| TimelockError::Encoding(e.to_string()))
}

/// Parses a PEM SubjectPublicKeyInfo message as a P-256 public key.
pub fn parse_public_key_pem(pem: &str) -> Result<PublicKey> {
    PublicKey::from_public_key_pem(pem).map_err(|e| TimelockError::Encoding(e.to_string()))
}
