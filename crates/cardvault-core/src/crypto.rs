//! Secret codec for `CardVault`.
//!
//! Encrypts single string fields (card and credential passwords) before they
//! reach the record store, and decrypts them for the owning identity on read.
//!
//! # Security model
//!
//! - One process-wide key, derived once at startup from the configured
//!   secret with HKDF-SHA256. No rotation, no per-record keys.
//! - Every encryption generates a fresh 96-bit nonce via `OsRng`.
//! - Stored form: lowercase hex of `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! - Key bytes are zeroized on drop and never appear in `Debug` output.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CodecError;

/// Minimum ciphertext length: 12-byte nonce + 16-byte AES-GCM tag.
const MIN_CIPHERTEXT_LEN: usize = 12 + 16;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// HKDF context label for the field-encryption key.
const FIELD_KEY_INFO: &[u8] = b"cardvault-field-v1";

/// A 256-bit encryption key that is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a key from an arbitrary-length secret using HKDF-SHA256.
    ///
    /// The same secret always yields the same key, so ciphertext written by
    /// one process can be read by the next one configured identically.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::KeyDerivation`] if HKDF expansion fails.
    pub fn derive(secret: &[u8]) -> Result<Self, CodecError> {
        let hk = Hkdf::<Sha256>::new(None, secret);
        let mut derived = [0u8; 32];
        hk.expand(FIELD_KEY_INFO, &mut derived)
            .map_err(|e| CodecError::KeyDerivation {
                context: String::from_utf8_lossy(FIELD_KEY_INFO).into_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self(derived))
    }

    /// Generate a new random key using the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Symmetric encrypt/decrypt of single text fields under one fixed key.
///
/// Construct once at startup and share it (`Arc<SecretCodec>`) with every
/// service that stores secrets.
#[derive(Debug, Clone)]
pub struct SecretCodec {
    key: EncryptionKey,
}

impl SecretCodec {
    /// Build a codec around an already-derived key.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Build a codec from the configured process secret.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::KeyDerivation`] if the key cannot be derived.
    pub fn from_secret(secret: &str) -> Result<Self, CodecError> {
        Ok(Self::new(EncryptionKey::derive(secret.as_bytes())?))
    }

    /// Encrypt `plaintext`, returning its hex-encoded sealed form.
    ///
    /// Two calls with the same input produce different output (fresh nonce).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encryption`] if the AEAD operation fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let sealed = seal(&self.key, plaintext.as_bytes())?;
        Ok(hex::encode(sealed))
    }

    /// Decrypt a value produced by [`SecretCodec::encrypt`] under the same key.
    ///
    /// # Errors
    ///
    /// - [`CodecError::InvalidEncoding`] if the input is not hex or the
    ///   plaintext is not UTF-8.
    /// - [`CodecError::CiphertextTooShort`] if the input cannot hold a nonce and tag.
    /// - [`CodecError::Decryption`] on wrong key or tampered data.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        let sealed = hex::decode(ciphertext).map_err(|e| CodecError::InvalidEncoding {
            reason: e.to_string(),
        })?;
        let plaintext = open(&self.key, &sealed)?;
        String::from_utf8(plaintext).map_err(|e| CodecError::InvalidEncoding {
            reason: format!("plaintext is not valid UTF-8: {e}"),
        })
    }
}

/// Encrypt bytes with AES-256-GCM and a fresh random nonce.
///
/// Returns `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CodecError::Encryption {
            reason: e.to_string(),
        })?;

    let mut combined = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);
    Ok(combined)
}

/// Decrypt the output of [`seal`].
fn open(key: &EncryptionKey, combined: &[u8]) -> Result<Vec<u8>, CodecError> {
    if combined.len() < MIN_CIPHERTEXT_LEN {
        return Err(CodecError::CiphertextTooShort {
            expected: MIN_CIPHERTEXT_LEN,
            actual: combined.len(),
        });
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CodecError::Decryption {
            reason: e.to_string(),
        })
}
