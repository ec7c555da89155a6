//! Error types for `cardvault-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Codec errors never include key material or plaintext, and
//! token errors never include the token itself.

use cardvault_storage::StoreError;

/// Errors from the secret codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// AES-256-GCM encryption failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// AES-256-GCM decryption failed (wrong key, corrupted ciphertext, or tampered tag).
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },

    /// HKDF key derivation failed.
    #[error("key derivation failed for context '{context}': {reason}")]
    KeyDerivation { context: String, reason: String },

    /// Ciphertext is too short to contain a valid nonce + tag.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort { expected: usize, actual: usize },

    /// The stored text is not a valid ciphertext encoding, or the plaintext is not UTF-8.
    #[error("invalid ciphertext encoding: {reason}")]
    InvalidEncoding { reason: String },
}

/// Errors from bearer token validation.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token could not be parsed or its signature did not verify.
    #[error("invalid token: {reason}")]
    Invalid { reason: String },

    /// The token's `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// Signing a new token failed.
    #[error("token signing failed: {reason}")]
    Signing { reason: String },
}

/// A request body field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required string field is empty or whitespace.
    #[error("{field} should not be empty")]
    Empty { field: &'static str },

    /// A date field is not an ISO 8601 date string.
    #[error("{field} must be a valid ISO 8601 date string")]
    InvalidDate { field: &'static str },
}

/// Outcome of an ownership check that did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    /// No record exists with the requested id.
    #[error("record does not exist")]
    Missing,

    /// The record exists but belongs to someone else.
    #[error("record belongs to another identity")]
    NotOwner,
}

/// Errors from card operations.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// The caller already has a card with this number.
    #[error("Card already exists for this user.")]
    Conflict,

    /// No card with the requested id.
    #[error("Card not found.")]
    NotFound { id: i64 },

    /// The card belongs to another identity.
    #[error("You do not have permission to access this card.")]
    Forbidden { id: i64 },

    /// The request passed shape validation but a field value is unusable.
    #[error("invalid card data: {reason}")]
    Invalid { reason: String },

    /// Persisting the card failed for a reason other than uniqueness.
    #[error("Failed to create card. Please check the provided data.")]
    CreationFailed { source: StoreError },

    /// Encrypting or decrypting the card password failed.
    #[error("card codec error: {0}")]
    Codec(#[from] CodecError),

    /// The store failed while reading or deleting.
    #[error("card store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No credential with the requested id is visible to the caller.
    #[error("Credential not found.")]
    NotFound { id: i64 },

    /// Persisting the credential failed.
    #[error("Failed to create credential. Please check the provided data.")]
    CreationFailed { source: StoreError },

    /// Encrypting or decrypting the credential password failed.
    #[error("credential codec error: {0}")]
    Codec(#[from] CodecError),

    /// The store failed while reading or deleting.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}
