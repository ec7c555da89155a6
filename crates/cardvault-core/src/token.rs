//! Bearer token validation.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret. A valid token
//! yields an [`Identity`] (the numeric user id and email of the caller),
//! which the HTTP gate attaches to the request for downstream handlers.
//!
//! Validation sits behind the [`TokenValidator`] trait so that a validator
//! doing I/O (for example a revocation lookup) can replace [`JwtValidator`]
//! without touching the gate.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
}

/// Claims carried by a CardVault bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id of the token holder.
    pub id: i64,
    /// Email of the token holder.
    pub email: String,
    /// Expiration (Unix seconds).
    pub exp: u64,
    /// Issued-at (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Issuer, checked only when the validator is configured with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies a bearer token and yields the identity it was issued to.
#[async_trait::async_trait]
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate `token`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Invalid`] if the token is malformed or its signature
    ///   does not verify.
    /// - [`TokenError::Expired`] if the token is past its `exp`.
    async fn validate(&self, token: &str) -> Result<Identity, TokenError>;
}

/// HS256 JWT validator (and issuer) keyed by a shared secret.
#[derive(Clone)]
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: Option<String>,
}

impl fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtValidator")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtValidator {
    /// Create a validator for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: None,
        }
    }

    /// Require (and stamp) the given `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sign a token for `identity` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let claims = Claims {
            id: identity.id,
            email: identity.email.clone(),
            exp: now.saturating_add(ttl.as_secs()),
            iat: Some(now),
            iss: self.issuer.clone(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| TokenError::Signing {
                reason: e.to_string(),
            },
        )
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_owned());
        }
        validation
    }
}

#[async_trait::async_trait]
impl TokenValidator for JwtValidator {
    async fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid {
                    reason: e.to_string(),
                },
            })?;

        Ok(Identity {
            id: data.claims.id,
            email: data.claims.email,
        })
    }
}
