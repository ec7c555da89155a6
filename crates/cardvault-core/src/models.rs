//! Domain models.
//!
//! Stored records ([`Card`], [`Credential`]) always hold the password as
//! ciphertext and are never serialized directly. What leaves the service
//! layer is one of the projection types below, each of which omits exactly
//! the fields its operation is not allowed to reveal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use cardvault_storage::Record;

use crate::error::ValidationError;

// ── Cards ────────────────────────────────────────────────────────────

/// Card network role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Credit,
    Debit,
    Both,
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
            Self::Both => write!(f, "BOTH"),
        }
    }
}

impl std::str::FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(Self::Credit),
            "DEBIT" => Ok(Self::Debit),
            "BOTH" => Ok(Self::Both),
            other => Err(format!("unknown card type: {other}")),
        }
    }
}

/// A stored card. `password` is ciphertext.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: i64,
    pub title: String,
    pub name: String,
    pub number: String,
    pub secure_code: String,
    pub password: String,
    pub expiration_date: NaiveDate,
    pub is_virtual: bool,
    pub card_type: CardType,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A card ready to be persisted. `password` is already ciphertext.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub title: String,
    pub name: String,
    pub number: String,
    pub secure_code: String,
    pub password: String,
    pub expiration_date: NaiveDate,
    pub is_virtual: bool,
    pub card_type: CardType,
    pub author_id: i64,
}

impl Record for Card {
    type Draft = NewCard;
    const KIND: &'static str = "card";

    fn id(&self) -> i64 {
        self.id
    }

    fn author_id(&self) -> i64 {
        self.author_id
    }

    /// One card per `(author, number)`.
    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.author_id, self.number))
    }

    fn from_draft(id: i64, draft: NewCard) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title,
            name: draft.name,
            number: draft.number,
            secure_code: draft.secure_code,
            password: draft.password,
            expiration_date: draft.expiration_date,
            is_virtual: draft.is_virtual,
            card_type: draft.card_type,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for creating a card.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCard {
    pub title: String,
    pub name: String,
    pub number: String,
    pub secure_code: String,
    pub password: String,
    pub expiration_date: String,
    pub is_virtual: bool,
    #[serde(rename = "type")]
    pub card_type: CardType,
}

impl CreateCard {
    /// Check the field values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("number", &self.number)?;
        require_non_empty("secureCode", &self.secure_code)?;
        require_non_empty("password", &self.password)?;
        require_non_empty("expirationDate", &self.expiration_date)?;
        if parse_expiration_date(&self.expiration_date).is_none() {
            return Err(ValidationError::InvalidDate {
                field: "expirationDate",
            });
        }
        Ok(())
    }
}

/// Card as returned on creation: no password, no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    pub id: i64,
    pub title: String,
    pub name: String,
    pub number: String,
    pub secure_code: String,
    pub expiration_date: NaiveDate,
    pub is_virtual: bool,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub author_id: i64,
}

impl From<Card> for CardSummary {
    fn from(c: Card) -> Self {
        Self {
            id: c.id,
            title: c.title,
            name: c.name,
            number: c.number,
            secure_code: c.secure_code,
            expiration_date: c.expiration_date,
            is_virtual: c.is_virtual,
            card_type: c.card_type,
            author_id: c.author_id,
        }
    }
}

/// Card as returned to its owner on read, with the password decrypted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: i64,
    pub title: String,
    pub name: String,
    pub number: String,
    pub secure_code: String,
    pub password: String,
    pub expiration_date: NaiveDate,
    pub is_virtual: bool,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CardView {
    /// Replace the stored ciphertext with the given plaintext.
    #[must_use]
    pub fn with_password(c: Card, password: String) -> Self {
        Self {
            id: c.id,
            title: c.title,
            name: c.name,
            number: c.number,
            secure_code: c.secure_code,
            password,
            expiration_date: c.expiration_date,
            is_virtual: c.is_virtual,
            card_type: c.card_type,
            author_id: c.author_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Card as returned on deletion: no password, secure code, or timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCard {
    pub id: i64,
    pub title: String,
    pub name: String,
    pub number: String,
    pub expiration_date: NaiveDate,
    pub is_virtual: bool,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub author_id: i64,
}

impl From<Card> for DeletedCard {
    fn from(c: Card) -> Self {
        Self {
            id: c.id,
            title: c.title,
            name: c.name,
            number: c.number,
            expiration_date: c.expiration_date,
            is_virtual: c.is_virtual,
            card_type: c.card_type,
            author_id: c.author_id,
        }
    }
}

/// Parse an ISO 8601 date (`2023-12-02`) or datetime, keeping the date.
///
/// Datetimes with an offset are normalized to UTC first; local datetimes
/// (`2023-12-02T10:00:00`) keep their own date.
#[must_use]
pub fn parse_expiration_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

// ── Credentials ──────────────────────────────────────────────────────

/// A stored login credential. `password` is ciphertext.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A credential ready to be persisted. `password` is already ciphertext.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub title: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub author_id: i64,
}

impl Record for Credential {
    type Draft = NewCredential;
    const KIND: &'static str = "credential";

    fn id(&self) -> i64 {
        self.id
    }

    fn author_id(&self) -> i64 {
        self.author_id
    }

    fn from_draft(id: i64, draft: NewCredential) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title,
            url: draft.url,
            username: draft.username,
            password: draft.password,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for creating a credential.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCredential {
    pub title: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

impl CreateCredential {
    /// Check the field values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("url", &self.url)?;
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

/// Credential without its password or timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub username: String,
    pub author_id: i64,
}

impl From<Credential> for CredentialSummary {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            title: c.title,
            url: c.url,
            username: c.username,
            author_id: c.author_id,
        }
    }
}

/// Credential as returned to its owner on read, with the password decrypted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialView {
    /// Replace the stored ciphertext with the given plaintext.
    #[must_use]
    pub fn with_password(c: Credential, password: String) -> Self {
        Self {
            id: c.id,
            title: c.title,
            url: c.url,
            username: c.username,
            password,
            author_id: c.author_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ── Notes ────────────────────────────────────────────────────────────

/// Request body for a note. Notes are validated but not yet stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub description: String,
}

impl CreateNote {
    /// Check that both fields are present.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("description", &self.description)
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}
