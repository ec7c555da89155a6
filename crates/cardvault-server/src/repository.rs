//! `PostgreSQL` record stores for cards and credentials.
//!
//! Each store owns its table and creates it on [`connect`] if missing. The
//! `(author_id, number)` uniqueness of cards is enforced by the database, so
//! concurrent duplicate creates resolve to exactly one winner and one
//! [`StoreError::UniqueViolation`].

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use cardvault_core::models::{Card, Credential, NewCard, NewCredential};
use cardvault_storage::{Record, RecordStore, StoreError};

const SCHEMA: [&str; 2] = [
    r"CREATE TABLE IF NOT EXISTS cards (
        id              BIGSERIAL   PRIMARY KEY,
        title           TEXT        NOT NULL,
        name            TEXT        NOT NULL,
        number          TEXT        NOT NULL,
        secure_code     TEXT        NOT NULL,
        password        TEXT        NOT NULL,
        expiration_date DATE        NOT NULL,
        is_virtual      BOOLEAN     NOT NULL,
        card_type       TEXT        NOT NULL,
        author_id       BIGINT      NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT cards_author_id_number_key UNIQUE (author_id, number)
    )",
    r"CREATE TABLE IF NOT EXISTS credentials (
        id         BIGSERIAL   PRIMARY KEY,
        title      TEXT        NOT NULL,
        url        TEXT        NOT NULL,
        username   TEXT        NOT NULL,
        password   TEXT        NOT NULL,
        author_id  BIGINT      NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

/// Connect to `PostgreSQL` and make sure both tables exist.
///
/// # Errors
///
/// Returns [`StoreError::Open`] if the connection or schema creation fails.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Open {
            target: "postgres".to_owned(),
            reason: e.to_string(),
        })?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Open {
                target: "postgres".to_owned(),
                reason: format!("failed to create schema: {e}"),
            })?;
    }

    tracing::info!("postgres schema ready");
    Ok(pool)
}

/// Translate a sqlx error, keeping unique violations distinguishable.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or("unknown").to_owned(),
            };
        }
    }
    StoreError::Backend {
        reason: err.to_string(),
    }
}

// ── Cards ────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct CardRow {
    id: i64,
    title: String,
    name: String,
    number: String,
    secure_code: String,
    password: String,
    expiration_date: NaiveDate,
    is_virtual: bool,
    card_type: String,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = StoreError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let card_type = row
            .card_type
            .parse()
            .map_err(|reason| StoreError::Backend { reason })?;
        Ok(Self {
            id: row.id,
            title: row.title,
            name: row.name,
            number: row.number,
            secure_code: row.secure_code,
            password: row.password,
            expiration_date: row.expiration_date,
            is_virtual: row.is_virtual,
            card_type,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Card store backed by the `cards` table.
#[derive(Debug, Clone)]
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordStore<Card> for PgCardStore {
    async fn create(&self, draft: NewCard) -> Result<Card, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(
            r"INSERT INTO cards
                (title, name, number, secure_code, password, expiration_date,
                 is_virtual, card_type, author_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
              RETURNING *",
        )
        .bind(&draft.title)
        .bind(&draft.name)
        .bind(&draft.number)
        .bind(&draft.secure_code)
        .bind(&draft.password)
        .bind(draft.expiration_date)
        .bind(draft.is_virtual)
        .bind(draft.card_type.to_string())
        .bind(draft.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Card::try_from(row)
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Card>, StoreError> {
        sqlx::query_as::<_, CardRow>("SELECT * FROM cards WHERE author_id = $1 ORDER BY id")
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?
            .into_iter()
            .map(Card::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Card>, StoreError> {
        sqlx::query_as::<_, CardRow>("SELECT * FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .map(Card::try_from)
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<Card, StoreError> {
        sqlx::query_as::<_, CardRow>("DELETE FROM cards WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound {
                kind: Card::KIND,
                id,
            })
            .and_then(Card::try_from)
    }
}

// ── Credentials ──────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    title: String,
    url: String,
    username: String,
    password: String,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            username: row.username,
            password: row.password,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Credential store backed by the `credentials` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordStore<Credential> for PgCredentialStore {
    async fn create(&self, draft: NewCredential) -> Result<Credential, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"INSERT INTO credentials (title, url, username, password, author_id)
              VALUES ($1, $2, $3, $4, $5)
              RETURNING *",
        )
        .bind(&draft.title)
        .bind(&draft.url)
        .bind(&draft.username)
        .bind(&draft.password)
        .bind(draft.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.into())
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT * FROM credentials WHERE author_id = $1 ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Credential::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>("SELECT * FROM credentials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(row.map(Credential::from))
    }

    async fn delete(&self, id: i64) -> Result<Credential, StoreError> {
        sqlx::query_as::<_, CredentialRow>("DELETE FROM credentials WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .map(Credential::from)
            .ok_or(StoreError::NotFound {
                kind: Credential::KIND,
                id,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;

    use sqlx::error::{DatabaseError, ErrorKind};

    use cardvault_core::cards::CardService;
    use cardvault_core::crypto::{EncryptionKey, SecretCodec};
    use cardvault_core::error::CardError;
    use cardvault_core::models::{CardType, CreateCard};
    use cardvault_core::token::Identity;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct PgFailure {
        code: &'static str,
        constraint: Option<&'static str>,
        message: String,
    }

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            &self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            if self.code == "23505" {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn pg_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure {
            code,
            constraint,
            message: format!("sqlstate {code}"),
        }))
    }

    #[test]
    fn unique_violation_keeps_constraint_name() {
        let err = map_sqlx(pg_error("23505", Some("cards_author_id_number_key")));
        assert!(
            matches!(
                err,
                StoreError::UniqueViolation { ref constraint }
                    if constraint == "cards_author_id_number_key"
            ),
            "{err:?}"
        );
    }

    #[test]
    fn unique_violation_without_constraint_name() {
        assert!(matches!(
            map_sqlx(pg_error("23505", None)),
            StoreError::UniqueViolation { ref constraint } if constraint == "unknown"
        ));
    }

    #[test]
    fn other_sqlstates_are_backend_errors() {
        for code in ["23503", "23502", "42P01", "40001"] {
            assert!(matches!(
                map_sqlx(pg_error(code, None)),
                StoreError::Backend { .. }
            ));
        }
        assert!(matches!(
            map_sqlx(sqlx::Error::PoolTimedOut),
            StoreError::Backend { .. }
        ));
    }

    /// Card store whose inserts fail the way `PostgreSQL` reports a
    /// duplicate `(author_id, number)`.
    struct DuplicateNumberStore;

    #[async_trait::async_trait]
    impl RecordStore<Card> for DuplicateNumberStore {
        async fn create(&self, _draft: NewCard) -> Result<Card, StoreError> {
            Err(map_sqlx(pg_error("23505", Some("cards_author_id_number_key"))))
        }

        async fn find_by_author(&self, _author_id: i64) -> Result<Vec<Card>, StoreError> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: i64) -> Result<Option<Card>, StoreError> {
            Ok(None)
        }

        async fn delete(&self, id: i64) -> Result<Card, StoreError> {
            Err(StoreError::NotFound { kind: Card::KIND, id })
        }
    }

    #[tokio::test]
    async fn postgres_duplicate_surfaces_as_conflict() {
        let codec = Arc::new(SecretCodec::new(EncryptionKey::generate()));
        let cards = CardService::new(Arc::new(DuplicateNumberStore), codec);
        let input = CreateCard {
            title: "T".to_owned(),
            name: "N".to_owned(),
            number: "1111".to_owned(),
            secure_code: "111".to_owned(),
            password: "p@ss".to_owned(),
            expiration_date: "2023-12-02".to_owned(),
            is_virtual: true,
            card_type: CardType::Credit,
        };
        let identity = Identity {
            id: 1,
            email: "user1@example.com".to_owned(),
        };

        let result = cards.create(input, &identity).await;
        assert!(matches!(result, Err(CardError::Conflict)));
    }
}
