//! Server configuration for `CardVault`.
//!
//! Loads configuration from environment variables. The two secrets have no
//! defaults: the server refuses to start without them.

use std::net::SocketAddr;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set (or is empty).
    #[error("required environment variable {var} is not set")]
    Missing { var: &'static str },

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Record store backend.
    pub storage_backend: StorageBackendType,
    /// Secret the field-encryption key is derived from.
    pub codec_secret: String,
    /// Secret bearer tokens are signed with.
    pub jwt_secret: String,
    /// Expected `iss` claim, if tokens carry one.
    pub jwt_issuer: Option<String>,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("storage_backend", &self.storage_backend)
            .field("codec_secret", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Supported record store backends.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// PostgreSQL.
    Postgres { url: String },
}

impl std::fmt::Debug for StorageBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "Memory"),
            Self::Postgres { .. } => write!(f, "Postgres {{ url: [redacted] }}"),
        }
    }
}

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `CARDVAULT_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:3000`)
    /// - `PORT`: port to bind on `0.0.0.0`
    /// - `CARDVAULT_STORAGE`: `memory` or `postgres` (default: `memory`)
    /// - `DATABASE_URL`: PostgreSQL connection string (required when `CARDVAULT_STORAGE=postgres`)
    /// - `CARDVAULT_SECRET`: field-encryption secret (required)
    /// - `CARDVAULT_JWT_SECRET`: token signing secret (required)
    /// - `CARDVAULT_JWT_ISSUER`: expected token issuer (optional)
    /// - `CARDVAULT_LOG_LEVEL`: log filter (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        // Priority: CARDVAULT_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = get("CARDVAULT_BIND_ADDR") {
            addr.parse().map_err(|e| ConfigError::Invalid {
                var: "CARDVAULT_BIND_ADDR",
                reason: format!("{e}"),
            })?
        } else if let Some(port) = get("PORT") {
            let port: u16 = port.parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(DEFAULT_BIND_ADDR)
        };

        let storage_backend = match get("CARDVAULT_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackendType::Memory,
            "postgres" | "postgresql" => StorageBackendType::Postgres {
                url: get("DATABASE_URL").ok_or(ConfigError::Missing {
                    var: "DATABASE_URL",
                })?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "CARDVAULT_STORAGE",
                    reason: format!("unknown backend '{other}'"),
                });
            }
        };

        let codec_secret = get("CARDVAULT_SECRET").ok_or(ConfigError::Missing {
            var: "CARDVAULT_SECRET",
        })?;
        let jwt_secret = get("CARDVAULT_JWT_SECRET").ok_or(ConfigError::Missing {
            var: "CARDVAULT_JWT_SECRET",
        })?;

        Ok(Self {
            bind_addr,
            storage_backend,
            codec_secret,
            jwt_secret,
            jwt_issuer: get("CARDVAULT_JWT_ISSUER"),
            log_level: get("CARDVAULT_LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
        })
    }
}
