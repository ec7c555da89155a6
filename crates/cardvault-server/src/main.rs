//! `CardVault` server entry point.
//!
//! Loads configuration, selects the record store backend, builds the card
//! and credential services, and serves the axum application with graceful
//! shutdown. The `issue-token` subcommand mints a bearer token for operators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use cardvault_core::cards::CardService;
use cardvault_core::credentials::CredentialService;
use cardvault_core::crypto::SecretCodec;
use cardvault_core::models::{Card, Credential};
use cardvault_core::token::{Identity, JwtValidator};
use cardvault_storage::{MemoryStore, RecordStore};

use cardvault_server::config::{ServerConfig, StorageBackendType};
use cardvault_server::repository::{self, PgCardStore, PgCredentialStore};
use cardvault_server::routes;
use cardvault_server::state::AppState;

#[derive(Parser)]
#[command(
    name = "cardvault-server",
    version,
    about = "CardVault: encrypted card and credential vault"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default).
    Serve,
    /// Print a signed bearer token for the given user.
    IssueToken {
        /// Numeric user id.
        id: i64,
        /// User email.
        email: String,
        /// Token lifetime in seconds.
        #[arg(default_value_t = 3600)]
        ttl_secs: u64,
        #[arg(long, env = "CARDVAULT_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
        #[arg(long, env = "CARDVAULT_JWT_ISSUER")]
        issuer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::IssueToken {
            id,
            email,
            ttl_secs,
            jwt_secret,
            issuer,
        } => issue_token(id, email, ttl_secs, &jwt_secret, issuer),
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "CardVault starting");

    let state = build_app_state(&config).await?;
    let app = routes::router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "CardVault server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("CardVault server stopped");
    Ok(())
}

/// Build the shared application state for the configured backend.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let (card_store, credential_store): (
        Arc<dyn RecordStore<Card>>,
        Arc<dyn RecordStore<Credential>>,
    ) = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            (
                Arc::new(MemoryStore::<Card>::new()),
                Arc::new(MemoryStore::<Credential>::new()),
            )
        }
        StorageBackendType::Postgres { url } => {
            info!(url = %"[redacted]", "using PostgreSQL storage");
            let pool = repository::connect(url)
                .await
                .context("failed to connect to PostgreSQL storage")?;
            (
                Arc::new(PgCardStore::new(pool.clone())),
                Arc::new(PgCredentialStore::new(pool)),
            )
        }
    };

    let codec = Arc::new(
        SecretCodec::from_secret(&config.codec_secret)
            .context("failed to derive field encryption key")?,
    );

    let mut validator = JwtValidator::new(&config.jwt_secret);
    if let Some(issuer) = &config.jwt_issuer {
        validator = validator.with_issuer(issuer.clone());
    }

    Ok(Arc::new(AppState {
        cards: CardService::new(card_store, Arc::clone(&codec)),
        credentials: CredentialService::new(credential_store, codec),
        token_validator: Arc::new(validator),
    }))
}

#[allow(clippy::print_stdout)]
fn issue_token(
    id: i64,
    email: String,
    ttl_secs: u64,
    jwt_secret: &str,
    issuer: Option<String>,
) -> anyhow::Result<()> {
    let mut validator = JwtValidator::new(jwt_secret);
    if let Some(issuer) = issuer {
        validator = validator.with_issuer(issuer);
    }

    let token = validator
        .issue(&Identity { id, email }, Duration::from_secs(ttl_secs))
        .context("failed to sign token")?;
    println!("{token}");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
