//! `CardVault` HTTP server.
//!
//! Wires the core services, a record store backend, and the bearer token
//! gate into an axum application serving `/cards`, `/credentials`, and
//! `/health`.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod repository;
pub mod routes;
pub mod state;
