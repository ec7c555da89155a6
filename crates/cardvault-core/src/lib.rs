//! Core library for `CardVault`.
//!
//! Contains the secret codec, bearer token validation, the ownership check,
//! domain models, and the card and credential services. This crate depends
//! on `cardvault-storage` for the record store trait and knows nothing about
//! HTTP or any particular database.

pub mod cards;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod models;
pub mod ownership;
pub mod token;
