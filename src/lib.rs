//! # Monty
//!
//! `monty` registers accounts, checks username/password credentials and hands
//! out short-lived signed session tokens.
//!
//! ## Flow
//!
//! 1. `POST /api/create-account` validates the request, hashes the password
//!    with Argon2id and a fresh 16-byte salt, and stores the account.
//! 2. `POST /api/login` verifies the password and sets a `JWTToken` cookie
//!    holding an HS256 token that expires after 15 minutes.
//! 3. Everything under `/protected` requires that cookie. Validation is
//!    stateless (signature and expiry only); there is no server-side session.
//!
//! Anything else is served from the static directory with an `index.html`
//! fallback for the single-page frontend.
//!
//! ## Storage
//!
//! Accounts live in the `PostgreSQL` table created from `sql/schema.sql` at
//! startup. Uniqueness of username and email is enforced by the table's
//! constraints, so concurrent duplicate registrations resolve there.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
