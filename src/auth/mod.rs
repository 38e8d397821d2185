//! Authentication core.
//!
//! Leaves first: [`hasher`] derives and checks Argon2id password digests,
//! [`store`] owns user records, [`token`] mints and validates stateless HS256
//! session tokens, and [`gateway`] ties them together for registration, login
//! and the guard in front of protected routes.
//!
//! Nothing here depends on the HTTP layer. The only state shared between
//! requests is the signing secret held by [`token::TokenService`] and whatever
//! the store needs (a connection pool for Postgres).

pub mod error;
pub mod gateway;
pub mod hasher;
pub mod store;
pub mod token;
pub mod types;

pub use error::AuthError;
pub use gateway::AuthGateway;
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};
pub use token::TokenService;
pub use types::{LoginRequest, NewUser, PublicUser, RegisterRequest, User};
