//! Compact HS256 session tokens.
//!
//! Tokens are JWTs (`header.claims.signature`, base64url without padding) signed
//! with HMAC-SHA256 over a process-wide symmetric secret. Validation is
//! stateless: a token is valid while its MAC matches and `exp` has not passed.

mod error;
mod jwt;

pub use error::Error;
pub use jwt::{ALG_HS256, Claims, Header, sign_hs256, verify_hs256};
