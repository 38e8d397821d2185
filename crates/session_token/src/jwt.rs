use crate::Error;
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const ALG_HS256: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Identity claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub admin: bool,
    /// Absolute expiry, unix seconds.
    pub exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn keyed_mac(secret: &[u8], signing_input: &str) -> Result<HmacSha256, Error> {
    if secret.is_empty() {
        return Err(Error::EmptyKey);
    }
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::EmptyKey)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Create an HS256 signed session token.
///
/// # Errors
///
/// Returns an error if the secret is empty or the claims cannot be encoded.
pub fn sign_hs256(secret: &[u8], claims: &Claims) -> Result<String, Error> {
    let header_b64 = b64e_json(&Header::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = keyed_mac(secret, &signing_input)?.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 session token and return its claims.
///
/// The signature is checked before the claims are even decoded, and the MAC
/// comparison is constant time.
///
/// # Errors
///
/// Returns an error if:
/// - the token is not three dot separated segments or the header is not valid base64/json,
/// - the header names an algorithm other than `HS256`,
/// - the signature segment does not decode or does not match,
/// - the claims are not valid base64/json,
/// - `exp` is earlier than `now_unix_seconds`.
pub fn verify_hs256(token: &str, secret: &[u8], now_unix_seconds: i64) -> Result<Claims, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() || header_b64.is_empty() || claims_b64.is_empty() {
        return Err(Error::TokenFormat);
    }

    let header: Header = b64d_json(header_b64)?;
    if header.alg != ALG_HS256 {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature =
        Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::InvalidSignature)?;
    keyed_mac(secret, &signing_input)?
        .verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: Claims = b64d_json(claims_b64)?;
    if claims.exp < now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}
