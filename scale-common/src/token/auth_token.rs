//! Stateless auth tokens. A token is the URL-safe base64 encoding of the JSON claims
//! followed by an HMAC-SHA256 tag over those claims. Nothing about a token is stored
//! server-side.

use base64::engine::general_purpose::URL_SAFE as b64_urlsafe;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::token::TokenError;

type HmacSha256 = Hmac<Sha256>;

const MAC_LENGTH: usize = 32;
const MAX_TOKEN_LENGTH: usize = 8192;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenClaims {
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Unix seconds
    #[serde(rename = "exp")]
    pub expiration: u64,
}

pub struct AuthToken;

impl AuthToken {
    /// Signs a token naming `identity` as its issuer that stays valid for `lifetime`.
    pub fn issue(identity: &str, lifetime: Duration, signing_key: &[u8]) -> String {
        let claims = AuthTokenClaims {
            issuer: String::from(identity),
            expiration: unix_now().saturating_add(lifetime.as_secs()),
        };

        Self::sign(&claims, signing_key)
    }

    pub fn sign(claims: &AuthTokenClaims, signing_key: &[u8]) -> String {
        let mut token = serde_json::to_vec(claims).expect("Failed to serialize auth token claims");
        let tag = keyed_mac(&token, signing_key).finalize().into_bytes();
        token.extend_from_slice(&tag);

        b64_urlsafe.encode(token)
    }

    /// Returns the issuer of a token that verifies against `signing_key` and has not
    /// expired. Every failure, including an empty issuer, is `TokenError::TokenInvalid`.
    pub fn verify_issuer(token: &str, signing_key: &[u8]) -> Result<String, TokenError> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(TokenError::TokenInvalid);
        }

        let decoded = b64_urlsafe
            .decode(token)
            .map_err(|_| TokenError::TokenInvalid)?;

        let claims_len = match decoded.len().checked_sub(MAC_LENGTH) {
            Some(len) if len > 0 => len,
            _ => return Err(TokenError::TokenInvalid),
        };

        let (claims_json, tag) = decoded.split_at(claims_len);

        // verify_slice compares in constant time
        keyed_mac(claims_json, signing_key)
            .verify_slice(tag)
            .map_err(|_| TokenError::TokenInvalid)?;

        let claims: AuthTokenClaims =
            serde_json::from_slice(claims_json).map_err(|_| TokenError::TokenInvalid)?;

        if claims.expiration <= unix_now() || claims.issuer.is_empty() {
            return Err(TokenError::TokenInvalid);
        }

        Ok(claims.issuer)
    }
}

fn keyed_mac(message: &[u8], signing_key: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(signing_key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
