//! Signed session tokens.
//!
//! A token is `base64url(claims json) "." base64url(HMAC-SHA256(claims json))`.
//! Claims carry a denormalized snapshot of the account so most handlers
//! never need to load it. Tokens are opaque to clients.

use crate::models::{Account, AccountKind};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Session token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: Uuid,
    pub kind: AccountKind,
    pub username: String,
    pub display_name: String,
    /// Kind-specific attributes at login time
    pub profile: Value,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Session token verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed session token")]
    Malformed,

    #[error("invalid session token signature")]
    BadSignature,

    #[error("session token expired")]
    Expired,
}

/// Issues and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl SessionCodec {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        <HmacSha256 as Mac>::new_from_slice(&self.key).map_err(|_| TokenError::Malformed)
    }

    /// Claims for `account`, valid from `now` for the configured TTL
    pub fn claims_for(&self, account: &Account, now: i64) -> SessionClaims {
        SessionClaims {
            sub: account.id(),
            kind: account.kind(),
            username: account.username().to_string(),
            display_name: account.display_name().to_string(),
            profile: account.snapshot(),
            iat: now,
            exp: now + self.ttl_secs,
        }
    }

    /// Sign claims into an opaque token
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify the signature, then the expiry, and return the claims
    pub fn decode(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
