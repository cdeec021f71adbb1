//! Two-step login: password, then a one-time code, then a session token.

use crate::auth::{otp, verify_password, SessionClaims, SessionCodec};
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::otp::MAX_OTP_ATTEMPTS;
use crate::models::AccountKind;
use crate::repositories::{AccountRepository, OtpRepository};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Response to a successful password check
#[derive(Debug, Clone, Serialize)]
pub struct LoginChallenge {
    pub otp_required: bool,
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Only present when OTP echo is enabled in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Issued session
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: i64,
    pub session: SessionClaims,
}

pub struct AuthService {
    account_repo: Arc<AccountRepository>,
    otp_repo: Arc<OtpRepository>,
    sessions: SessionCodec,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        account_repo: Arc<AccountRepository>,
        otp_repo: Arc<OtpRepository>,
        sessions: SessionCodec,
        config: AuthConfig,
    ) -> Self {
        Self {
            account_repo,
            otp_repo,
            sessions,
            config,
        }
    }

    fn invalid_credentials() -> AppError {
        AppError::Unauthorized("Invalid username or password".to_string())
    }

    fn invalid_code() -> AppError {
        AppError::Unauthorized("Invalid or expired verification code".to_string())
    }

    /// Check the password and issue a fresh one-time code
    pub async fn login(
        &self,
        kind: AccountKind,
        username: &str,
        password: &str,
    ) -> AppResult<LoginChallenge> {
        let credentials = self
            .account_repo
            .find_credentials(kind, username.trim())
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        if !verify_password(password, &credentials.password_hash) {
            warn!("Failed login for {} {}", kind, credentials.username);
            return Err(Self::invalid_credentials());
        }

        let code = otp::generate_code(self.config.otp_length);
        let expires_at = Utc::now().naive_utc() + Duration::seconds(self.config.otp_ttl_secs);
        self.otp_repo
            .upsert(
                kind,
                credentials.id,
                &otp::hash_code(credentials.id, &code),
                expires_at,
            )
            .await?;

        info!("Issued login code for {} {}", kind, credentials.id);
        Ok(LoginChallenge {
            otp_required: true,
            expires_in: self.config.otp_ttl_secs,
            otp: self.config.otp_echo.then_some(code),
        })
    }

    /// Exchange a valid one-time code for a session token.
    ///
    /// A code works once. Expired codes and codes that have seen too many
    /// wrong guesses are discarded.
    pub async fn verify_otp(
        &self,
        kind: AccountKind,
        username: &str,
        code: &str,
    ) -> AppResult<SessionGrant> {
        let credentials = self
            .account_repo
            .find_credentials(kind, username.trim())
            .await?
            .ok_or_else(Self::invalid_code)?;
        let account_id = credentials.id;

        let Some((code_hash, attempts)) = self
            .otp_repo
            .reserve_attempt(kind, account_id, MAX_OTP_ATTEMPTS)
            .await?
        else {
            return Err(Self::invalid_code());
        };

        if !otp::code_matches(account_id, code, &code_hash) {
            warn!(
                "Wrong login code for {} {} (attempt {})",
                kind, account_id, attempts
            );
            if attempts >= MAX_OTP_ATTEMPTS {
                self.otp_repo.discard(kind, account_id, &code_hash).await?;
            }
            return Err(Self::invalid_code());
        }

        // Lost to a concurrent verify or a newer login
        if !self
            .otp_repo
            .consume(kind, account_id, &code_hash, MAX_OTP_ATTEMPTS)
            .await?
        {
            return Err(Self::invalid_code());
        }

        let account = self
            .account_repo
            .find_account(kind, account_id)
            .await?
            .ok_or_else(Self::invalid_code)?;

        let claims = self.sessions.claims_for(&account, Utc::now().timestamp());
        let token = self
            .sessions
            .encode(&claims)
            .map_err(|e| AppError::Message(format!("Failed to sign session: {}", e)))?;

        info!("{} {} logged in", kind, account_id);
        Ok(SessionGrant {
            token,
            expires_at: claims.exp,
            session: claims,
        })
    }

    /// Decode a bearer token
    pub fn authenticate(&self, token: &str) -> AppResult<SessionClaims> {
        Ok(self.sessions.decode(token, Utc::now().timestamp())?)
    }
}
