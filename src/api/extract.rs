//! Request extractors: bearer sessions and JSON-error wrappers around
//! axum's body, path and query extractors.

use crate::auth::SessionClaims;
use crate::error::{AppError, AppResult};
use crate::models::AccountKind;
use crate::AppState;
use axum::extract::{FromRequest, FromRequestParts};
use http::header::AUTHORIZATION;
use http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

/// `Json` whose rejection is an `AppError` (400 with a JSON body)
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejection is an `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` whose rejection is an `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Authenticated caller, decoded from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

impl Session {
    pub fn kind(&self) -> AccountKind {
        self.0.kind
    }

    pub fn id(&self) -> Uuid {
        self.0.sub
    }

    /// The caller's id if they are a `kind`, else 403
    pub fn require(&self, kind: AccountKind) -> AppResult<Uuid> {
        self.require_any(&[kind])
    }

    /// The caller's id if their kind is one of `kinds`, else 403
    pub fn require_any(&self, kinds: &[AccountKind]) -> AppResult<Uuid> {
        if kinds.contains(&self.0.kind) {
            Ok(self.0.sub)
        } else {
            let allowed: Vec<&str> = kinds.iter().map(AccountKind::as_str).collect();
            Err(AppError::Forbidden(format!(
                "This action is only available to: {}",
                allowed.join(", ")
            )))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        let claims = state.auth_service.authenticate(token)?;
        Ok(Session(claims))
    }
}
