use crate::api::rest::{ApiError, AppState};
use crate::error::Error;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use log::warn;

pub mod auth;
pub mod identity;
pub mod service_account;

#[cfg(test)]
pub mod testing;

/// Identity of the authenticated caller, resolved from the bearer token.
/// Every owned-row query takes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerKey(pub String);

impl OwnerKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for OwnerKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers)
            .ok_or_else(|| Error::Unauthenticated("Unauthorized: missing bearer token".to_string()))?;

        match state.identity.verify_id_token(token).await {
            Ok(uid) => Ok(OwnerKey(uid)),
            Err(e) => {
                warn!("Rejected token on {}: {}", parts.uri.path(), e);
                let err = match e.downcast_ref::<Error>() {
                    Some(Error::Upstream(msg)) => Error::Upstream(msg.clone()),
                    _ => Error::InvalidToken("Forbidden: invalid token".to_string()),
                };
                Err(err.into())
            }
        }
    }
}
