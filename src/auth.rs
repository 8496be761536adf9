// Authorization gate for mutating requests.
//
// Single-tenant model: one shared administrator secret, configured at
// startup and injected into the router state. Reads never pass through
// here; every create/update/delete handler takes `RequireAdmin` as its
// first extractor so the check runs before validation or any store access.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Header absent or not `Bearer <credential>`
    #[error("Unauthorized")]
    MissingCredentials,
    /// Credential present but does not match the administrator secret
    #[error("Unauthorized")]
    InvalidCredentials,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// The configured administrator secret, held in router state.
#[derive(Clone)]
pub struct AdminSecret(Arc<String>);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(secret.into()))
    }

    /// Byte-for-byte comparison, constant time to avoid leaking prefix length.
    fn matches(&self, credential: &str) -> bool {
        credential.as_bytes().ct_eq(self.0.as_bytes()).into()
    }
}

/// Extractor that admits a request only when it carries
/// `Authorization: Bearer <secret>` with the exact administrator secret.
pub struct RequireAdmin;

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    AdminSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let secret = AdminSecret::from_ref(state);
        let credential = bearer_credential(parts)?;

        if secret.matches(credential) {
            Ok(RequireAdmin)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn bearer_credential(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;
    let value = header.to_str().map_err(|_| AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)
}
