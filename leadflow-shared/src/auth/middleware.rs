/// Bearer-token extraction and authorization context
///
/// Handlers validate the `Authorization: Bearer <jwt>` header with
/// [`authenticate`] and get back an [`AuthContext`]; admin endpoints
/// additionally call [`AuthContext::require_admin`]. The public lead
/// submission endpoint uses [`authenticate_optional`], which treats a
/// missing header as anonymous.
///
/// # Example
///
/// ```
/// use axum::http::HeaderMap;
/// use leadflow_shared::auth::middleware::{authenticate, AuthError};
///
/// fn admin_gate(headers: &HeaderMap, secret: &str) -> Result<(), AuthError> {
///     let auth = authenticate(headers, secret)?;
///     auth.require_admin()
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::UserRole;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role carried by the access token
    pub role: UserRole,
}

impl AuthContext {
    /// Ensures the caller is an administrator
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Error type for authentication failures
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Authenticated but not an administrator
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing credentials".to_string(),
            ),
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Administrator role required".to_string(),
            ),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Validates the Authorization header and builds an [`AuthContext`]
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when the header is absent
/// - [`AuthError::InvalidFormat`] when it is not a Bearer token
/// - [`AuthError::InvalidToken`] when the JWT fails validation
pub fn authenticate(headers: &HeaderMap, jwt_secret: &str) -> Result<AuthContext, AuthError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid UTF-8".into()))?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::InvalidFormat("Authorization header must be 'Bearer <token>'".into())
    })?;

    let claims = match validate_access_token(token, jwt_secret) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return Err(AuthError::InvalidToken("Token expired".into())),
        Err(e) => return Err(AuthError::InvalidToken(e.to_string())),
    };

    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
    })
}

/// Like [`authenticate`], but treats a missing header as anonymous
///
/// Used by the public lead submission endpoint: authenticated submitters are
/// attributed, everyone else falls back to the seeded anonymous user.
pub fn authenticate_optional(
    headers: &HeaderMap,
    jwt_secret: &str,
) -> Result<Option<AuthContext>, AuthError> {
    if !headers.contains_key(header::AUTHORIZATION) {
        return Ok(None);
    }

    authenticate(headers, jwt_secret).map(Some)
}
