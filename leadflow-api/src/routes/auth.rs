/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
///
/// Registration always creates a regular user; administrator accounts are
/// promoted out of band. Tokens carry the user's role so the admin gate on
/// lead endpoints needs no extra query.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};
use axum::{extract::State, Json};
use leadflow_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// First name
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    /// Last name
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
}

/// Token pair issued on register and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// User ID
    pub user_id: String,

    /// Role at issuance
    pub role: UserRole,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<TokenResponse> {
    let access = jwt::Claims::new(user.id, user.role, jwt::TokenType::Access);
    let refresh = jwt::Claims::new(user.id, user.role, jwt::TokenType::Refresh);

    Ok(TokenResponse {
        user_id: user.id.to_string(),
        role: user.role,
        access_token: jwt::create_token(&access, secret)
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
        refresh_token: jwt::create_token(&refresh, secret)
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
    })
}

/// Registers a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::ValidationError(validation_details(&e)))?;

    let password_hash = password::hash_password(&request.password)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            role: UserRole::User,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(issue_tokens(&user, state.jwt_secret())?))
}

/// Logs a user in, returning access and refresh tokens
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::ValidationError(validation_details(&e)))?;

    let user = User::find_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // The anonymous user's sentinel hash can never verify; treat a hash
    // parse failure the same as a wrong password.
    let verified =
        password::verify_password(&request.password, &user.password_hash).unwrap_or(false);
    if !verified {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::touch_last_login(&state.db, user.id).await?;

    Ok(Json(issue_tokens(&user, state.jwt_secret())?))
}

/// Exchanges a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&request.refresh_token, state.jwt_secret())
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    Ok(Json(RefreshResponse { access_token }))
}
