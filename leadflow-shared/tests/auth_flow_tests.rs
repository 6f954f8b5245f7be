/// End-to-end authentication flow tests
///
/// Exercise the full token lifecycle through the public API: hash a
/// password, issue an access/refresh pair, authenticate a request from the
/// raw Authorization header, and rotate the access token. No database
/// required.

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

use leadflow_shared::auth::jwt::{
    create_token, refresh_access_token, validate_access_token, validate_refresh_token, Claims,
    JwtError, TokenType,
};
use leadflow_shared::auth::middleware::{authenticate, authenticate_optional, AuthError};
use leadflow_shared::auth::password::{hash_password, verify_password};
use leadflow_shared::models::user::UserRole;

const SECRET: &str = "integration-test-secret-32-bytes-min";

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[test]
fn test_login_shaped_flow() {
    // Register: hash the password
    let hash = hash_password("correct horse battery staple").unwrap();
    assert_ne!(hash, "correct horse battery staple");

    // Login: verify and issue a token pair
    assert!(verify_password("correct horse battery staple", &hash).unwrap());
    assert!(!verify_password("wrong password", &hash).unwrap());

    let user_id = Uuid::new_v4();
    let access = create_token(&Claims::new(user_id, UserRole::User, TokenType::Access), SECRET)
        .unwrap();
    let refresh = create_token(
        &Claims::new(user_id, UserRole::User, TokenType::Refresh),
        SECRET,
    )
    .unwrap();

    // Authenticated request: raw header to context
    let ctx = authenticate(&bearer(&access), SECRET).unwrap();
    assert_eq!(ctx.user_id, user_id);
    assert!(matches!(ctx.require_admin(), Err(AuthError::Forbidden)));

    // Refresh: rotate the access token, role carried over
    let rotated = refresh_access_token(&refresh, SECRET).unwrap();
    let claims = validate_access_token(&rotated, SECRET).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.role, UserRole::User);
}

#[test]
fn test_admin_token_passes_the_gate() {
    let token = create_token(
        &Claims::new(Uuid::new_v4(), UserRole::Admin, TokenType::Access),
        SECRET,
    )
    .unwrap();

    let ctx = authenticate(&bearer(&token), SECRET).unwrap();
    assert!(ctx.require_admin().is_ok());
}

#[test]
fn test_tokens_are_not_interchangeable() {
    let user_id = Uuid::new_v4();
    let access = create_token(&Claims::new(user_id, UserRole::User, TokenType::Access), SECRET)
        .unwrap();
    let refresh = create_token(
        &Claims::new(user_id, UserRole::User, TokenType::Refresh),
        SECRET,
    )
    .unwrap();

    // A refresh token is not accepted on requests
    assert!(matches!(
        validate_access_token(&refresh, SECRET),
        Err(JwtError::WrongTokenType { .. })
    ));
    assert!(authenticate(&bearer(&refresh), SECRET).is_err());

    // An access token cannot mint new access tokens
    assert!(matches!(
        validate_refresh_token(&access, SECRET),
        Err(JwtError::WrongTokenType { .. })
    ));
    assert!(refresh_access_token(&access, SECRET).is_err());
}

#[test]
fn test_foreign_signature_rejected() {
    let token = create_token(
        &Claims::new(Uuid::new_v4(), UserRole::Admin, TokenType::Access),
        "some-other-signing-secret-32-bytes!!",
    )
    .unwrap();

    let err = authenticate(&bearer(&token), SECRET).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[test]
fn test_anonymous_submission_path() {
    // No header at all: anonymous, not an error
    let ctx = authenticate_optional(&HeaderMap::new(), SECRET).unwrap();
    assert!(ctx.is_none());

    // A header that is present but broken is still an error
    assert!(authenticate_optional(&bearer("garbage"), SECRET).is_err());
}

#[test]
fn test_sentinel_hash_never_verifies() {
    // The seeded anonymous user stores "!" as its hash; login against it
    // must fail as an invalid hash rather than verify
    assert!(verify_password("anything", "!").is_err());
}
