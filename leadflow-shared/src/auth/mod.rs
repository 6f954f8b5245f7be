/// Authentication utilities
///
/// - `jwt`: Access/refresh token creation and validation
/// - `password`: Argon2id hashing and verification
/// - `middleware`: Bearer-token extraction and the admin gate

pub mod jwt;
pub mod middleware;
pub mod password;
