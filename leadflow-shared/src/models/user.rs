/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing user
/// accounts. Administrators (`role = 'admin'`) review submitted leads; regular
/// users see only what they submitted themselves.
///
/// Guest submissions are attributed to a seeded anonymous user row (see
/// [`ANONYMOUS_USER_ID`]) so the `submitted_by_id` foreign key on leads always
/// references a real row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use leadflow_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "admin@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Maria".to_string(),
///     last_name: "Lopez".to_string(),
///     role: UserRole::Admin,
/// }).await?;
///
/// let admins = User::list_admins(&pool).await?;
/// assert!(admins.iter().any(|a| a.id == user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Fixed ID of the seeded anonymous user backing guest submissions
///
/// Inserted by migration with an unusable password hash. Never eligible to
/// log in; exists so guest-submitted leads satisfy the foreign key on
/// `submitted_by_id`.
pub const ANONYMOUS_USER_ID: Uuid = Uuid::from_u128(1);

/// User authorization role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user: manages only leads they submitted
    User,

    /// Administrator: reviews and decides leads for all users
    Admin,
}

impl UserRole {
    /// Converts role to string for storage and token claims
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Parses a role from its lowercase wire form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Authorization role
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Directory listing row: account fields plus per-user lead activity
///
/// `approved_leads` counts decisions the user made as an admin; it is zero
/// for regular users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Authorization role
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,

    /// Leads this user submitted
    pub submitted_leads: i64,

    /// Leads this user decided (approved or rejected)
    pub approved_leads: i64,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Authorization role
    pub role: UserRole,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, first_name, last_name, role,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all administrators
    ///
    /// Used by the lifecycle manager for the new-lead notification fan-out.
    pub async fn list_admins(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let admins = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE role = 'admin'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(admins)
    }

    /// Lists users with their lead activity, newest accounts first
    ///
    /// Backs the admin user directory. Optionally filtered by role.
    pub async fn list_with_lead_counts(
        pool: &PgPool,
        role: Option<UserRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.role,
                   u.created_at, u.last_login_at,
                   COUNT(DISTINCT s.id) AS submitted_leads,
                   COUNT(DISTINCT d.id) AS approved_leads
            FROM users u
            LEFT JOIN leads s ON s.submitted_by_id = u.id
            LEFT JOIN leads d ON d.approved_by_id = u.id
            WHERE ($1::user_role IS NULL OR u.role = $1)
            GROUP BY u.id
            ORDER BY u.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts users matching the role filter
    pub async fn count(pool: &PgPool, role: Option<UserRole>) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::user_role IS NULL OR role = $1)")
                .bind(role)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Records a successful login
    pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this user may review and decide leads
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            password_hash: "!".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::User.as_str(), "user");
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_role_parse_round_trip() {
        assert_eq!(UserRole::parse("user"), Some(UserRole::User));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("ADMIN"), None);
        assert_eq!(UserRole::parse("superuser"), None);
    }

    #[test]
    fn test_serialized_user_hides_password_hash() {
        let json = serde_json::to_string(&sample_user(UserRole::User)).unwrap();
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_is_admin() {
        assert!(sample_user(UserRole::Admin).is_admin());
        assert!(!sample_user(UserRole::User).is_admin());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample_user(UserRole::User).full_name(), "Ana Ruiz");
    }

    #[test]
    fn test_anonymous_user_id_is_stable() {
        assert_eq!(
            ANONYMOUS_USER_ID.to_string(),
            "00000000-0000-0000-0000-000000000001"
        );
    }
}
