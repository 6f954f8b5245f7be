/// Database models for LeadFlow
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and the admin directory
/// - `lead`: Submitted leads and the approval state machine
/// - `notification`: Durable in-app notifications
///
/// # Example
///
/// ```no_run
/// use leadflow_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let admins = User::list_admins(&pool).await?;
/// println!("{} admins will be notified", admins.len());
/// # Ok(())
/// # }
/// ```

pub mod lead;
pub mod notification;
pub mod user;
