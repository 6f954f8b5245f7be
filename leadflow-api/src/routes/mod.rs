/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `leads`: Lead submission, listing, and approval workflow
/// - `notifications`: Per-user notification feed
/// - `users`: Own profile and the admin user directory

pub mod auth;
pub mod health;
pub mod leads;
pub mod notifications;
pub mod users;
