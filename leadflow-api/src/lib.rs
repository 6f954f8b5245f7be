//! # LeadFlow API Server Library
//!
//! This library provides the core functionality for the LeadFlow API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `crm`: External CRM connector (mirroring approved leads)
//! - `error`: Error handling and HTTP response mapping
//! - `lifecycle`: Lead lifecycle orchestration (submit, approve, reject)
//! - `publish`: Real-time event publishing
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod crm;
pub mod error;
pub mod lifecycle;
pub mod publish;
pub mod routes;
