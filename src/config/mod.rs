//! Environment-driven configuration.
//!
//! Each submodule covers one concern and exposes a `from_env()` constructor
//! (or an async pool initializer for the database). Values are read once at
//! startup and carried in [`crate::state::AppState`].
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `JWT_SECRET`, `JWT_ACCESS_EXPIRY`: token signing settings
//! - `CORS_ALLOWED_ORIGINS`: comma-separated origin list

pub mod cors;
pub mod database;
pub mod jwt;
