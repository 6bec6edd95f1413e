//! User administration module.
//!
//! Role-gated CRUD plus self-service profile, password change, and the
//! admin activation toggles.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
