//! Classes module.
//!
//! Owns the class resource. The capacity pair (`current_students`,
//! `is_registration_open`) is derived state maintained by the enrollment
//! service, never set directly through this module's DTOs.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
