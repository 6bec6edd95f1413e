//! Enrollments module.
//!
//! The state-sensitive part of the system: enrollment mutations carry the
//! class capacity bookkeeping with them, one transaction per mutation.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
