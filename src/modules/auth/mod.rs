//! Authentication module.
//!
//! Login issues a JWT carrying the user's role slugs; registration creates
//! the account and auto-provisions the linked student or teacher record.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
