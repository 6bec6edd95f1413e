//! Grades module.
//!
//! One grade per enrollment; the weighted total (attendance 20%, midterm
//! 30%, final 50%) is recomputed on every write.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
