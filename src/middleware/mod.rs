//! Request middleware and extractors.
//!
//! - [`auth`]: bearer-token authentication via the [`auth::AuthUser`] extractor
//! - [`role`]: role-based route guards layered onto routers
//!
//! Flow: the client sends `Authorization: Bearer <token>`; `AuthUser`
//! verifies the JWT and exposes the claims; role guards reject callers
//! whose token lacks a required role before the handler runs.

pub mod auth;
pub mod role;
