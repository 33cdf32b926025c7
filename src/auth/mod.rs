//! Authentication boundary
//!
//! Credential verification happens upstream. This module only decodes the
//! HS256 bearer token the mobile client carries and turns its subject into
//! an [`Actor`] for the handlers.

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::Actor;
pub use middleware::require_auth;
