//! HTTP API for the social core

pub mod access_handlers;
pub mod card_handlers;
pub mod friend_handlers;
pub mod handlers;
pub mod post_handlers;
pub mod query;
pub mod routes;
pub mod user_handlers;

pub use routes::create_router;
