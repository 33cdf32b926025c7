//! Neo4j client and models for the social graph

pub mod client;
mod impl_social_store;
pub mod models;
pub mod traits;

pub use client::Neo4jClient;
pub use models::*;
pub use traits::SocialStore;

#[cfg(test)]
pub(crate) mod mock;
