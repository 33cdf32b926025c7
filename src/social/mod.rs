//! Social core: request lifecycles, friendship graph and cardholder search
//!
//! Every operation takes the acting user explicitly. Validation happens before
//! any store write; notifications are handed to the [`Notifier`] only after the
//! write returned successfully.

pub mod access;
pub mod catalog;
pub mod error;
pub mod friends;
pub mod models;
pub mod posts;
pub mod search;
mod templates;
pub mod users;

pub use access::{AccessManager, NewAccessRequest};
pub use catalog::CardCatalog;
pub use error::{SocialError, SocialResult};
pub use friends::FriendManager;
pub use models::*;
pub use posts::PostManager;
pub use search::CardholderSearch;
pub use users::{generate_id_code, NewUser, UserManager};

use crate::neo4j::models::UserNode;
use crate::neo4j::SocialStore;
use crate::notifications::{NotificationIntent, Notifier};
use crate::SocialConfig;
use std::sync::Arc;
use tracing::debug;

/// Hand an intent for `recipient` to the notifier, if both a notifier and a
/// device address exist.
pub(crate) fn notify_user(
    notifier: Option<&Arc<dyn Notifier>>,
    recipient: &UserNode,
    build: impl FnOnce(String) -> NotificationIntent,
) {
    let Some(notifier) = notifier else {
        return;
    };
    match recipient.notification_address.as_deref() {
        Some(address) if !address.is_empty() => notifier.notify(build(address.to_string())),
        _ => debug!(user_id = %recipient.id, "No notification address, skipping push"),
    }
}

/// All social managers over one store and one notifier
pub struct SocialService {
    store: Arc<dyn SocialStore>,
    friends: FriendManager,
    access: AccessManager,
    search: CardholderSearch,
    users: UserManager,
    posts: PostManager,
    catalog: CardCatalog,
}

impl SocialService {
    pub fn new(
        store: Arc<dyn SocialStore>,
        notifier: Arc<dyn Notifier>,
        config: SocialConfig,
    ) -> Self {
        Self {
            friends: FriendManager::with_notifier(store.clone(), notifier.clone(), config.clone()),
            access: AccessManager::with_notifier(store.clone(), notifier.clone(), config),
            search: CardholderSearch::new(store.clone()),
            users: UserManager::with_notifier(store.clone(), notifier.clone()),
            posts: PostManager::with_notifier(store.clone(), notifier),
            catalog: CardCatalog::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn SocialStore> {
        &self.store
    }

    pub fn friends(&self) -> &FriendManager {
        &self.friends
    }

    pub fn access(&self) -> &AccessManager {
        &self.access
    }

    pub fn search(&self) -> &CardholderSearch {
        &self.search
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn posts(&self) -> &PostManager {
        &self.posts
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }
}
