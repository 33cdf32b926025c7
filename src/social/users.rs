//! Identity directory read side, card ownership and account removal

use super::error::{SocialError, SocialResult};
use super::models::{FriendList, FriendSummary, IdCodeInfo, Profile, ProfileCard, UserSearchResult};
use super::templates;
use crate::neo4j::models::{CardId, UserNode, UserPurgeSummary};
use crate::neo4j::SocialStore;
use crate::notifications::{NotificationIntent, NotificationKind, Notifier};
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Length of the public search code
pub const ID_CODE_LENGTH: usize = 5;
const ID_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random public id code (`[A-Z0-9]{5}`)
pub fn generate_id_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_CODE_LENGTH)
        .map(|_| ID_CODE_ALPHABET[rng.gen_range(0..ID_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Random codes tried before giving up on a collision streak
const ID_CODE_ATTEMPTS: usize = 8;

/// Input for [`UserManager::register`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub notification_address: Option<String>,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub profile_img_url: Option<String>,
    /// Fixed id code; a free random one is generated when absent
    #[serde(default)]
    pub id_code: Option<String>,
    #[serde(default)]
    pub card_ids: Vec<CardId>,
}

/// Manager for user-facing profile operations
pub struct UserManager {
    store: Arc<dyn SocialStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl UserManager {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self {
            store,
            notifier: None,
        }
    }

    pub fn with_notifier(store: Arc<dyn SocialStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier: Some(notifier),
        }
    }

    /// Friends of `actor` in friendship order
    pub async fn list_friends(&self, actor: Uuid) -> SocialResult<FriendList> {
        let mut friends = Vec::new();
        for edge in self.store.list_friend_edges(actor).await? {
            let Some(friend) = self.store.get_user(edge.friend_id).await? else {
                warn!(friend_id = %edge.friend_id, "No friend found with id");
                continue;
            };
            let num_cards = self.store.get_user_card_ids(friend.id).await?.len();
            friends.push(FriendSummary {
                id: friend.id,
                name: friend.name,
                num_cards,
                profile_img_url: friend.profile_img_url,
            });
        }
        Ok(FriendList {
            count: friends.len(),
            friends,
        })
    }

    pub async fn id_code_info(&self, actor: Uuid) -> SocialResult<IdCodeInfo> {
        let user = self.require_user(actor).await?;
        let num_friends = self.store.count_friends(actor).await?;
        Ok(IdCodeInfo {
            id_code: user.id_code,
            num_friends,
        })
    }

    /// Look someone up by their public code (case-insensitive)
    pub async fn search_by_id_code(
        &self,
        actor: Uuid,
        id_code: &str,
    ) -> SocialResult<UserSearchResult> {
        let code = id_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(SocialError::invalid("id code is required"));
        }
        let me = self.require_user(actor).await?;
        if me.id_code.eq_ignore_ascii_case(&code) {
            return Err(SocialError::invalid("cannot search for your own id code"));
        }

        Ok(self
            .store
            .get_user_by_id_code(&code)
            .await?
            .map(|user| UserSearchResult::from(&user))
            .unwrap_or_default())
    }

    /// Profile of `actor` or of one of their friends
    pub async fn profile(&self, actor: Uuid, target: Option<Uuid>) -> SocialResult<Profile> {
        let target = target.unwrap_or(actor);
        if target != actor && self.store.get_friend_edge(actor, target).await?.is_none() {
            return Err(SocialError::invalid(format!(
                "profile {} is not accessible",
                target
            )));
        }

        let user = self
            .store
            .get_user(target)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown user {}", target)))?;

        let mut cards = Vec::new();
        for card_id in self.store.get_user_card_ids(user.id).await? {
            let name = self.store.get_card(card_id).await?.map(|c| c.name);
            cards.push(ProfileCard { id: card_id, name });
        }

        Ok(Profile {
            id: user.id,
            name: user.name,
            phone_number: user.phone_number,
            cards,
            upi_id: user.upi_id,
            profile_img_url: user.profile_img_url,
        })
    }

    /// Add a user to the directory with a unique id code
    pub async fn register(&self, new: NewUser) -> SocialResult<UserNode> {
        let name = new.name.trim();
        let phone_number = new.phone_number.trim();
        if name.is_empty() || phone_number.is_empty() {
            return Err(SocialError::invalid("name and phone number are required"));
        }

        let id_code = match new.id_code {
            Some(code) => {
                let code = code.trim().to_uppercase();
                let well_formed = code.len() == ID_CODE_LENGTH
                    && code.chars().all(|c| c.is_ascii_alphanumeric());
                if !well_formed {
                    return Err(SocialError::invalid(format!("malformed id code {:?}", code)));
                }
                if self.store.get_user_by_id_code(&code).await?.is_some() {
                    return Err(SocialError::Conflict(format!("id code {} is taken", code)));
                }
                code
            }
            None => self.unused_id_code().await?,
        };

        let mut user = UserNode::new(name, phone_number, &id_code);
        user.notification_address = new.notification_address;
        user.upi_id = new.upi_id;
        user.profile_img_url = new.profile_img_url;
        self.store.create_user(&user).await?;
        info!(user_id = %user.id, id_code = %user.id_code, "User registered");

        if !new.card_ids.is_empty() {
            self.update_cards(user.id, &new.card_ids).await?;
        }
        Ok(user)
    }

    async fn unused_id_code(&self) -> SocialResult<String> {
        for _ in 0..ID_CODE_ATTEMPTS {
            let code = generate_id_code();
            if self.store.get_user_by_id_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(SocialError::Conflict("could not find a free id code".to_string()))
    }

    pub async fn update_upi(&self, actor: Uuid, upi_id: &str) -> SocialResult<()> {
        let upi_id = upi_id.trim();
        if upi_id.is_empty() {
            return Err(SocialError::invalid("upi id is required"));
        }
        self.require_user(actor).await?;
        self.store.update_user_upi(actor, upi_id).await?;
        info!(actor = %actor, "UPI id updated");
        Ok(())
    }

    /// Replace the set of cards `actor` owns.
    ///
    /// Duplicates collapse and ids missing from the catalog are dropped; the
    /// stored set is returned.
    pub async fn update_cards(&self, actor: Uuid, card_ids: &[CardId]) -> SocialResult<Vec<CardId>> {
        self.require_user(actor).await?;

        let mut wanted: Vec<CardId> = Vec::with_capacity(card_ids.len());
        for id in card_ids {
            if wanted.contains(id) {
                continue;
            }
            if self.store.get_card(*id).await?.is_some() {
                wanted.push(*id);
            } else {
                warn!(card_id = *id, "Ignoring unknown card id");
            }
        }

        self.store.replace_user_cards(actor, &wanted).await?;
        info!(actor = %actor, count = wanted.len(), "Cards updated");
        self.store.get_user_card_ids(actor).await.map_err(Into::into)
    }

    /// Remove the account and everything that references it
    pub async fn delete_user(&self, actor: Uuid) -> SocialResult<UserPurgeSummary> {
        let summary = self
            .store
            .delete_user_cascade(actor)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("user {}", actor)))?;
        info!(actor = %actor, ?summary, "User deleted");
        Ok(summary)
    }

    /// Forward a chat wake-up push; the message itself travels elsewhere
    pub async fn send_chat_notification(
        &self,
        actor: Uuid,
        to_address: &str,
        data: BTreeMap<String, String>,
    ) -> SocialResult<()> {
        if to_address.trim().is_empty() {
            return Err(SocialError::invalid("recipient address is required"));
        }
        let me = self.require_user(actor).await?;

        // The recipient sees the sender as their chat partner
        let mut intent = NotificationIntent::new(
            to_address,
            NotificationKind::Chat,
            templates::chat_title(&me.name),
            templates::CHAT_BODY,
        );
        intent.extra = data;
        intent.extra.insert("partnerName".to_string(), me.name);

        if let Some(notifier) = &self.notifier {
            notifier.notify(intent);
        }
        Ok(())
    }

    async fn require_user(&self, id: Uuid) -> SocialResult<UserNode> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("user {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::mock::MockSocialStore;
    use crate::neo4j::models::{AccessRequestNode, FriendRequestNode, PostNode};
    use crate::test_helpers::{test_card, test_user, RecordingNotifier};
    use chrono::Utc;

    async fn seeded() -> (Arc<MockSocialStore>, UserNode, UserNode, UserNode) {
        let a = test_user("Asha");
        let b = test_user("Bilal");
        let c = test_user("Chen");
        let store = MockSocialStore::new()
            .with_user(a.clone())
            .await
            .with_user(b.clone())
            .await
            .with_user(c.clone())
            .await
            .with_card(test_card(1, "Gold"))
            .await
            .with_card(test_card(2, "Platinum"))
            .await
            .with_owned_card(b.id, 1)
            .await
            .with_friendship(a.id, b.id)
            .await;
        (Arc::new(store), a, b, c)
    }

    #[test]
    fn test_generate_id_code_shape() {
        for _ in 0..50 {
            let code = generate_id_code();
            assert_eq!(code.len(), ID_CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_list_friends_with_card_counts() {
        let (store, a, b, _) = seeded().await;
        let users = UserManager::new(store);

        let list = users.list_friends(a.id).await.unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.friends[0].id, b.id);
        assert_eq!(list.friends[0].num_cards, 1);

        let info = users.id_code_info(a.id).await.unwrap();
        assert_eq!(info.num_friends, 1);
        assert_eq!(info.id_code, a.id_code);
    }

    #[tokio::test]
    async fn test_search_by_id_code_is_case_insensitive() {
        let (store, a, b, _) = seeded().await;
        let users = UserManager::new(store);

        let found = users
            .search_by_id_code(a.id, &b.id_code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.id, Some(b.id));

        let missing = users.search_by_id_code(a.id, "ZZZZZ").await.unwrap();
        assert_eq!(missing.count, 0);

        assert!(matches!(
            users
                .search_by_id_code(a.id, &a.id_code.to_lowercase())
                .await,
            Err(SocialError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_visible_to_self_and_friends_only() {
        let (store, a, b, c) = seeded().await;
        let users = UserManager::new(store);

        let own = users.profile(a.id, None).await.unwrap();
        assert_eq!(own.name, "Asha");

        let friend = users.profile(a.id, Some(b.id)).await.unwrap();
        assert_eq!(
            friend.cards,
            vec![ProfileCard {
                id: 1,
                name: Some("Gold".into())
            }]
        );

        assert!(matches!(
            users.profile(a.id, Some(c.id)).await,
            Err(SocialError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_update_cards_dedupes_and_drops_unknown() {
        let (store, a, _, _) = seeded().await;
        let users = UserManager::new(store.clone());

        let stored = users.update_cards(a.id, &[2, 1, 2, 99]).await.unwrap();
        assert_eq!(stored, vec![1, 2]);

        let stored = users.update_cards(a.id, &[2]).await.unwrap();
        assert_eq!(stored, vec![2]);
        let links = store.tables.read().await.card_links.clone();
        assert_eq!(links.iter().filter(|(u, _)| *u == a.id).count(), 1);
    }

    #[tokio::test]
    async fn test_register_assigns_id_code_and_cards() {
        let (store, _, b, _) = seeded().await;
        let users = UserManager::new(store.clone());

        let user = users
            .register(NewUser {
                name: " Divya ".into(),
                phone_number: "+919000099999".into(),
                notification_address: Some("token-divya".into()),
                upi_id: None,
                profile_img_url: None,
                id_code: None,
                card_ids: vec![2, 2, 42],
            })
            .await
            .unwrap();

        assert_eq!(user.name, "Divya");
        assert_eq!(user.id_code.len(), ID_CODE_LENGTH);
        let found = store.get_user_by_id_code(&user.id_code).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(store.get_user_card_ids(user.id).await.unwrap(), vec![2]);

        // A taken code is refused before anything is written
        let err = users
            .register(NewUser {
                name: "Copy".into(),
                phone_number: "+919000099998".into(),
                notification_address: None,
                upi_id: None,
                profile_img_url: None,
                id_code: Some(b.id_code.to_lowercase()),
                card_ids: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields_and_bad_codes() {
        let (store, _, _, _) = seeded().await;
        let users = UserManager::new(store.clone());
        let base = NewUser {
            name: "Esha".into(),
            phone_number: "+919000099997".into(),
            notification_address: None,
            upi_id: None,
            profile_img_url: None,
            id_code: None,
            card_ids: vec![],
        };

        let blank = NewUser {
            name: "  ".into(),
            ..base.clone()
        };
        assert!(matches!(
            users.register(blank).await,
            Err(SocialError::InvalidArgument(_))
        ));

        let bad_code = NewUser {
            id_code: Some("AB-12".into()),
            ..base
        };
        assert!(matches!(
            users.register(bad_code).await,
            Err(SocialError::InvalidArgument(_))
        ));
        assert_eq!(store.tables.read().await.users.len(), 3);
    }

    #[tokio::test]
    async fn test_update_upi() {
        let (store, a, _, _) = seeded().await;
        let users = UserManager::new(store.clone());
        users.update_upi(a.id, "asha@upi").await.unwrap();
        let user = store.get_user(a.id).await.unwrap().unwrap();
        assert_eq!(user.upi_id.as_deref(), Some("asha@upi"));
        assert!(matches!(
            users.update_upi(a.id, "  ").await,
            Err(SocialError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_in_order() {
        let (store, a, b, c) = seeded().await;
        let now = Utc::now();
        store
            .create_friend_request(&FriendRequestNode::new(c.id, a.id, now))
            .await
            .unwrap();
        store
            .create_access_request(&AccessRequestNode::new(a.id, b.id, 1, 500, None, now))
            .await
            .unwrap();
        store
            .create_post(&PostNode::new(a.id, "hello", now))
            .await
            .unwrap();
        store.replace_user_cards(a.id, &[1, 2]).await.unwrap();

        let users = UserManager::new(store.clone());
        let summary = users.delete_user(a.id).await.unwrap();
        assert_eq!(
            summary,
            UserPurgeSummary {
                friend_edges: 2,
                friend_requests: 2,
                access_requests: 1,
                posts: 1,
                card_links: 2,
            }
        );

        assert!(store.get_user(a.id).await.unwrap().is_none());
        assert_eq!(store.edge_count().await, 0);
        assert!(store.get_friend_edge(b.id, a.id).await.unwrap().is_none());
        // Other users' data survives
        assert_eq!(store.get_user_card_ids(b.id).await.unwrap(), vec![1]);

        assert!(matches!(
            users.delete_user(a.id).await,
            Err(SocialError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_purge_leaves_everything() {
        let (store, a, _, _) = seeded().await;
        store.fail_writes(true);
        let users = UserManager::new(store.clone());

        assert!(matches!(
            users.delete_user(a.id).await,
            Err(SocialError::Store(_))
        ));
        assert!(store.get_user(a.id).await.unwrap().is_some());
        assert_eq!(store.edge_count().await, 2);
    }

    #[tokio::test]
    async fn test_chat_notification_adds_partner_name() {
        let (store, a, _, _) = seeded().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let users = UserManager::with_notifier(store, notifier.clone());

        let mut data = BTreeMap::new();
        data.insert("channel".to_string(), "c-1".to_string());
        users
            .send_chat_notification(a.id, "device-xyz", data)
            .await
            .unwrap();

        let sent = notifier.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].address, "device-xyz");
        assert_eq!(sent[0].title, "New message from Asha");
        assert_eq!(sent[0].data()["partnerName"], "Asha");
        assert_eq!(sent[0].data()["channel"], "c-1");

        assert!(matches!(
            users
                .send_chat_notification(a.id, "", BTreeMap::new())
                .await,
            Err(SocialError::InvalidArgument(_))
        ));
    }
}
