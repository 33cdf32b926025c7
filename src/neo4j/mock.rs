//! In-memory mock implementation of SocialStore for testing.
//!
//! All tables sit behind a single `tokio::sync::RwLock`, so each trait call
//! observes and mutates a consistent snapshot, like one store transaction.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::neo4j::models::*;
use crate::neo4j::traits::SocialStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MockTables {
    pub users: HashMap<Uuid, UserNode>,
    pub cards: BTreeMap<CardId, CardNode>,
    /// Join relation (user_id, card_id)
    pub card_links: BTreeSet<(Uuid, CardId)>,
    /// Directed edges keyed by (owner, friend)
    pub friend_edges: HashMap<(Uuid, Uuid), FriendEdge>,
    pub friend_requests: HashMap<Uuid, FriendRequestNode>,
    pub access_requests: HashMap<Uuid, AccessRequestNode>,
    pub posts: HashMap<Uuid, PostNode>,
}

/// In-memory mock implementation of SocialStore for testing.
pub struct MockSocialStore {
    pub tables: RwLock<MockTables>,
    /// When set, every write fails as if the commit was rejected
    fail_writes: AtomicBool,
    /// Latency added to request reads, in milliseconds
    read_delay_ms: AtomicU64,
}

impl Default for MockSocialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSocialStore {
    /// Create a new empty MockSocialStore.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(MockTables::default()),
            fail_writes: AtomicBool::new(false),
            read_delay_ms: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Builder / seeding methods for tests
    // ========================================================================

    /// Seed a user into the store.
    pub async fn with_user(self, user: UserNode) -> Self {
        self.tables.write().await.users.insert(user.id, user);
        self
    }

    /// Seed a catalog card.
    pub async fn with_card(self, card: CardNode) -> Self {
        self.tables.write().await.cards.insert(card.id, card);
        self
    }

    /// Seed card ownership.
    pub async fn with_owned_card(self, user_id: Uuid, card_id: CardId) -> Self {
        self.tables
            .write()
            .await
            .card_links
            .insert((user_id, card_id));
        self
    }

    /// Seed an accepted friendship (request + both edges).
    pub async fn with_friendship(self, a: Uuid, b: Uuid) -> Self {
        let now = Utc::now();
        let mut request = FriendRequestNode::new(a, b, now);
        request.status = FriendRequestStatus::Accepted;
        request.resolved_on = Some(now);
        {
            let mut tables = self.tables.write().await;
            insert_edge_pair(&mut tables, &request, now);
            tables.friend_requests.insert(request.id, request);
        }
        self
    }

    /// Make every subsequent write fail (simulates a rejected commit).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("mock store: commit rejected");
        }
        Ok(())
    }

    /// Delay every request lookup and friend count, so concurrent callers
    /// interleave between their read and their write.
    pub fn delay_reads(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let ms = self.read_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Number of stored directed edges (test assertions)
    pub async fn edge_count(&self) -> usize {
        self.tables.read().await.friend_edges.len()
    }
}

fn insert_edge_pair(tables: &mut MockTables, request: &FriendRequestNode, when: DateTime<Utc>) {
    let (a, b) = (request.from_user_id, request.to_user_id);
    for (owner, friend) in [(a, b), (b, a)] {
        tables
            .friend_edges
            .entry((owner, friend))
            .or_insert_with(|| FriendEdge {
                owner_id: owner,
                friend_id: friend,
                request_id: request.id,
                started_on: when,
            });
    }
}

fn newest_first<T, F: Fn(&T) -> DateTime<Utc>>(mut items: Vec<T>, key: F) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items
}

#[async_trait]
impl SocialStore for MockSocialStore {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn create_user(&self, user: &UserNode) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id_code.eq_ignore_ascii_case(&user.id_code))
        {
            anyhow::bail!("id code {} already taken", user.id_code);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<UserNode>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_id_code(&self, id_code: &str) -> Result<Option<UserNode>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.id_code.eq_ignore_ascii_case(id_code))
            .cloned())
    }

    async fn update_user_upi(&self, id: Uuid, upi_id: &str) -> Result<()> {
        self.check_writable()?;
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.upi_id = Some(upi_id.to_string());
        }
        Ok(())
    }

    async fn get_user_card_ids(&self, user_id: Uuid) -> Result<Vec<CardId>> {
        Ok(self
            .tables
            .read()
            .await
            .card_links
            .range((user_id, CardId::MIN)..=(user_id, CardId::MAX))
            .map(|(_, card_id)| *card_id)
            .collect())
    }

    async fn replace_user_cards(&self, user_id: Uuid, card_ids: &[CardId]) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        tables.card_links.retain(|(owner, _)| *owner != user_id);
        for card_id in card_ids {
            if tables.cards.contains_key(card_id) {
                tables.card_links.insert((user_id, *card_id));
            }
        }
        Ok(())
    }

    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<Option<UserPurgeSummary>> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        let mut summary = UserPurgeSummary::default();

        let before = tables.friend_edges.len();
        tables
            .friend_edges
            .retain(|(owner, friend), _| *owner != user_id && *friend != user_id);
        summary.friend_edges = before - tables.friend_edges.len();

        let before = tables.friend_requests.len();
        tables.friend_requests.retain(|_, r| !r.involves(user_id));
        summary.friend_requests = before - tables.friend_requests.len();

        let before = tables.access_requests.len();
        tables.access_requests.retain(|_, r| !r.involves(user_id));
        summary.access_requests = before - tables.access_requests.len();

        let before = tables.posts.len();
        tables.posts.retain(|_, p| p.creator_id != user_id);
        summary.posts = before - tables.posts.len();

        let before = tables.card_links.len();
        tables.card_links.retain(|(owner, _)| *owner != user_id);
        summary.card_links = before - tables.card_links.len();

        tables.users.remove(&user_id);
        Ok(Some(summary))
    }

    async fn create_card(&self, card: &CardNode) -> Result<()> {
        self.check_writable()?;
        self.tables.write().await.cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn get_card(&self, id: CardId) -> Result<Option<CardNode>> {
        Ok(self.tables.read().await.cards.get(&id).cloned())
    }

    async fn list_cards(&self) -> Result<Vec<CardNode>> {
        Ok(self.tables.read().await.cards.values().cloned().collect())
    }

    async fn list_cards_by_type(&self, object_type: CardObjectType) -> Result<Vec<CardNode>> {
        Ok(self
            .tables
            .read()
            .await
            .cards
            .values()
            .filter(|c| c.object_type == object_type)
            .cloned()
            .collect())
    }

    async fn list_card_ids_by_tag(&self, tag_id: CardId) -> Result<Vec<CardId>> {
        Ok(self
            .tables
            .read()
            .await
            .cards
            .values()
            .filter(|c| c.tag_id == Some(tag_id))
            .map(|c| c.id)
            .collect())
    }

    async fn list_friend_edges(&self, user_id: Uuid) -> Result<Vec<FriendEdge>> {
        let tables = self.tables.read().await;
        let mut edges: Vec<FriendEdge> = tables
            .friend_edges
            .values()
            .filter(|e| e.owner_id == user_id)
            .cloned()
            .collect();
        edges.sort_by_key(|e| (e.started_on, e.friend_id));
        Ok(edges)
    }

    async fn get_friend_edge(&self, owner_id: Uuid, friend_id: Uuid) -> Result<Option<FriendEdge>> {
        Ok(self
            .tables
            .read()
            .await
            .friend_edges
            .get(&(owner_id, friend_id))
            .cloned())
    }

    async fn count_friends(&self, user_id: Uuid) -> Result<usize> {
        self.simulate_latency().await;
        Ok(self
            .tables
            .read()
            .await
            .friend_edges
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .count())
    }

    async fn remove_friend_pair(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<RemovedFriendship>> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let Some(edge) = tables.friend_edges.remove(&(owner_id, friend_id)) else {
            return Ok(None);
        };
        tables.friend_edges.remove(&(friend_id, owner_id));
        let request_deleted = tables.friend_requests.remove(&edge.request_id).is_some();
        Ok(Some(RemovedFriendship {
            edge,
            request_deleted,
        }))
    }

    async fn create_friend_request(&self, request: &FriendRequestNode) -> Result<bool> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let key = request.pair_key();
        if tables.friend_requests.values().any(|r| r.pair_key() == key) {
            return Ok(false);
        }
        tables.friend_requests.insert(request.id, request.clone());
        Ok(true)
    }

    async fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequestNode>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.friend_requests.get(&id).cloned())
    }

    async fn delete_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
    ) -> Result<StatusWrite> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        match tables.friend_requests.get(&id) {
            Some(request) if request.status == expected => {
                tables.friend_requests.remove(&id);
                Ok(StatusWrite::Applied)
            }
            _ => Ok(StatusWrite::Stale),
        }
    }

    async fn list_friend_requests_sent(&self, user_id: Uuid) -> Result<Vec<FriendRequestNode>> {
        let requests = self
            .tables
            .read()
            .await
            .friend_requests
            .values()
            .filter(|r| r.from_user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |r: &FriendRequestNode| r.created_on))
    }

    async fn list_friend_requests_received(
        &self,
        user_id: Uuid,
        status: Option<FriendRequestStatus>,
    ) -> Result<Vec<FriendRequestNode>> {
        let requests = self
            .tables
            .read()
            .await
            .friend_requests
            .values()
            .filter(|r| r.to_user_id == user_id)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(requests, |r: &FriendRequestNode| r.created_on))
    }

    async fn accept_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        limit: Option<u32>,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let Some(mut request) = tables.friend_requests.get(&id).cloned() else {
            anyhow::bail!("friend request {} not found", id);
        };
        if request.status != expected {
            return Ok(StatusWrite::Stale);
        }
        if let Some(limit) = limit {
            let current = tables
                .friend_edges
                .keys()
                .filter(|(owner, _)| *owner == request.to_user_id)
                .count();
            if current >= limit as usize {
                return Ok(StatusWrite::LimitReached { current });
            }
        }
        request.status = FriendRequestStatus::Accepted;
        request.resolved_on = Some(resolved_on);
        insert_edge_pair(&mut tables, &request, resolved_on);
        tables.friend_requests.insert(id, request);
        Ok(StatusWrite::Applied)
    }

    async fn decline_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let Some(request) = tables.friend_requests.get_mut(&id) else {
            anyhow::bail!("friend request {} not found", id);
        };
        if request.status != expected {
            return Ok(StatusWrite::Stale);
        }
        request.status = FriendRequestStatus::Declined;
        request.resolved_on = Some(resolved_on);
        tables.friend_edges.retain(|_, e| e.request_id != id);
        Ok(StatusWrite::Applied)
    }

    async fn create_access_request(&self, request: &AccessRequestNode) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .access_requests
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequestNode>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.access_requests.get(&id).cloned())
    }

    async fn update_access_request_status(
        &self,
        id: Uuid,
        expected: AccessRequestStatus,
        status: AccessRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let Some(request) = tables.access_requests.get_mut(&id) else {
            anyhow::bail!("access request {} not found", id);
        };
        if request.status != expected {
            return Ok(StatusWrite::Stale);
        }
        request.status = status;
        request.resolved_on = Some(resolved_on);
        Ok(StatusWrite::Applied)
    }

    async fn list_access_requests_sent(&self, user_id: Uuid) -> Result<Vec<AccessRequestNode>> {
        let requests = self
            .tables
            .read()
            .await
            .access_requests
            .values()
            .filter(|r| r.from_user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |r: &AccessRequestNode| r.created_on))
    }

    async fn list_access_requests_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AccessRequestNode>> {
        let requests = self
            .tables
            .read()
            .await
            .access_requests
            .values()
            .filter(|r| r.to_user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |r: &AccessRequestNode| r.created_on))
    }

    async fn create_post(&self, post: &PostNode) -> Result<()> {
        self.check_writable()?;
        self.tables.write().await.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<PostNode>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn list_posts_by_creator(&self, creator_id: Uuid) -> Result<Vec<PostNode>> {
        let posts = self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect();
        Ok(newest_first(posts, |p: &PostNode| p.created_on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_card, test_user};

    #[tokio::test]
    async fn test_with_friendship_writes_symmetric_pair() {
        let a = test_user("A");
        let b = test_user("B");
        let store = MockSocialStore::new()
            .with_user(a.clone())
            .await
            .with_user(b.clone())
            .await
            .with_friendship(a.id, b.id)
            .await;

        let ab = store.get_friend_edge(a.id, b.id).await.unwrap().unwrap();
        let ba = store.get_friend_edge(b.id, a.id).await.unwrap().unwrap();
        assert_eq!(ab.request_id, ba.request_id);
        assert_eq!(store.edge_count().await, 2);
    }

    #[tokio::test]
    async fn test_pair_conflict_in_either_direction() {
        let store = MockSocialStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(store
            .create_friend_request(&FriendRequestNode::new(a, b, Utc::now()))
            .await
            .unwrap());
        assert!(!store
            .create_friend_request(&FriendRequestNode::new(b, a, Utc::now()))
            .await
            .unwrap());
        assert_eq!(store.tables.read().await.friend_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_user_cards_dedupes_and_skips_unknown() {
        let user = test_user("A");
        let store = MockSocialStore::new()
            .with_card(test_card(1, "Gold"))
            .await
            .with_card(test_card(2, "Silver"))
            .await;

        store
            .replace_user_cards(user.id, &[2, 1, 2, 99])
            .await
            .unwrap();
        assert_eq!(store.get_user_card_ids(user.id).await.unwrap(), vec![1, 2]);

        store.replace_user_cards(user.id, &[1]).await.unwrap();
        assert_eq!(store.get_user_card_ids(user.id).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_fail_writes_rejects_mutation() {
        let store = MockSocialStore::new();
        store.fail_writes(true);
        let result = store
            .create_friend_request(&FriendRequestNode::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Utc::now(),
            ))
            .await;
        assert!(result.is_err());
        assert!(store.tables.read().await.friend_requests.is_empty());
    }

    #[tokio::test]
    async fn test_status_writes_require_expected_status() {
        let (a, b) = (test_user("A"), test_user("B"));
        let store = MockSocialStore::new()
            .with_user(a.clone())
            .await
            .with_user(b.clone())
            .await;
        let request = FriendRequestNode::new(a.id, b.id, Utc::now());
        store.create_friend_request(&request).await.unwrap();

        let first = store
            .accept_friend_request(request.id, FriendRequestStatus::Active, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(first, StatusWrite::Applied);

        // A second writer that also read Active loses
        let second = store
            .decline_friend_request(request.id, FriendRequestStatus::Active, Utc::now())
            .await
            .unwrap();
        assert_eq!(second, StatusWrite::Stale);
        assert_eq!(store.edge_count().await, 2);
    }

    #[tokio::test]
    async fn test_accept_checks_limit_under_the_write_lock() {
        let (a, b, c) = (test_user("A"), test_user("B"), test_user("C"));
        let store = MockSocialStore::new()
            .with_user(a.clone())
            .await
            .with_user(b.clone())
            .await
            .with_user(c.clone())
            .await
            .with_friendship(c.id, b.id)
            .await;
        let request = FriendRequestNode::new(a.id, b.id, Utc::now());
        store.create_friend_request(&request).await.unwrap();

        let outcome = store
            .accept_friend_request(request.id, FriendRequestStatus::Active, Some(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, StatusWrite::LimitReached { current: 1 });
        assert_eq!(
            store.get_friend_request(request.id).await.unwrap().unwrap().status,
            FriendRequestStatus::Active
        );
    }
}
