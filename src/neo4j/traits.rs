//! SocialStore trait definition
//!
//! Defines the abstract interface for every persistence operation the
//! social core performs. `Neo4jClient` implements it against the graph
//! database; tests use the in-memory `MockSocialStore`.
//!
//! Every method is one atomic unit: implementations must never expose a
//! half-written friendship pair or a status change without its edges.

use crate::neo4j::models::*;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Abstract interface for all social graph storage operations.
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Check connectivity to the backing store
    async fn health_check(&self) -> Result<bool>;

    // ========================================================================
    // Identity Directory
    // ========================================================================

    /// Insert a user (signup itself lives outside the core; used for seeding)
    async fn create_user(&self, user: &UserNode) -> Result<()>;

    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<UserNode>>;

    /// Get a user by public id code (case-insensitive)
    async fn get_user_by_id_code(&self, id_code: &str) -> Result<Option<UserNode>>;

    /// Set the UPI payment handle of a user
    async fn update_user_upi(&self, id: Uuid, upi_id: &str) -> Result<()>;

    /// Card ids owned by a user, in catalog id order
    async fn get_user_card_ids(&self, user_id: Uuid) -> Result<Vec<CardId>>;

    /// Replace the full ownership set of a user in one step.
    ///
    /// Unknown card ids are skipped; duplicates collapse to one link.
    async fn replace_user_cards(&self, user_id: Uuid, card_ids: &[CardId]) -> Result<()>;

    /// Delete a user and every dependent row in a fixed order:
    /// friend edges, friend requests, access requests, posts, card links, user.
    ///
    /// Returns `None` if the user does not exist.
    async fn delete_user_cascade(&self, user_id: Uuid) -> Result<Option<UserPurgeSummary>>;

    // ========================================================================
    // Card Catalog
    // ========================================================================

    /// Insert a catalog card (catalog management lives upstream; used for seeding)
    async fn create_card(&self, card: &CardNode) -> Result<()>;

    /// Get a card by ID
    async fn get_card(&self, id: CardId) -> Result<Option<CardNode>>;

    /// List all cards ordered by id
    async fn list_cards(&self) -> Result<Vec<CardNode>>;

    /// List cards of one object type ordered by id
    async fn list_cards_by_type(&self, object_type: CardObjectType) -> Result<Vec<CardNode>>;

    /// Ids of every card grouped under a tag card, ordered by id
    async fn list_card_ids_by_tag(&self, tag_id: CardId) -> Result<Vec<CardId>>;

    // ========================================================================
    // Relationship graph
    // ========================================================================

    /// Outgoing friend edges of a user, oldest friendship first
    async fn list_friend_edges(&self, user_id: Uuid) -> Result<Vec<FriendEdge>>;

    /// The edge owner -> friend, if present
    async fn get_friend_edge(&self, owner_id: Uuid, friend_id: Uuid) -> Result<Option<FriendEdge>>;

    /// Number of distinct friends of a user
    async fn count_friends(&self, user_id: Uuid) -> Result<usize>;

    /// Delete both directions of a friendship and its originating request.
    ///
    /// Returns `None` when no edge owner -> friend exists (nothing is touched).
    /// A missing originating request does not prevent the edge removal.
    async fn remove_friend_pair(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<RemovedFriendship>>;

    // ========================================================================
    // Friend requests
    // ========================================================================

    /// Insert a friend request unless one already exists for the unordered pair.
    ///
    /// Returns `false` (and writes nothing) on a pair conflict. The check and
    /// the insert are a single atomic step.
    async fn create_friend_request(&self, request: &FriendRequestNode) -> Result<bool>;

    /// Get a friend request by ID
    async fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequestNode>>;

    /// Delete a friend request record if its status is still `expected`.
    ///
    /// Returns `Stale` when the status moved on or the record is gone.
    async fn delete_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
    ) -> Result<StatusWrite>;

    /// Requests sent by a user, newest first
    async fn list_friend_requests_sent(&self, user_id: Uuid) -> Result<Vec<FriendRequestNode>>;

    /// Requests received by a user, newest first, optionally filtered by status
    async fn list_friend_requests_received(
        &self,
        user_id: Uuid,
        status: Option<FriendRequestStatus>,
    ) -> Result<Vec<FriendRequestNode>>;

    /// Mark a request Accepted and create the symmetric edge pair, atomically.
    ///
    /// Writes only if the stored status is still `expected` and, when `limit`
    /// is set, the recipient has fewer than `limit` friends. Edges are keyed
    /// on the pair, so re-running never duplicates them.
    async fn accept_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        limit: Option<u32>,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite>;

    /// Mark a request Declined and drop any edge pair it created, atomically.
    ///
    /// Writes only if the stored status is still `expected`.
    async fn decline_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite>;

    // ========================================================================
    // Access requests
    // ========================================================================

    /// Insert an access request (no uniqueness constraint)
    async fn create_access_request(&self, request: &AccessRequestNode) -> Result<()>;

    /// Get an access request by ID
    async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequestNode>>;

    /// Move an access request from `expected` to `status` and stamp the
    /// resolution time. Returns `Stale` if the stored status differs.
    async fn update_access_request_status(
        &self,
        id: Uuid,
        expected: AccessRequestStatus,
        status: AccessRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite>;

    /// Access requests sent by a user, newest first
    async fn list_access_requests_sent(&self, user_id: Uuid) -> Result<Vec<AccessRequestNode>>;

    /// Access requests received by a user, newest first
    async fn list_access_requests_received(&self, user_id: Uuid)
        -> Result<Vec<AccessRequestNode>>;

    // ========================================================================
    // Posts
    // ========================================================================

    /// Insert a post
    async fn create_post(&self, post: &PostNode) -> Result<()>;

    /// Get a post by ID
    async fn get_post(&self, id: Uuid) -> Result<Option<PostNode>>;

    /// Posts of one creator, newest first
    async fn list_posts_by_creator(&self, creator_id: Uuid) -> Result<Vec<PostNode>>;
}
