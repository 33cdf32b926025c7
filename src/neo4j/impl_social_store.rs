//! `SocialStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::SocialStore;

#[async_trait]
impl SocialStore for Neo4jClient {
    async fn health_check(&self) -> anyhow::Result<bool> {
        self.health_check().await
    }

    // ========================================================================
    // Identity Directory
    // ========================================================================

    async fn create_user(&self, user: &UserNode) -> anyhow::Result<()> {
        self.create_user(user).await
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<UserNode>> {
        self.get_user(id).await
    }

    async fn get_user_by_id_code(&self, id_code: &str) -> anyhow::Result<Option<UserNode>> {
        self.get_user_by_id_code(id_code).await
    }

    async fn update_user_upi(&self, id: Uuid, upi_id: &str) -> anyhow::Result<()> {
        self.update_user_upi(id, upi_id).await
    }

    async fn get_user_card_ids(&self, user_id: Uuid) -> anyhow::Result<Vec<CardId>> {
        self.get_user_card_ids(user_id).await
    }

    async fn replace_user_cards(&self, user_id: Uuid, card_ids: &[CardId]) -> anyhow::Result<()> {
        self.replace_user_cards(user_id, card_ids).await
    }

    async fn delete_user_cascade(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<UserPurgeSummary>> {
        self.delete_user_cascade(user_id).await
    }

    // ========================================================================
    // Card Catalog
    // ========================================================================

    async fn create_card(&self, card: &CardNode) -> anyhow::Result<()> {
        self.create_card(card).await
    }

    async fn get_card(&self, id: CardId) -> anyhow::Result<Option<CardNode>> {
        self.get_card(id).await
    }

    async fn list_cards(&self) -> anyhow::Result<Vec<CardNode>> {
        self.list_cards().await
    }

    async fn list_cards_by_type(
        &self,
        object_type: CardObjectType,
    ) -> anyhow::Result<Vec<CardNode>> {
        self.list_cards_by_type(object_type).await
    }

    async fn list_card_ids_by_tag(&self, tag_id: CardId) -> anyhow::Result<Vec<CardId>> {
        self.list_card_ids_by_tag(tag_id).await
    }

    // ========================================================================
    // Relationship graph
    // ========================================================================

    async fn list_friend_edges(&self, user_id: Uuid) -> anyhow::Result<Vec<FriendEdge>> {
        self.list_friend_edges(user_id).await
    }

    async fn get_friend_edge(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> anyhow::Result<Option<FriendEdge>> {
        self.get_friend_edge(owner_id, friend_id).await
    }

    async fn count_friends(&self, user_id: Uuid) -> anyhow::Result<usize> {
        self.count_friends(user_id).await
    }

    async fn remove_friend_pair(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> anyhow::Result<Option<RemovedFriendship>> {
        self.remove_friend_pair(owner_id, friend_id).await
    }

    // ========================================================================
    // Friend requests
    // ========================================================================

    async fn create_friend_request(&self, request: &FriendRequestNode) -> anyhow::Result<bool> {
        self.create_friend_request(request).await
    }

    async fn get_friend_request(&self, id: Uuid) -> anyhow::Result<Option<FriendRequestNode>> {
        self.get_friend_request(id).await
    }

    async fn delete_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
    ) -> anyhow::Result<StatusWrite> {
        self.delete_friend_request(id, expected).await
    }

    async fn list_friend_requests_sent(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<FriendRequestNode>> {
        self.list_friend_requests_sent(user_id).await
    }

    async fn list_friend_requests_received(
        &self,
        user_id: Uuid,
        status: Option<FriendRequestStatus>,
    ) -> anyhow::Result<Vec<FriendRequestNode>> {
        self.list_friend_requests_received(user_id, status).await
    }

    async fn accept_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        limit: Option<u32>,
        resolved_on: DateTime<Utc>,
    ) -> anyhow::Result<StatusWrite> {
        self.accept_friend_request(id, expected, limit, resolved_on)
            .await
    }

    async fn decline_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> anyhow::Result<StatusWrite> {
        self.decline_friend_request(id, expected, resolved_on).await
    }

    // ========================================================================
    // Access requests
    // ========================================================================

    async fn create_access_request(&self, request: &AccessRequestNode) -> anyhow::Result<()> {
        self.create_access_request(request).await
    }

    async fn get_access_request(&self, id: Uuid) -> anyhow::Result<Option<AccessRequestNode>> {
        self.get_access_request(id).await
    }

    async fn update_access_request_status(
        &self,
        id: Uuid,
        expected: AccessRequestStatus,
        status: AccessRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> anyhow::Result<StatusWrite> {
        self.update_access_request_status(id, expected, status, resolved_on)
            .await
    }

    async fn list_access_requests_sent(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<AccessRequestNode>> {
        self.list_access_requests_sent(user_id).await
    }

    async fn list_access_requests_received(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<AccessRequestNode>> {
        self.list_access_requests_received(user_id).await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    async fn create_post(&self, post: &PostNode) -> anyhow::Result<()> {
        self.create_post(post).await
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostNode>> {
        self.get_post(id).await
    }

    async fn list_posts_by_creator(&self, creator_id: Uuid) -> anyhow::Result<Vec<PostNode>> {
        self.list_posts_by_creator(creator_id).await
    }
}
