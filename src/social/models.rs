//! Read models returned by the social managers
//!
//! Field names are camelCase on the wire; the mobile client depends on them.

use crate::neo4j::models::{AccessRequestStatus, CardId, FriendRequestStatus, UserNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a state-machine call that may be a no-op
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    /// The status changed and the side effects ran
    Applied(T),
    /// The request was already in the requested state
    Unchanged(T),
}

impl<T> Transition<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Transition::Applied(t) | Transition::Unchanged(t) => t,
        }
    }
}

/// Generic counted list, the shape every list endpoint returns
#[derive(Debug, Clone, Serialize)]
pub struct RequestList<T> {
    pub count: usize,
    pub requests: Vec<T>,
}

impl<T> From<Vec<T>> for RequestList<T> {
    fn from(requests: Vec<T>) -> Self {
        Self {
            count: requests.len(),
            requests,
        }
    }
}

// ============================================================================
// Friends
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: Uuid,
    pub name: String,
    pub num_cards: usize,
    pub profile_img_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendList {
    pub count: usize,
    pub friends: Vec<FriendSummary>,
}

/// One row of a sent/received friend request list; `id` and `name` are the other party
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestSummary {
    pub request_id: Uuid,
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub profile_img_url: Option<String>,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
    pub status: FriendRequestStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestDetail {
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_img_url: Option<String>,
    pub sender_phone: String,
    pub num_sender_cards: usize,
    pub recipient_id: Uuid,
    pub recipient_name: String,
    pub recipient_img_url: Option<String>,
    pub recipient_phone: String,
    pub num_recipient_cards: usize,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
    pub status: FriendRequestStatus,
}

// ============================================================================
// Access requests
// ============================================================================

/// One row of a sent/received access request list; `id` and `name` are the other party
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequestSummary {
    pub request_id: Uuid,
    pub card_id: CardId,
    pub card_name: Option<String>,
    pub id: Uuid,
    pub name: String,
    pub profile_img_url: Option<String>,
    pub amount: i64,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
    pub status: AccessRequestStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequestDetail {
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_phone_number: String,
    pub sender_img_url: Option<String>,
    pub recipient_id: Uuid,
    pub recipient_name: String,
    pub recipient_phone_number: String,
    pub recipient_img_url: Option<String>,
    pub amount: i64,
    pub card_id: CardId,
    pub card_name: Option<String>,
    pub short_desc: Option<String>,
    pub status: AccessRequestStatus,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
}

// ============================================================================
// Cardholder search
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstDegreeMatch {
    pub name: String,
    pub id: Uuid,
    pub phone_number: String,
    pub card_id: CardId,
    pub card_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondDegreeMatch {
    pub name: String,
    pub id: Uuid,
    pub card_id: CardId,
    pub card_name: String,
    /// The first-degree friend connecting requester and holder
    pub friend_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardholderResults {
    pub num_first: usize,
    pub first: Vec<FirstDegreeMatch>,
    pub num_second: usize,
    pub second: Vec<SecondDegreeMatch>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdCodeInfo {
    pub id_code: String,
    pub num_friends: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_img_url: Option<String>,
}

impl From<&UserNode> for UserSearchResult {
    fn from(user: &UserNode) -> Self {
        Self {
            count: 1,
            id: Some(user.id),
            name: Some(user.name.clone()),
            profile_img_url: user.profile_img_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileCard {
    pub id: CardId,
    /// `None` when the card left the catalog
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub cards: Vec<ProfileCard>,
    pub upi_id: Option<String>,
    pub profile_img_url: Option<String>,
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFeedKind {
    /// Posts written by the actor
    #[default]
    Sent,
    /// Posts written by the actor's friends
    Feed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub creator_img_url: Option<String>,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostList {
    pub count: usize,
    pub posts: Vec<PostView>,
}
