//! Neo4j graph models for users, cards, friendships and requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog cards keep the integer ids of the upstream card catalog.
pub type CardId = i64;

// ============================================================================
// Identity Directory
// ============================================================================

/// A registered user, as far as the social core needs to see it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNode {
    pub id: Uuid,
    /// Short public code used for user search (5 chars, stored uppercase)
    pub id_code: String,
    pub name: String,
    pub phone_number: String,
    /// Push registration token; `None` when the device never registered
    #[serde(default)]
    pub notification_address: Option<String>,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub profile_img_url: Option<String>,
    #[serde(default)]
    pub suspended: bool,
    pub joined: DateTime<Utc>,
}

impl UserNode {
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>, id_code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            id_code: id_code.to_uppercase(),
            name: name.into(),
            phone_number: phone_number.into(),
            notification_address: None,
            upi_id: None,
            profile_img_url: None,
            suspended: false,
            joined: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.suspended
    }
}

// ============================================================================
// Card Catalog
// ============================================================================

/// Whether a catalog entry is a concrete card or a virtual tag grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardObjectType {
    Card,
    Tag,
}

impl CardObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardObjectType::Card => "Card",
            CardObjectType::Tag => "Tag",
        }
    }
}

impl std::str::FromStr for CardObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Card" | "card" => Ok(CardObjectType::Card),
            "Tag" | "tag" => Ok(CardObjectType::Tag),
            other => Err(format!("Unknown card object type: {}", other)),
        }
    }
}

/// A catalog card. Tag cards group every card whose `tag_id` equals the tag's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardNode {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub tag_id: Option<CardId>,
    pub object_type: CardObjectType,
}

// ============================================================================
// Relationship graph
// ============================================================================

/// One directed half of a confirmed friendship.
///
/// Edges are always written and deleted in symmetric pairs that share
/// the originating request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEdge {
    pub owner_id: Uuid,
    pub friend_id: Uuid,
    pub request_id: Uuid,
    pub started_on: DateTime<Utc>,
}

/// Friend request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    Active,
    Accepted,
    Declined,
}

impl FriendRequestStatus {
    /// Numeric code persisted in the store and understood by older clients
    pub fn code(&self) -> i64 {
        match self {
            FriendRequestStatus::Active => 0,
            FriendRequestStatus::Accepted => 1,
            FriendRequestStatus::Declined => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(FriendRequestStatus::Active),
            1 => Some(FriendRequestStatus::Accepted),
            -1 => Some(FriendRequestStatus::Declined),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, FriendRequestStatus::Active)
    }
}

/// A proposal to create a symmetric friendship between two users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestNode {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
    pub status: FriendRequestStatus,
}

impl FriendRequestNode {
    pub fn new(from_user_id: Uuid, to_user_id: Uuid, created_on: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_user_id,
            to_user_id,
            created_on,
            resolved_on: None,
            status: FriendRequestStatus::Active,
        }
    }

    /// Direction-independent key of the pair; at most one request may exist per key.
    pub fn pair_key(&self) -> String {
        pair_key(self.from_user_id, self.to_user_id)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }
}

/// Unordered pair key for two user ids
pub fn pair_key(a: Uuid, b: Uuid) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

/// What `remove_friend_pair` took out of the graph
#[derive(Debug, Clone)]
pub struct RemovedFriendship {
    pub edge: FriendEdge,
    /// False when the originating request was already gone
    pub request_deleted: bool,
}

/// Outcome of a conditional status write.
///
/// The store only writes when the stored status still equals the one the
/// caller read, so two racing writers cannot both apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Applied,
    /// The stored status moved on; nothing was written
    Stale,
    /// Accepting would exceed the responder's friend limit; nothing was written
    LimitReached { current: usize },
}

// ============================================================================
// Access requests
// ============================================================================

/// Access request status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequestStatus {
    Cancelled,
    Unaccepted,
    Accepted,
    Fulfilled,
    Rejected,
    Validated,
    Invalidated,
}

impl AccessRequestStatus {
    pub fn code(&self) -> i64 {
        match self {
            AccessRequestStatus::Cancelled => -1,
            AccessRequestStatus::Unaccepted => 0,
            AccessRequestStatus::Accepted => 1,
            AccessRequestStatus::Fulfilled => 2,
            AccessRequestStatus::Rejected => 3,
            AccessRequestStatus::Validated => 4,
            AccessRequestStatus::Invalidated => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(AccessRequestStatus::Cancelled),
            0 => Some(AccessRequestStatus::Unaccepted),
            1 => Some(AccessRequestStatus::Accepted),
            2 => Some(AccessRequestStatus::Fulfilled),
            3 => Some(AccessRequestStatus::Rejected),
            4 => Some(AccessRequestStatus::Validated),
            5 => Some(AccessRequestStatus::Invalidated),
            _ => None,
        }
    }
}

/// A request by one user to use another user's card for a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequestNode {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub card_id: CardId,
    pub amount: i64,
    #[serde(default)]
    pub short_desc: Option<String>,
    pub status: AccessRequestStatus,
    pub created_on: DateTime<Utc>,
    pub resolved_on: Option<DateTime<Utc>>,
}

impl AccessRequestNode {
    pub fn new(
        from_user_id: Uuid,
        to_user_id: Uuid,
        card_id: CardId,
        amount: i64,
        short_desc: Option<String>,
        created_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_user_id,
            to_user_id,
            card_id,
            amount,
            short_desc,
            status: AccessRequestStatus::Unaccepted,
            created_on,
            resolved_on: None,
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }
}

// ============================================================================
// Posts
// ============================================================================

/// A short text post broadcast to the creator's friends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostNode {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
}

impl PostNode {
    pub fn new(creator_id: Uuid, text: impl Into<String>, created_on: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_id,
            text: text.into(),
            created_on,
        }
    }
}

/// Row counts removed by a user purge, in deletion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPurgeSummary {
    pub friend_edges: usize,
    pub friend_requests: usize,
    pub access_requests: usize,
    pub posts: usize,
    pub card_links: usize,
}
