//! Query parameter structs for list and search endpoints

use crate::neo4j::models::{CardId, CardObjectType, FriendRequestStatus};
use crate::social::PostFeedKind;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Helper to deserialize an optional value from a query string, treating
/// an empty value as absent
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Friend request status as written in a query string.
///
/// Accepts the status name (`accepted`) or the numeric code older
/// clients send (`1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendStatusParam(pub FriendRequestStatus);

impl FromStr for FriendStatusParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.to_lowercase().as_str() {
            "active" => Some(FriendRequestStatus::Active),
            "accepted" => Some(FriendRequestStatus::Accepted),
            "declined" => Some(FriendRequestStatus::Declined),
            other => other.parse::<i64>().ok().and_then(FriendRequestStatus::from_code),
        };
        status
            .map(FriendStatusParam)
            .ok_or_else(|| format!("Unknown friend request status: {}", s))
    }
}

/// `GET /api/friend-requests/received?status=`
#[derive(Debug, Default, Deserialize)]
pub struct ReceivedRequestsQuery {
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub status: Option<FriendStatusParam>,
}

/// `GET /api/search/cardholders?card_id=`
#[derive(Debug, Deserialize)]
pub struct CardholderQuery {
    pub card_id: CardId,
}

/// `GET /api/users/search?id_code=`
#[derive(Debug, Deserialize)]
pub struct IdCodeQuery {
    pub id_code: String,
}

/// `GET /api/users/profile?id=`
#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub id: Option<uuid::Uuid>,
}

/// `GET /api/cards/filter?object_type=`
#[derive(Debug, Deserialize)]
pub struct CardFilterQuery {
    #[serde(deserialize_with = "deserialize_from_str")]
    pub object_type: CardObjectType,
}

fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(D::Error::custom)
}

/// `GET /api/posts?kind=`
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    #[serde(default)]
    pub kind: PostFeedKind,
}
