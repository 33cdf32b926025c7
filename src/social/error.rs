//! Error taxonomy of the social core

use uuid::Uuid;

/// Result alias for request-engine operations
pub type SocialResult<T> = Result<T, SocialError>;

/// Errors returned by the managers.
///
/// Every variant except `MissingFriendEdge` and `Store` is raised before any
/// write is attempted.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    /// Missing or malformed input, self-targeted request, unknown recipient
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced request does not exist
    #[error("request {0} not found")]
    UnknownRequest(Uuid),

    /// The actor is not allowed to act on this request
    #[error("user {actor} is not a participant of request {request_id}")]
    NotParticipant { actor: Uuid, request_id: Uuid },

    /// A referenced user, card or post does not exist
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Friend limit reached
    #[error("friend limit of {limit} reached ({current} friends)")]
    PreconditionFailed { limit: u32, current: usize },

    /// A friendship that should exist is gone; data integrity problem
    #[error("no friend edge from {owner} to {friend}")]
    MissingFriendEdge { owner: Uuid, friend: Uuid },

    /// Store failure; the operation was rolled back
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl SocialError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SocialError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let id = Uuid::nil();
        assert_eq!(
            SocialError::UnknownRequest(id).to_string(),
            format!("request {} not found", id)
        );
        assert_eq!(
            SocialError::PreconditionFailed {
                limit: 3,
                current: 3
            }
            .to_string(),
            "friend limit of 3 reached (3 friends)"
        );
    }

    #[test]
    fn test_store_errors_convert_from_anyhow() {
        let err: SocialError = anyhow::anyhow!("commit rejected").into();
        assert!(matches!(err, SocialError::Store(_)));
        assert!(err.to_string().contains("commit rejected"));
    }
}
