//! Friend request lifecycle and friendship removal
//!
//! A request moves `Active -> Accepted | Declined`. Accepting writes the
//! symmetric edge pair in the same store call that flips the status, so no
//! reader ever sees one without the other. Status writes are conditional on
//! the status the manager read. Notifications go out only after the store
//! call applied.

use super::error::{SocialError, SocialResult};
use super::models::{FriendRequestDetail, FriendRequestSummary, RequestList, Transition};
use super::{notify_user, templates};
use crate::neo4j::models::{
    FriendRequestNode, FriendRequestStatus, RemovedFriendship, StatusWrite, UserNode,
};
use crate::neo4j::SocialStore;
use crate::notifications::{NotificationIntent, NotificationKind, Notifier};
use crate::SocialConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Manager for friend requests and the friendship graph
pub struct FriendManager {
    store: Arc<dyn SocialStore>,
    notifier: Option<Arc<dyn Notifier>>,
    config: SocialConfig,
}

impl FriendManager {
    pub fn new(store: Arc<dyn SocialStore>, config: SocialConfig) -> Self {
        Self {
            store,
            notifier: None,
            config,
        }
    }

    pub fn with_notifier(
        store: Arc<dyn SocialStore>,
        notifier: Arc<dyn Notifier>,
        config: SocialConfig,
    ) -> Self {
        Self {
            store,
            notifier: Some(notifier),
            config,
        }
    }

    /// Send a friend request from `actor` to `to`
    pub async fn create_request(
        &self,
        actor: Uuid,
        to: Uuid,
        now: DateTime<Utc>,
    ) -> SocialResult<FriendRequestNode> {
        if actor == to {
            return Err(SocialError::invalid(
                "cannot send a friend request to yourself",
            ));
        }

        let sender = self
            .store
            .get_user(actor)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown sender {}", actor)))?;
        let recipient = self
            .store
            .get_user(to)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown recipient {}", to)))?;

        let request = FriendRequestNode::new(actor, to, now);
        if !self.store.create_friend_request(&request).await? {
            return Err(SocialError::Conflict(format!(
                "a friend request between {} and {} already exists",
                actor, to
            )));
        }

        info!(request_id = %request.id, from = %actor, to = %to, "Friend request created");

        notify_user(self.notifier.as_ref(), &recipient, |address| {
            NotificationIntent::new(
                address,
                NotificationKind::FriendRequest,
                templates::FRIEND_REQUEST_TITLE,
                templates::friend_request_body(&sender.name),
            )
            .with_request_id(request.id)
        });

        Ok(request)
    }

    /// Withdraw (sender) or dismiss (recipient) a request that did not end
    /// in a friendship.
    ///
    /// Active and Declined requests are deleted, which frees the pair for a
    /// new request. Accepted ones go through `remove_friend`. No
    /// notification is sent.
    pub async fn cancel_request(&self, request_id: Uuid, actor: Uuid) -> SocialResult<()> {
        let request = self.load_request(request_id).await?;
        if !request.involves(actor) {
            return Err(SocialError::NotParticipant { actor, request_id });
        }
        ensure_cancellable(&request)?;

        if self
            .store
            .delete_friend_request(request_id, request.status)
            .await?
            == StatusWrite::Stale
        {
            // Answered or cancelled in the meantime
            let current = self.load_request(request_id).await?;
            ensure_cancellable(&current)?;
            return Err(SocialError::Conflict(format!(
                "friend request {} changed while cancelling",
                request_id
            )));
        }

        info!(request_id = %request_id, actor = %actor, status = ?request.status, "Friend request cancelled");
        Ok(())
    }

    /// Resolve a request as its recipient.
    ///
    /// Re-applying the current status is a no-op. `limit` (or the configured
    /// default) caps the responder's friend count when accepting. The status
    /// write is conditional on the status read here, so of two racing calls
    /// only one applies and notifies.
    pub async fn respond(
        &self,
        request_id: Uuid,
        actor: Uuid,
        action: FriendRequestStatus,
        limit: Option<u32>,
        now: DateTime<Utc>,
    ) -> SocialResult<Transition<FriendRequestNode>> {
        if !action.is_resolved() {
            return Err(SocialError::invalid(
                "a friend request can only be accepted or declined",
            ));
        }

        let mut request = self.load_request(request_id).await?;
        if request.to_user_id != actor {
            return Err(SocialError::NotParticipant { actor, request_id });
        }

        if request.status == action {
            debug!(request_id = %request_id, status = ?action, "Friend request already resolved this way");
            return Ok(Transition::Unchanged(request));
        }

        if request.status.is_resolved() && !self.config.allow_resolution_flip {
            return Err(SocialError::Conflict(format!(
                "friend request {} is already {:?}",
                request_id, request.status
            )));
        }

        let responder = self.store.get_user(actor).await?;
        let sender = self.store.get_user(request.from_user_id).await?;

        let limit = limit.or(self.config.default_friend_limit);
        let write = match action {
            FriendRequestStatus::Accepted => {
                self.store
                    .accept_friend_request(request_id, request.status, limit, now)
                    .await?
            }
            _ => {
                self.store
                    .decline_friend_request(request_id, request.status, now)
                    .await?
            }
        };

        match write {
            StatusWrite::Applied => {}
            StatusWrite::LimitReached { current } => {
                return Err(SocialError::PreconditionFailed {
                    limit: limit.unwrap_or_default(),
                    current,
                });
            }
            StatusWrite::Stale => return self.settle_stale(request_id, action).await,
        }

        request.status = action;
        request.resolved_on = Some(now);
        info!(request_id = %request_id, actor = %actor, status = ?action, "Friend request resolved");

        match (responder, sender) {
            (Some(responder), Some(sender)) => {
                let (title, body) = match action {
                    FriendRequestStatus::Accepted => (
                        templates::friend_request_accepted_title(&responder.name),
                        templates::FRIEND_REQUEST_ACCEPTED_BODY,
                    ),
                    _ => (
                        templates::friend_request_declined_title(&responder.name),
                        templates::FRIEND_REQUEST_DECLINED_BODY,
                    ),
                };
                notify_user(self.notifier.as_ref(), &sender, |address| {
                    NotificationIntent::new(address, NotificationKind::FriendRequest, title, body)
                        .with_request_id(request_id)
                        .with_extra("isUserSender", "true")
                });
            }
            _ => warn!(request_id = %request_id, "Participant missing, skipping notification"),
        }

        Ok(Transition::Applied(request))
    }

    /// Another writer changed the request between our read and our write.
    /// If it landed where we were heading, report a no-op.
    async fn settle_stale(
        &self,
        request_id: Uuid,
        action: FriendRequestStatus,
    ) -> SocialResult<Transition<FriendRequestNode>> {
        let current = self.load_request(request_id).await?;
        if current.status == action {
            debug!(request_id = %request_id, status = ?action, "Friend request resolved concurrently");
            return Ok(Transition::Unchanged(current));
        }
        Err(SocialError::Conflict(format!(
            "friend request {} was resolved concurrently as {:?}",
            request_id, current.status
        )))
    }

    /// Remove the friendship `actor -> friend_id` in both directions,
    /// together with the request that created it.
    pub async fn remove_friend(
        &self,
        actor: Uuid,
        friend_id: Uuid,
    ) -> SocialResult<RemovedFriendship> {
        let removed = self
            .store
            .remove_friend_pair(actor, friend_id)
            .await?
            .ok_or(SocialError::MissingFriendEdge {
                owner: actor,
                friend: friend_id,
            })?;

        if !removed.request_deleted {
            warn!(
                request_id = %removed.edge.request_id,
                "Originating friend request was already gone"
            );
        }
        info!(actor = %actor, friend = %friend_id, "Friendship removed");
        Ok(removed)
    }

    /// Full detail of a request; only its participants may read it
    pub async fn get_request(
        &self,
        request_id: Uuid,
        actor: Uuid,
    ) -> SocialResult<FriendRequestDetail> {
        let request = self.load_request(request_id).await?;
        if !request.involves(actor) {
            return Err(SocialError::NotParticipant { actor, request_id });
        }

        let sender = self.require_user(request.from_user_id).await?;
        let recipient = self.require_user(request.to_user_id).await?;
        let num_sender_cards = self.store.get_user_card_ids(sender.id).await?.len();
        let num_recipient_cards = self.store.get_user_card_ids(recipient.id).await?.len();

        Ok(FriendRequestDetail {
            request_id: request.id,
            sender_id: sender.id,
            sender_name: sender.name,
            sender_img_url: sender.profile_img_url,
            sender_phone: sender.phone_number,
            num_sender_cards,
            recipient_id: recipient.id,
            recipient_name: recipient.name,
            recipient_img_url: recipient.profile_img_url,
            recipient_phone: recipient.phone_number,
            num_recipient_cards,
            created_on: request.created_on,
            resolved_on: request.resolved_on,
            status: request.status,
        })
    }

    /// Requests sent by `actor`, newest first
    pub async fn list_sent(&self, actor: Uuid) -> SocialResult<RequestList<FriendRequestSummary>> {
        let requests = self.store.list_friend_requests_sent(actor).await?;
        let mut rows = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(recipient) = self.store.get_user(request.to_user_id).await? else {
                warn!(request_id = %request.id, "Recipient of friend request not found");
                continue;
            };
            rows.push(summary(&request, &recipient, false));
        }
        Ok(rows.into())
    }

    /// Requests received by `actor`, newest first, optionally filtered by status
    pub async fn list_received(
        &self,
        actor: Uuid,
        status: Option<FriendRequestStatus>,
    ) -> SocialResult<RequestList<FriendRequestSummary>> {
        let requests = self
            .store
            .list_friend_requests_received(actor, status)
            .await?;
        let mut rows = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(sender) = self.store.get_user(request.from_user_id).await? else {
                warn!(request_id = %request.id, "Sender of friend request not found");
                continue;
            };
            rows.push(summary(&request, &sender, true));
        }
        Ok(rows.into())
    }

    async fn load_request(&self, request_id: Uuid) -> SocialResult<FriendRequestNode> {
        self.store
            .get_friend_request(request_id)
            .await?
            .ok_or(SocialError::UnknownRequest(request_id))
    }

    async fn require_user(&self, id: Uuid) -> SocialResult<UserNode> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("user {}", id)))
    }
}

fn ensure_cancellable(request: &FriendRequestNode) -> SocialResult<()> {
    if request.status == FriendRequestStatus::Accepted {
        return Err(SocialError::invalid(format!(
            "friend request {} was accepted; remove the friendship instead",
            request.id
        )));
    }
    Ok(())
}

fn summary(request: &FriendRequestNode, other: &UserNode, with_phone: bool) -> FriendRequestSummary {
    FriendRequestSummary {
        request_id: request.id,
        id: other.id,
        name: other.name.clone(),
        phone_number: with_phone.then(|| other.phone_number.clone()),
        profile_img_url: other.profile_img_url.clone(),
        created_on: request.created_on,
        resolved_on: request.resolved_on,
        status: request.status,
    }
}
