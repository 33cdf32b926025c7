//! Card access request lifecycle
//!
//! Transition table:
//!
//! | actor     | from                           | to                    |
//! |-----------|--------------------------------|-----------------------|
//! | recipient | Unaccepted, Accepted, Rejected | Accepted, Rejected    |
//! | recipient | Accepted                       | Fulfilled             |
//! | sender    | Fulfilled                      | Validated, Invalidated|
//! | sender    | Unaccepted                     | Cancelled             |
//!
//! Re-applying the current status is always a no-op.

use super::error::{SocialError, SocialResult};
use super::models::{AccessRequestDetail, AccessRequestSummary, RequestList, Transition};
use super::{notify_user, templates};
use crate::neo4j::models::{
    AccessRequestNode, AccessRequestStatus, CardId, StatusWrite, UserNode,
};
use crate::neo4j::SocialStore;
use crate::notifications::{NotificationIntent, NotificationKind, Notifier};
use crate::SocialConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use AccessRequestStatus::*;

/// Input for [`AccessManager::create_request`]
#[derive(Debug, Clone)]
pub struct NewAccessRequest {
    pub to: Uuid,
    pub card_id: CardId,
    pub amount: i64,
    pub short_desc: Option<String>,
}

/// Which side of a request an actor must be on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Sender,
    Recipient,
}

/// Manager for card access requests
pub struct AccessManager {
    store: Arc<dyn SocialStore>,
    notifier: Option<Arc<dyn Notifier>>,
    config: SocialConfig,
}

impl AccessManager {
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

    /// Ask `input.to` for use of one of their cards.
    ///
    /// There is no uniqueness constraint: any number of requests may be open
    /// between the same two users.
    pub async fn create_request(
        &self,
        actor: Uuid,
        input: NewAccessRequest,
        now: DateTime<Utc>,
    ) -> SocialResult<AccessRequestNode> {
        if input.to == actor {
            return Err(SocialError::invalid(
                "cannot send an access request to yourself",
            ));
        }
        if input.amount <= 0 {
            return Err(SocialError::invalid("amount must be positive"));
        }

        let recipient = self
            .store
            .get_user(input.to)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown recipient {}", input.to)))?;
        let sender = self
            .store
            .get_user(actor)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown sender {}", actor)))?;
        let card_name = self.card_name(input.card_id).await?;

        let request = AccessRequestNode::new(
            actor,
            input.to,
            input.card_id,
            input.amount,
            input.short_desc.filter(|s| !s.trim().is_empty()),
            now,
        );
        self.store.create_access_request(&request).await?;

        info!(
            request_id = %request.id,
            from = %actor,
            to = %input.to,
            card_id = input.card_id,
            "Access request created"
        );

        let card_label = card_name.unwrap_or_else(|| format!("card #{}", input.card_id));
        notify_user(self.notifier.as_ref(), &recipient, |address| {
            NotificationIntent::new(
                address,
                NotificationKind::AccessRequest,
                templates::access_request_title(&sender.name),
                templates::access_request_body(&sender.name, &card_label),
            )
            .with_request_id(request.id)
        });

        Ok(request)
    }

    /// Recipient answers a request (accept, reject, or report it fulfilled)
    pub async fn respond(
        &self,
        request_id: Uuid,
        actor: Uuid,
        action: AccessRequestStatus,
        now: DateTime<Utc>,
    ) -> SocialResult<Transition<AccessRequestNode>> {
        let request = self.load_for(request_id, actor, Side::Recipient).await?;
        if request.status == action {
            debug!(request_id = %request_id, status = ?action, "Access request already in requested state");
            return Ok(Transition::Unchanged(request));
        }

        match (request.status, action) {
            (Unaccepted, Accepted | Rejected) | (Accepted, Fulfilled) => {}
            (Accepted, Rejected) | (Rejected, Accepted) => {
                if !self.config.allow_resolution_flip {
                    return Err(SocialError::Conflict(format!(
                        "access request {} is already {:?}",
                        request_id, request.status
                    )));
                }
            }
            (from, to) => {
                return Err(SocialError::invalid(format!(
                    "recipient cannot move an access request from {:?} to {:?}",
                    from, to
                )))
            }
        }

        let responder = self.store.get_user(actor).await?;
        let sender = self.store.get_user(request.from_user_id).await?;
        let request = match self.apply(request, action, now).await? {
            Transition::Applied(request) => request,
            unchanged => return Ok(unchanged),
        };

        if let (Some(responder), Some(sender)) = (responder, sender) {
            let title = match action {
                Accepted => templates::access_request_accepted_title(&responder.name),
                Fulfilled => templates::access_request_fulfilled_title(&responder.name),
                _ => templates::access_request_declined_title(&responder.name),
            };
            notify_user(self.notifier.as_ref(), &sender, |address| {
                NotificationIntent::new(
                    address,
                    NotificationKind::AccessRequest,
                    title,
                    templates::ACCESS_REQUEST_OPEN_BODY,
                )
                .with_request_id(request_id)
                .with_extra("isUserSender", "true")
            });
        } else {
            warn!(request_id = %request_id, "Participant missing, skipping notification");
        }

        Ok(Transition::Applied(request))
    }

    /// Sender withdraws a request nobody answered yet
    pub async fn cancel(
        &self,
        request_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> SocialResult<Transition<AccessRequestNode>> {
        let request = self.load_for(request_id, actor, Side::Sender).await?;
        match request.status {
            Cancelled => return Ok(Transition::Unchanged(request)),
            Unaccepted => {}
            other => {
                return Err(SocialError::invalid(format!(
                    "cannot cancel an access request that is {:?}",
                    other
                )))
            }
        }

        let sender = self.store.get_user(actor).await?;
        let recipient = self.store.get_user(request.to_user_id).await?;
        let request = match self.apply(request, Cancelled, now).await? {
            Transition::Applied(request) => request,
            unchanged => return Ok(unchanged),
        };

        if let (Some(sender), Some(recipient)) = (sender, recipient) {
            notify_user(self.notifier.as_ref(), &recipient, |address| {
                NotificationIntent::new(
                    address,
                    NotificationKind::AccessRequest,
                    templates::access_request_cancelled_title(&sender.name),
                    templates::ACCESS_REQUEST_OPEN_BODY,
                )
                .with_request_id(request_id)
            });
        }

        Ok(Transition::Applied(request))
    }

    /// Sender confirms (or disputes) a purchase the recipient reported as fulfilled
    pub async fn confirm(
        &self,
        request_id: Uuid,
        actor: Uuid,
        valid: bool,
        now: DateTime<Utc>,
    ) -> SocialResult<Transition<AccessRequestNode>> {
        let request = self.load_for(request_id, actor, Side::Sender).await?;
        let target = if valid { Validated } else { Invalidated };
        if request.status == target {
            return Ok(Transition::Unchanged(request));
        }
        if request.status != Fulfilled {
            return Err(SocialError::invalid(format!(
                "only fulfilled access requests can be confirmed (currently {:?})",
                request.status
            )));
        }

        let sender = self.store.get_user(actor).await?;
        let recipient = self.store.get_user(request.to_user_id).await?;
        let request = match self.apply(request, target, now).await? {
            Transition::Applied(request) => request,
            unchanged => return Ok(unchanged),
        };

        if let (Some(sender), Some(recipient)) = (sender, recipient) {
            notify_user(self.notifier.as_ref(), &recipient, |address| {
                NotificationIntent::new(
                    address,
                    NotificationKind::AccessRequest,
                    templates::access_request_confirmed_title(&sender.name, valid),
                    templates::ACCESS_REQUEST_OPEN_BODY,
                )
                .with_request_id(request_id)
            });
        }

        Ok(Transition::Applied(request))
    }

    /// Full detail; only the sender and recipient may read it
    pub async fn get_request(
        &self,
        request_id: Uuid,
        actor: Uuid,
    ) -> SocialResult<AccessRequestDetail> {
        let request = self.load(request_id).await?;
        if !request.involves(actor) {
            return Err(SocialError::NotParticipant { actor, request_id });
        }

        let sender = self.require_user(request.from_user_id).await?;
        let recipient = self.require_user(request.to_user_id).await?;
        let card_name = self.card_name(request.card_id).await?;

        Ok(AccessRequestDetail {
            request_id: request.id,
            sender_id: sender.id,
            sender_name: sender.name,
            sender_phone_number: sender.phone_number,
            sender_img_url: sender.profile_img_url,
            recipient_id: recipient.id,
            recipient_name: recipient.name,
            recipient_phone_number: recipient.phone_number,
            recipient_img_url: recipient.profile_img_url,
            amount: request.amount,
            card_id: request.card_id,
            card_name,
            short_desc: request.short_desc,
            status: request.status,
            created_on: request.created_on,
            resolved_on: request.resolved_on,
        })
    }

    /// Requests sent by `actor`, newest first
    pub async fn list_sent(&self, actor: Uuid) -> SocialResult<RequestList<AccessRequestSummary>> {
        let requests = self.store.list_access_requests_sent(actor).await?;
        self.summaries(requests, |r| r.to_user_id).await
    }

    /// Requests received by `actor`, newest first
    pub async fn list_received(
        &self,
        actor: Uuid,
    ) -> SocialResult<RequestList<AccessRequestSummary>> {
        let requests = self.store.list_access_requests_received(actor).await?;
        self.summaries(requests, |r| r.from_user_id).await
    }

    async fn summaries(
        &self,
        requests: Vec<AccessRequestNode>,
        other_party: impl Fn(&AccessRequestNode) -> Uuid,
    ) -> SocialResult<RequestList<AccessRequestSummary>> {
        let mut card_names: HashMap<CardId, Option<String>> = HashMap::new();
        let mut rows = Vec::with_capacity(requests.len());

        for request in requests {
            let other_id = other_party(&request);
            let Some(other) = self.store.get_user(other_id).await? else {
                warn!(request_id = %request.id, user_id = %other_id, "Access request party not found");
                continue;
            };
            let card_name = match card_names.get(&request.card_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.card_name(request.card_id).await?;
                    card_names.insert(request.card_id, name.clone());
                    name
                }
            };
            rows.push(AccessRequestSummary {
                request_id: request.id,
                card_id: request.card_id,
                card_name,
                id: other.id,
                name: other.name,
                profile_img_url: other.profile_img_url,
                amount: request.amount,
                created_on: request.created_on,
                resolved_on: request.resolved_on,
                status: request.status,
            });
        }

        Ok(rows.into())
    }

    /// Write `status` only if the stored status is still the one we read.
    ///
    /// When another call got there first, a request already at `status` is
    /// reported unchanged and anything else is a conflict.
    async fn apply(
        &self,
        mut request: AccessRequestNode,
        status: AccessRequestStatus,
        now: DateTime<Utc>,
    ) -> SocialResult<Transition<AccessRequestNode>> {
        let write = self
            .store
            .update_access_request_status(request.id, request.status, status, now)
            .await?;

        if write != StatusWrite::Applied {
            let current = self.load(request.id).await?;
            if current.status == status {
                debug!(request_id = %request.id, status = ?status, "Access request updated concurrently");
                return Ok(Transition::Unchanged(current));
            }
            return Err(SocialError::Conflict(format!(
                "access request {} changed concurrently to {:?}",
                request.id, current.status
            )));
        }

        info!(request_id = %request.id, from = ?request.status, to = ?status, "Access request updated");
        request.status = status;
        request.resolved_on = Some(now);
        Ok(Transition::Applied(request))
    }

    async fn load(&self, request_id: Uuid) -> SocialResult<AccessRequestNode> {
        self.store
            .get_access_request(request_id)
            .await?
            .ok_or(SocialError::UnknownRequest(request_id))
    }

    async fn load_for(
        &self,
        request_id: Uuid,
        actor: Uuid,
        side: Side,
    ) -> SocialResult<AccessRequestNode> {
        let request = self.load(request_id).await?;
        let expected = match side {
            Side::Sender => request.from_user_id,
            Side::Recipient => request.to_user_id,
        };
        if expected != actor {
            return Err(SocialError::NotParticipant { actor, request_id });
        }
        Ok(request)
    }

    async fn card_name(&self, card_id: CardId) -> SocialResult<Option<String>> {
        let card = self.store.get_card(card_id).await?;
        if card.is_none() {
            warn!(card_id, "Card not found in catalog");
        }
        Ok(card.map(|c| c.name))
    }

    async fn require_user(&self, id: Uuid) -> SocialResult<UserNode> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("user {}", id)))
    }
}
