//! Friend request and friendship handlers

use super::handlers::{ApiResult, CirclesState, TransitionResponse};
use super::query::ReceivedRequestsQuery;
use crate::auth::Actor;
use crate::neo4j::models::{FriendRequestNode, FriendRequestStatus};
use crate::social::{FriendList, FriendRequestDetail, FriendRequestSummary, RequestList};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateFriendRequestBody {
    pub to: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RespondFriendRequestBody {
    /// `accepted` or `declined`
    pub action: FriendRequestStatus,
    /// Friend cap checked on accept; the configured default applies when absent
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RemovedFriendResponse {
    pub friend_id: Uuid,
    pub request_id: Uuid,
    pub request_deleted: bool,
}

/// `POST /api/friend-requests`
pub async fn create_friend_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<CreateFriendRequestBody>,
) -> ApiResult<(StatusCode, Json<FriendRequestNode>)> {
    let request = state
        .social
        .friends()
        .create_request(actor, body.to, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `POST /api/friend-requests/{id}/cancel`
pub async fn cancel_friend_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .social
        .friends()
        .cancel_request(request_id, actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/friend-requests/{id}/respond`
pub async fn respond_friend_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
    Json(body): Json<RespondFriendRequestBody>,
) -> ApiResult<Json<TransitionResponse<FriendRequestNode>>> {
    let transition = state
        .social
        .friends()
        .respond(request_id, actor, body.action, body.limit, Utc::now())
        .await?;
    Ok(Json(transition.into()))
}

/// `GET /api/friend-requests/{id}`
pub async fn get_friend_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<FriendRequestDetail>> {
    let detail = state.social.friends().get_request(request_id, actor).await?;
    Ok(Json(detail))
}

/// `GET /api/friend-requests/sent`
pub async fn list_sent_friend_requests(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<RequestList<FriendRequestSummary>>> {
    Ok(Json(state.social.friends().list_sent(actor).await?))
}

/// `GET /api/friend-requests/received?status=`
pub async fn list_received_friend_requests(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Query(query): Query<ReceivedRequestsQuery>,
) -> ApiResult<Json<RequestList<FriendRequestSummary>>> {
    let status = query.status.map(|s| s.0);
    Ok(Json(state.social.friends().list_received(actor, status).await?))
}

/// `GET /api/friends`
pub async fn list_friends(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<FriendList>> {
    Ok(Json(state.social.users().list_friends(actor).await?))
}

/// `DELETE /api/friends/{friend_id}`
pub async fn remove_friend(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(friend_id): Path<Uuid>,
) -> ApiResult<Json<RemovedFriendResponse>> {
    let removed = state.social.friends().remove_friend(actor, friend_id).await?;
    Ok(Json(RemovedFriendResponse {
        friend_id,
        request_id: removed.edge.request_id,
        request_deleted: removed.request_deleted,
    }))
}
