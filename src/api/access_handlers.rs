//! Card access request handlers and cardholder search

use super::handlers::{ApiResult, CirclesState, TransitionResponse};
use super::query::CardholderQuery;
use crate::auth::Actor;
use crate::neo4j::models::{AccessRequestNode, AccessRequestStatus, CardId};
use crate::social::{
    AccessRequestDetail, AccessRequestSummary, CardholderResults, NewAccessRequest, RequestList,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessRequestBody {
    pub to: Uuid,
    pub card_id: CardId,
    pub amount: i64,
    #[serde(default)]
    pub short_desc: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondAccessRequestBody {
    /// `accepted`, `rejected` or `fulfilled`
    pub action: AccessRequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmAccessRequestBody {
    pub valid: bool,
}

/// `POST /api/access-requests`
pub async fn create_access_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<CreateAccessRequestBody>,
) -> ApiResult<(StatusCode, Json<AccessRequestNode>)> {
    let input = NewAccessRequest {
        to: body.to,
        card_id: body.card_id,
        amount: body.amount,
        short_desc: body.short_desc,
    };
    let request = state
        .social
        .access()
        .create_request(actor, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `POST /api/access-requests/{id}/respond`
pub async fn respond_access_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
    Json(body): Json<RespondAccessRequestBody>,
) -> ApiResult<Json<TransitionResponse<AccessRequestNode>>> {
    let transition = state
        .social
        .access()
        .respond(request_id, actor, body.action, Utc::now())
        .await?;
    Ok(Json(transition.into()))
}

/// `POST /api/access-requests/{id}/cancel`
pub async fn cancel_access_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<TransitionResponse<AccessRequestNode>>> {
    let transition = state
        .social
        .access()
        .cancel(request_id, actor, Utc::now())
        .await?;
    Ok(Json(transition.into()))
}

/// `POST /api/access-requests/{id}/confirm`
pub async fn confirm_access_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ConfirmAccessRequestBody>,
) -> ApiResult<Json<TransitionResponse<AccessRequestNode>>> {
    let transition = state
        .social
        .access()
        .confirm(request_id, actor, body.valid, Utc::now())
        .await?;
    Ok(Json(transition.into()))
}

/// `GET /api/access-requests/{id}`
pub async fn get_access_request(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<AccessRequestDetail>> {
    Ok(Json(state.social.access().get_request(request_id, actor).await?))
}

/// `GET /api/access-requests/sent`
pub async fn list_sent_access_requests(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<RequestList<AccessRequestSummary>>> {
    Ok(Json(state.social.access().list_sent(actor).await?))
}

/// `GET /api/access-requests/received`
pub async fn list_received_access_requests(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<RequestList<AccessRequestSummary>>> {
    Ok(Json(state.social.access().list_received(actor).await?))
}

/// `GET /api/search/cardholders?card_id=`
pub async fn search_cardholders(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Query(query): Query<CardholderQuery>,
) -> ApiResult<Json<CardholderResults>> {
    Ok(Json(state.social.search().search(actor, query.card_id).await?))
}
