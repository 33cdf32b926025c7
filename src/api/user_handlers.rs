//! User directory, card ownership and chat notification handlers

use super::handlers::{ApiResult, CirclesState};
use super::query::{IdCodeQuery, ProfileQuery};
use crate::auth::Actor;
use crate::neo4j::models::{CardId, UserPurgeSummary};
use crate::social::{IdCodeInfo, Profile, UserSearchResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUpiBody {
    pub upi_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardsBody {
    pub card_ids: Vec<CardId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardsResponse {
    pub card_ids: Vec<CardId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatNotificationBody {
    pub to_address: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// `GET /api/users/me/id-code`
pub async fn get_id_code(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<IdCodeInfo>> {
    Ok(Json(state.social.users().id_code_info(actor).await?))
}

/// `GET /api/users/search?id_code=`
pub async fn search_user(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Query(query): Query<IdCodeQuery>,
) -> ApiResult<Json<UserSearchResult>> {
    Ok(Json(
        state
            .social
            .users()
            .search_by_id_code(actor, &query.id_code)
            .await?,
    ))
}

/// `GET /api/users/profile?id=`
pub async fn get_profile(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.social.users().profile(actor, query.id).await?))
}

/// `PUT /api/users/me/upi`
pub async fn update_upi(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<UpdateUpiBody>,
) -> ApiResult<StatusCode> {
    state.social.users().update_upi(actor, &body.upi_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/users/me/cards`
pub async fn update_cards(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<UpdateCardsBody>,
) -> ApiResult<Json<UpdateCardsResponse>> {
    let card_ids = state
        .social
        .users()
        .update_cards(actor, &body.card_ids)
        .await?;
    Ok(Json(UpdateCardsResponse { card_ids }))
}

/// `DELETE /api/users/me`
pub async fn delete_me(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
) -> ApiResult<Json<UserPurgeSummary>> {
    Ok(Json(state.social.users().delete_user(actor).await?))
}

/// `POST /api/users/chat-notification`
pub async fn send_chat_notification(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<ChatNotificationBody>,
) -> ApiResult<StatusCode> {
    state
        .social
        .users()
        .send_chat_notification(actor, &body.to_address, body.data)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
