//! Card catalog handlers

use super::handlers::{ApiResult, CirclesState};
use super::query::CardFilterQuery;
use crate::auth::Actor;
use crate::neo4j::models::CardNode;
use axum::{
    extract::{Query, State},
    Json,
};

/// `GET /api/cards`
pub async fn list_cards(
    State(state): State<CirclesState>,
    Actor(_actor): Actor,
) -> ApiResult<Json<Vec<CardNode>>> {
    Ok(Json(state.social.catalog().list_cards().await?))
}

/// `GET /api/cards/filter?object_type=Card|Tag`
pub async fn filter_cards(
    State(state): State<CirclesState>,
    Actor(_actor): Actor,
    Query(query): Query<CardFilterQuery>,
) -> ApiResult<Json<Vec<CardNode>>> {
    Ok(Json(
        state
            .social
            .catalog()
            .list_by_type(query.object_type)
            .await?,
    ))
}
