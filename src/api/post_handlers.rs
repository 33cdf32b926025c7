//! Post handlers

use super::handlers::{ApiResult, CirclesState};
use super::query::PostsQuery;
use crate::auth::Actor;
use crate::neo4j::models::PostNode;
use crate::social::{PostList, PostView};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
    pub text: String,
}

/// `POST /api/posts`
pub async fn create_post(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Json(body): Json<CreatePostBody>,
) -> ApiResult<(StatusCode, Json<PostNode>)> {
    let post = state
        .social
        .posts()
        .create_post(actor, &body.text, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/posts?kind=sent|feed`
pub async fn list_posts(
    State(state): State<CirclesState>,
    Actor(actor): Actor,
    Query(query): Query<PostsQuery>,
) -> ApiResult<Json<PostList>> {
    Ok(Json(state.social.posts().list_posts(actor, query.kind).await?))
}

/// `GET /api/posts/{id}`
pub async fn get_post(
    State(state): State<CirclesState>,
    Actor(_actor): Actor,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PostView>> {
    Ok(Json(state.social.posts().get_post(post_id).await?))
}
