//! API route definitions

use super::handlers::{self, CirclesState};
use super::{access_handlers, card_handlers, friend_handlers, post_handlers, user_handlers};
use crate::auth::require_auth;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: CirclesState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // ====================================================================
        // Friend requests
        // ====================================================================
        .route(
            "/api/friend-requests",
            post(friend_handlers::create_friend_request),
        )
        .route(
            "/api/friend-requests/sent",
            get(friend_handlers::list_sent_friend_requests),
        )
        .route(
            "/api/friend-requests/received",
            get(friend_handlers::list_received_friend_requests),
        )
        .route(
            "/api/friend-requests/{id}",
            get(friend_handlers::get_friend_request),
        )
        .route(
            "/api/friend-requests/{id}/cancel",
            post(friend_handlers::cancel_friend_request),
        )
        .route(
            "/api/friend-requests/{id}/respond",
            post(friend_handlers::respond_friend_request),
        )
        // Friends
        .route("/api/friends", get(friend_handlers::list_friends))
        .route(
            "/api/friends/{friend_id}",
            delete(friend_handlers::remove_friend),
        )
        // ====================================================================
        // Access requests
        // ====================================================================
        .route(
            "/api/access-requests",
            post(access_handlers::create_access_request),
        )
        .route(
            "/api/access-requests/sent",
            get(access_handlers::list_sent_access_requests),
        )
        .route(
            "/api/access-requests/received",
            get(access_handlers::list_received_access_requests),
        )
        .route(
            "/api/access-requests/{id}",
            get(access_handlers::get_access_request),
        )
        .route(
            "/api/access-requests/{id}/respond",
            post(access_handlers::respond_access_request),
        )
        .route(
            "/api/access-requests/{id}/cancel",
            post(access_handlers::cancel_access_request),
        )
        .route(
            "/api/access-requests/{id}/confirm",
            post(access_handlers::confirm_access_request),
        )
        // Search
        .route(
            "/api/search/cardholders",
            get(access_handlers::search_cardholders),
        )
        // ====================================================================
        // Users
        // ====================================================================
        .route("/api/users/me", delete(user_handlers::delete_me))
        .route("/api/users/me/id-code", get(user_handlers::get_id_code))
        .route("/api/users/me/upi", put(user_handlers::update_upi))
        .route("/api/users/me/cards", put(user_handlers::update_cards))
        .route("/api/users/search", get(user_handlers::search_user))
        .route("/api/users/profile", get(user_handlers::get_profile))
        .route(
            "/api/users/chat-notification",
            post(user_handlers::send_chat_notification),
        )
        // ====================================================================
        // Cards
        // ====================================================================
        .route("/api/cards", get(card_handlers::list_cards))
        .route("/api/cards/filter", get(card_handlers::filter_cards))
        // ====================================================================
        // Posts
        // ====================================================================
        .route(
            "/api/posts",
            get(post_handlers::list_posts).post(post_handlers::create_post),
        )
        .route("/api/posts/{id}", get(post_handlers::get_post))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
