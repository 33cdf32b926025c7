//! Posts broadcast to a user's Circle

use super::error::{SocialError, SocialResult};
use super::models::{PostFeedKind, PostList, PostView};
use super::{notify_user, templates};
use crate::neo4j::models::{PostNode, UserNode};
use crate::neo4j::SocialStore;
use crate::notifications::{NotificationIntent, NotificationKind, Notifier};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct PostManager {
    store: Arc<dyn SocialStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl PostManager {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self {
            store,
            notifier: None,
        }
    }

    pub fn with_notifier(store: Arc<dyn SocialStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier: Some(notifier),
        }
    }

    /// Store a post and tell every friend about it (one push each)
    pub async fn create_post(
        &self,
        actor: Uuid,
        text: &str,
        now: DateTime<Utc>,
    ) -> SocialResult<PostNode> {
        if text.trim().is_empty() {
            return Err(SocialError::invalid("post text is required"));
        }
        let creator = self.require_user(actor).await?;

        let post = PostNode::new(actor, text, now);
        self.store.create_post(&post).await?;
        info!(post_id = %post.id, creator = %actor, "Post created");

        for edge in self.store.list_friend_edges(actor).await? {
            match self.store.get_user(edge.friend_id).await? {
                Some(friend) => notify_user(self.notifier.as_ref(), &friend, |address| {
                    NotificationIntent::new(
                        address,
                        NotificationKind::Post,
                        templates::post_title(&creator.name),
                        templates::post_body(&creator.name),
                    )
                    .with_request_id(post.id)
                }),
                None => warn!(friend_id = %edge.friend_id, "No friend found with id"),
            }
        }

        Ok(post)
    }

    /// The actor's own posts, or the feed of their friends' posts, newest first
    pub async fn list_posts(&self, actor: Uuid, kind: PostFeedKind) -> SocialResult<PostList> {
        let creators: Vec<UserNode> = match kind {
            PostFeedKind::Sent => vec![self.require_user(actor).await?],
            PostFeedKind::Feed => {
                let mut friends = Vec::new();
                for edge in self.store.list_friend_edges(actor).await? {
                    if let Some(friend) = self.store.get_user(edge.friend_id).await? {
                        friends.push(friend);
                    }
                }
                friends
            }
        };

        let per_creator = try_join_all(
            creators
                .iter()
                .map(|creator| self.store.list_posts_by_creator(creator.id)),
        )
        .await?;

        let mut posts: Vec<PostView> = creators
            .iter()
            .zip(per_creator)
            .flat_map(|(creator, created)| created.into_iter().map(move |post| view(post, creator)))
            .collect();
        posts.sort_by(|a, b| b.created_on.cmp(&a.created_on));

        Ok(PostList {
            count: posts.len(),
            posts,
        })
    }

    pub async fn get_post(&self, post_id: Uuid) -> SocialResult<PostView> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("post {}", post_id)))?;
        let creator = self.require_user(post.creator_id).await?;
        Ok(view(post, &creator))
    }

    async fn require_user(&self, id: Uuid) -> SocialResult<UserNode> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("user {}", id)))
    }
}

fn view(post: PostNode, creator: &UserNode) -> PostView {
    PostView {
        id: post.id,
        text: post.text,
        creator_id: creator.id,
        creator_name: creator.name.clone(),
        creator_img_url: creator.profile_img_url.clone(),
        created_on: post.created_on,
    }
}
