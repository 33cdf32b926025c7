//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating test objects with sensible defaults,
//! and helpers for building mock `AppState` / `SocialService` instances.
#![allow(dead_code)]

use crate::neo4j::mock::MockSocialStore;
use crate::neo4j::models::*;
use crate::notifications::{NotificationIntent, Notifier};
use crate::social::SocialService;
use crate::{AppState, AuthConfig, Config, SocialConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

static PHONE_SEQ: AtomicU32 = AtomicU32::new(1);

// ============================================================================
// Notifier
// ============================================================================

/// Notifier that keeps every intent in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationIntent>>,
}

impl RecordingNotifier {
    /// Drain the recorded intents
    pub fn take(&self) -> Vec<NotificationIntent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, intent: NotificationIntent) {
        self.sent.lock().unwrap().push(intent);
    }
}

// ============================================================================
// Entity factories
// ============================================================================

/// A user with a unique phone number, a random id code and a device token
pub fn test_user(name: &str) -> UserNode {
    let seq = PHONE_SEQ.fetch_add(1, Ordering::SeqCst);
    let mut user = UserNode::new(
        name,
        format!("+91900000{:04}", seq),
        &crate::social::generate_id_code(),
    );
    user.notification_address = Some(format!("token-{}-{}", name.to_lowercase(), seq));
    user.profile_img_url = Some(format!("https://img.example.com/{}.png", seq));
    user
}

pub fn test_card(id: CardId, name: &str) -> CardNode {
    CardNode {
        id,
        name: name.to_string(),
        tag_id: None,
        object_type: CardObjectType::Card,
    }
}

pub fn test_tag(id: CardId, name: &str) -> CardNode {
    CardNode {
        object_type: CardObjectType::Tag,
        ..test_card(id, name)
    }
}

// ============================================================================
// Mock state builders
// ============================================================================

pub const TEST_JWT_SECRET: &str = "test-secret-key-at-least-32-chars!!";

/// Auth config suitable for router tests
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiry_secs: 3600,
    }
}

pub fn test_config() -> Config {
    Config {
        neo4j_uri: "bolt://mock:7687".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "mock".to_string(),
        server_port: 0,
        auth_config: Some(test_auth_config()),
        push_gateway_url: None,
        notification_queue_capacity: 16,
        social: SocialConfig::default(),
    }
}

/// Mock AppState over the given store, recording notifications
pub fn mock_app_state_with(
    store: MockSocialStore,
    notifier: Arc<RecordingNotifier>,
) -> (AppState, Arc<MockSocialStore>) {
    let store = Arc::new(store);
    let config = test_config();
    let social = Arc::new(SocialService::new(
        store.clone(),
        notifier,
        config.social.clone(),
    ));
    (
        AppState {
            social,
            config: Arc::new(config),
        },
        store,
    )
}

/// Mock AppState with an empty store
pub fn mock_app_state() -> AppState {
    mock_app_state_with(
        MockSocialStore::new(),
        Arc::new(RecordingNotifier::default()),
    )
    .0
}
