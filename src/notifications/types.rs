//! Notification intent types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a notification is about; serialised as the short `type` tag clients switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "fr")]
    FriendRequest,
    #[serde(rename = "ar")]
    AccessRequest,
    #[serde(rename = "post")]
    Post,
    #[serde(rename = "chat")]
    Chat,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "fr",
            NotificationKind::AccessRequest => "ar",
            NotificationKind::Post => "post",
            NotificationKind::Chat => "chat",
        }
    }
}

/// An immutable push notification handed off after a successful commit.
///
/// The core never waits for delivery; see [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    /// Device registration token of the recipient
    pub address: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    /// Id of the request or post the notification opens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Extra string fields merged into the data payload
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl NotificationIntent {
    pub fn new(
        address: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            title: title.into(),
            body: body.into(),
            kind,
            request_id: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_request_id(mut self, id: impl ToString) -> Self {
        self.request_id = Some(id.to_string());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flat string map delivered as the push data payload.
    ///
    /// Chat intents pass the caller's data through untouched; every other
    /// kind carries its `type` tag and the id under `requestId` (or `id` for posts).
    pub fn data(&self) -> BTreeMap<String, String> {
        let mut data = self.extra.clone();
        if self.kind == NotificationKind::Chat {
            return data;
        }
        data.insert("type".to_string(), self.kind.as_str().to_string());
        if let Some(id) = &self.request_id {
            let key = match self.kind {
                NotificationKind::Post => "id",
                _ => "requestId",
            };
            data.insert(key.to_string(), id.clone());
        }
        data
    }
}

/// Receiver of notification intents.
///
/// Implementations must return immediately: delivery happens elsewhere and
/// its failures are logged, never reported back to the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, intent: NotificationIntent);
}

/// Notifier that drops everything (used when notifications are disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, intent: NotificationIntent) {
        tracing::trace!(kind = intent.kind.as_str(), "Notification dropped (disabled)");
    }
}
