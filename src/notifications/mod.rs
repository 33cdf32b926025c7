//! Notification trigger boundary
//!
//! This module provides:
//! - `NotificationIntent`: immutable value emitted after a committed mutation
//! - `Notifier`: non-blocking sink the request engine hands intents to
//! - `NotificationQueue`: bounded channel drained by a single delivery worker
//! - `WebhookTransport` / `LogTransport`: delivery backends

mod queue;
mod transport;
mod types;

pub use queue::{NotificationQueue, NotificationWorker, DEFAULT_QUEUE_CAPACITY};
pub use transport::{LogTransport, PushTransport, WebhookTransport, ANDROID_CHANNEL_ID};
pub use types::{NoopNotifier, NotificationIntent, NotificationKind, Notifier};
