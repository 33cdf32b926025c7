//! Bounded hand-off queue between the request engine and push delivery
//!
//! `notify` never blocks: when the channel is full or the worker is gone the
//! intent is logged and dropped. A single worker task drains the channel and
//! calls the configured [`PushTransport`]; transport errors are isolated per
//! intent.

use super::transport::PushTransport;
use super::types::{NotificationIntent, Notifier};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default channel capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Sending half of the notification queue
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationIntent>,
}

/// Receiving half; run it on its own task with [`NotificationWorker::run`]
pub struct NotificationWorker {
    receiver: mpsc::Receiver<NotificationIntent>,
}

impl NotificationQueue {
    /// Create a queue and its (not yet running) worker
    pub fn new(capacity: usize) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, NotificationWorker { receiver })
    }

    /// Create a queue and spawn its worker on the current runtime
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use circles::notifications::*;
    /// # tokio_test::block_on(async {
    /// let (queue, worker) = NotificationQueue::spawn(Arc::new(LogTransport), 8);
    /// queue.notify(NotificationIntent::new("device-token", NotificationKind::Post, "t", "b"));
    /// drop(queue);
    /// worker.await.unwrap();
    /// # });
    /// ```
    pub fn spawn(transport: Arc<dyn PushTransport>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, worker) = Self::new(capacity);
        let handle = tokio::spawn(worker.run(transport));
        (queue, handle)
    }

    /// Number of intents waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, intent: NotificationIntent) {
        match self.sender.try_send(intent) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(intent)) => {
                warn!(
                    kind = intent.kind.as_str(),
                    request_id = ?intent.request_id,
                    "Notification queue full, dropping intent"
                );
            }
            Err(mpsc::error::TrySendError::Closed(intent)) => {
                warn!(
                    kind = intent.kind.as_str(),
                    request_id = ?intent.request_id,
                    "Notification worker stopped, dropping intent"
                );
            }
        }
    }
}

impl NotificationWorker {
    /// Deliver intents until every queue handle is dropped
    pub async fn run(mut self, transport: Arc<dyn PushTransport>) {
        debug!(transport = transport.name(), "Notification worker started");
        while let Some(intent) = self.receiver.recv().await {
            if let Err(e) = transport.send(&intent).await {
                warn!(
                    transport = transport.name(),
                    kind = intent.kind.as_str(),
                    request_id = ?intent.request_id,
                    "Failed to deliver notification: {}",
                    e
                );
            }
        }
        debug!("Notification worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlakyTransport {
        attempts: AtomicUsize,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushTransport for FlakyTransport {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn send(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
            // Every other attempt fails
            if self.attempts.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                anyhow::bail!("gateway unavailable");
            }
            self.delivered.lock().unwrap().push(intent.title.clone());
            Ok(())
        }
    }

    fn intent(title: &str) -> NotificationIntent {
        NotificationIntent::new("tok", NotificationKind::FriendRequest, title, "body")
    }

    #[tokio::test]
    async fn test_worker_survives_transport_errors() {
        let transport = Arc::new(FlakyTransport::default());
        let (queue, worker) = NotificationQueue::new(8);
        for title in ["a", "b", "c", "d"] {
            queue.notify(intent(title));
        }
        drop(queue);

        worker.run(transport.clone()).await;

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 4);
        assert_eq!(*transport.delivered.lock().unwrap(), vec!["b", "d"]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (queue, _worker) = NotificationQueue::new(2);
        queue.notify(intent("a"));
        queue.notify(intent("b"));
        queue.notify(intent("c"));
        assert_eq!(queue.pending(), 2);
    }

    #[tokio::test]
    async fn test_closed_queue_drops_without_panic() {
        let (queue, worker) = NotificationQueue::new(2);
        drop(worker);
        queue.notify(intent("a"));
    }

    #[tokio::test]
    async fn test_spawned_worker_delivers() {
        let transport = Arc::new(FlakyTransport::default());
        transport.attempts.store(1, Ordering::SeqCst);
        let (queue, handle) = NotificationQueue::spawn(transport.clone(), 4);
        queue.notify(intent("hello"));
        drop(queue);
        handle.await.unwrap();
        assert_eq!(*transport.delivered.lock().unwrap(), vec!["hello"]);
    }
}
