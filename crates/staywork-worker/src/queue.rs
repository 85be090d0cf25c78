//! Notification queue: bounded channel, worker pool, non-blocking submission.
//!
//! Shutdown: [`NotificationQueue::shutdown`] signals the pool to stop; it does
//! not wait for in-flight deliveries. Messages still in the channel at
//! shutdown are dropped.

use std::sync::Arc;

use staywork_core::NotificationQueueConfig;
use staywork_db::HostStore;
use staywork_services::{HostNotification, NotificationDispatch, NotificationService};
use tokio::sync::{mpsc, Semaphore};

pub struct NotificationQueue {
    tx: mpsc::Sender<HostNotification>,
    shutdown_tx: mpsc::Sender<()>,
}

impl NotificationQueue {
    /// Create the queue and spawn its worker pool. The pool's lifetime is
    /// owned by the queue, independent of any request.
    pub fn new(
        config: NotificationQueueConfig,
        hosts: Arc<dyn HostStore>,
        notifications: NotificationService,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let max_workers = config.max_workers.max(1);
        tokio::spawn(async move {
            Self::worker_pool(rx, shutdown_rx, max_workers, hosts, notifications).await;
        });

        Self { tx, shutdown_tx }
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<HostNotification>,
        mut shutdown_rx: mpsc::Receiver<()>,
        max_workers: usize,
        hosts: Arc<dyn HostStore>,
        notifications: NotificationService,
    ) {
        tracing::info!(max_workers = max_workers, "Notification worker pool started");
        let semaphore = Arc::new(Semaphore::new(max_workers));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Notification worker pool shutting down");
                    break;
                }
                message = rx.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let hosts = hosts.clone();
                    let notifications = notifications.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        Self::deliver(message, hosts, notifications).await;
                    });
                }
            }
        }

        tracing::info!("Notification worker pool stopped");
    }

    /// Resolve the host's owning user and deliver. All failures end here as
    /// log records.
    async fn deliver(
        message: HostNotification,
        hosts: Arc<dyn HostStore>,
        notifications: NotificationService,
    ) {
        let host = match hosts.get(message.host_id).await {
            Ok(host) => host,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    host_id = %message.host_id,
                    "Dropping notification, host could not be resolved"
                );
                return;
            }
        };

        if let Err(e) = notifications
            .send(
                host.user_id,
                message.kind,
                message.title,
                message.message,
                message.data,
            )
            .await
        {
            tracing::warn!(
                error = %e,
                host_id = %host.id,
                user_id = %host.user_id,
                "Notification delivery failed"
            );
        }
    }

    /// Signals the worker pool to stop. Returns immediately; in-flight
    /// deliveries finish on their own.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating notification queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl NotificationDispatch for NotificationQueue {
    fn enqueue(&self, notification: HostNotification) {
        if let Err(e) = self.tx.try_send(notification) {
            // Fire-and-forget: a full or stopped queue drops the message.
            tracing::warn!(error = %e, "Notification queue full or stopped, dropping message");
        }
    }
}

impl Clone for NotificationQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use staywork_core::models::{Host, Notification, NotificationKind, User};
    use staywork_core::{AppError, AppResult};
    use staywork_db::{NotificationStore, UserStore};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    struct OneHostStore {
        host: Host,
    }

    #[async_trait]
    impl HostStore for OneHostStore {
        async fn get(&self, id: Uuid) -> AppResult<Host> {
            if id == self.host.id {
                Ok(self.host.clone())
            } else {
                Err(AppError::NotFound("host not found".to_string()))
            }
        }
    }

    struct OneUserStore {
        user: User,
    }

    #[async_trait]
    impl UserStore for OneUserStore {
        async fn get(&self, id: Uuid) -> AppResult<User> {
            if id == self.user.id {
                Ok(self.user.clone())
            } else {
                Err(AppError::NotFound("user not found".to_string()))
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotificationStore {
        rows: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationStore for RecordingNotificationStore {
        async fn insert(&self, notification: &Notification) -> AppResult<()> {
            self.rows.lock().unwrap().push(notification.clone());
            Ok(())
        }

        async fn list(
            &self,
            user_id: Uuid,
            _limit: i64,
            _offset: i64,
        ) -> AppResult<Vec<Notification>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn mark_read(&self, _id: Uuid, _user_id: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn mark_all_read(&self, _user_id: Uuid) -> AppResult<u64> {
            Ok(0)
        }
    }

    fn fixtures() -> (Host, User) {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "host@example.com".to_string(),
            name: "Host Owner".to_string(),
            created_at: now,
        };
        let host = Host {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: "Ferme du Lac".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        (host, user)
    }

    fn message_for(host_id: Uuid) -> HostNotification {
        HostNotification {
            host_id,
            kind: NotificationKind::ApplicationCreated,
            title: "New application".to_string(),
            message: "Someone applied".to_string(),
            data: HashMap::new(),
        }
    }

    async fn wait_for<F: Fn() -> bool>(predicate: F) -> bool {
        for _ in 0..100 {
            if predicate() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn delivers_to_the_hosts_owning_user() {
        let (host, user) = fixtures();
        let store = Arc::new(RecordingNotificationStore::default());
        let notifications = NotificationService::new(
            store.clone(),
            Arc::new(OneUserStore { user: user.clone() }),
            None,
        );
        let queue = NotificationQueue::new(
            NotificationQueueConfig::default(),
            Arc::new(OneHostStore { host: host.clone() }),
            notifications,
        );

        queue.enqueue(message_for(host.id));

        let delivered = wait_for(|| !store.rows.lock().unwrap().is_empty()).await;
        assert!(delivered, "notification was not delivered in time");
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[0].user_id, user.id);
        assert_eq!(rows[0].kind, NotificationKind::ApplicationCreated);
    }

    #[tokio::test]
    async fn unknown_host_is_dropped_silently() {
        let (host, user) = fixtures();
        let store = Arc::new(RecordingNotificationStore::default());
        let notifications = NotificationService::new(
            store.clone(),
            Arc::new(OneUserStore { user }),
            None,
        );
        let queue = NotificationQueue::new(
            NotificationQueueConfig::default(),
            Arc::new(OneHostStore { host }),
            notifications,
        );

        queue.enqueue(message_for(Uuid::new_v4()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enqueue_never_blocks_when_full() {
        let (host, user) = fixtures();
        let store = Arc::new(RecordingNotificationStore::default());
        let notifications = NotificationService::new(
            store.clone(),
            Arc::new(OneUserStore { user }),
            None,
        );
        let queue = NotificationQueue::new(
            NotificationQueueConfig {
                capacity: 1,
                max_workers: 1,
            },
            Arc::new(OneHostStore { host: host.clone() }),
            notifications,
        );

        // Overfill well past capacity; excess messages are dropped, the caller
        // is never blocked.
        for _ in 0..50 {
            queue.enqueue(message_for(host.id));
        }

        let delivered = wait_for(|| !store.rows.lock().unwrap().is_empty()).await;
        assert!(delivered);
    }

    #[tokio::test]
    async fn enqueue_after_shutdown_is_a_no_op() {
        let (host, user) = fixtures();
        let store = Arc::new(RecordingNotificationStore::default());
        let notifications = NotificationService::new(
            store.clone(),
            Arc::new(OneUserStore { user }),
            None,
        );
        let queue = NotificationQueue::new(
            NotificationQueueConfig::default(),
            Arc::new(OneHostStore { host: host.clone() }),
            notifications,
        );

        queue.shutdown().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.enqueue(message_for(host.id));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.rows.lock().unwrap().is_empty());
    }
}
