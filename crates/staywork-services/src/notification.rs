//! In-app and email notification delivery

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use staywork_core::models::{Notification, NotificationKind};
use staywork_core::AppResult;
use staywork_db::{NotificationStore, UserStore};
use uuid::Uuid;

use crate::email::EmailSender;

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    users: Arc<dyn UserStore>,
    email: Option<Arc<dyn EmailSender>>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        email: Option<Arc<dyn EmailSender>>,
    ) -> Self {
        Self {
            notifications,
            users,
            email,
        }
    }

    /// Persist an in-app notification and, when SMTP is configured, mirror it
    /// by email. Email failure is logged and never surfaced; the in-app row is
    /// the source of truth.
    #[tracing::instrument(skip(self, title, message, data), fields(user_id = %user_id, kind = ?kind))]
    pub async fn send(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
        data: HashMap<String, String>,
    ) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            message,
            is_read: false,
            data,
            created_at: Utc::now(),
        };
        self.notifications.insert(&notification).await?;

        if let Some(email) = &self.email {
            match self.users.get(user_id).await {
                Ok(user) => {
                    if let Err(e) = email
                        .send(&user.email, &notification.title, &notification.message)
                        .await
                    {
                        tracing::warn!(
                            error = %e,
                            user_id = %user_id,
                            "Failed to send notification email"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = %user_id,
                        "Failed to resolve user for notification email"
                    );
                }
            }
        }

        Ok(notification)
    }

    pub async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Notification>> {
        self.notifications.list(user_id, limit, offset).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.notifications.mark_read(id, user_id).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.notifications.mark_all_read(user_id).await
    }
}
