use chrono::Utc;
use serde_json::json;

use super::{local_id, DataContext};
use crate::errors::AppError;
use crate::models::notification::{Notification, NotificationKind};

impl DataContext {
    /// Tambah notifikasi baru. Terbaru di depan; feed dipangkas ke
    /// `notifications.max_notifications`.
    pub async fn add_notification(
        &mut self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification, AppError> {
        let notification: Notification = if let Some(remote) = self.remote() {
            let row = remote
                .insert(
                    "notifications",
                    json!({
                        "title": title,
                        "message": message,
                        "type": kind,
                        "read": false,
                    }),
                )
                .await?;
            serde_json::from_value(row)?
        } else {
            Notification {
                id: local_id(),
                title: title.to_string(),
                message: message.to_string(),
                kind,
                read: false,
                created_at: Utc::now(),
            }
        };

        self.notifications.insert(0, notification.clone());
        self.notifications.truncate(self.config.notifications.max_notifications);
        self.persist_notifications().await?;

        Ok(notification)
    }

    /// Tandai satu notifikasi sudah dibaca. Id tidak ada → `false`.
    pub async fn mark_notification_read(&mut self, id: &str) -> Result<bool, AppError> {
        let position = match self.notifications.iter().position(|n| n.id == id) {
            Some(position) => position,
            None => return Ok(false),
        };

        if let Some(remote) = self.remote() {
            remote
                .update_by_id("notifications", id, json!({ "read": true }))
                .await?;
        }

        self.notifications[position].read = true;
        self.persist_notifications().await?;
        Ok(true)
    }

    /// Tandai semua notifikasi sudah dibaca.
    pub async fn mark_all_notifications_read(&mut self) -> Result<(), AppError> {
        if let Some(remote) = self.remote() {
            remote
                .update_where("notifications", "read", "false", json!({ "read": true }))
                .await?;
        }

        for notification in &mut self.notifications {
            notification.read = true;
        }
        self.persist_notifications().await?;
        Ok(())
    }

    /// Jumlah notifikasi belum dibaca, dihitung murni dari state in-memory.
    pub fn unread_notification_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}
