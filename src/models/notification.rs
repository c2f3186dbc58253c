use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag jenis notifikasi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    Transaction,
    User,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LowStock => "low_stock",
            NotificationKind::Transaction => "transaction",
            NotificationKind::User => "user",
            NotificationKind::System => "system",
        }
    }
}

/// Notifikasi feed. Berdiri sendiri, tidak mereferensikan entitas lain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
