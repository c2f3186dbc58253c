use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::Role;

/// Tag kasar jenis aktivitas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    Logout,
    Transaction,
    Inventory,
    UserManagement,
    System,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Login => "login",
            ActivityKind::Logout => "logout",
            ActivityKind::Transaction => "transaction",
            ActivityKind::Inventory => "inventory",
            ActivityKind::UserManagement => "user_management",
            ActivityKind::System => "system",
        }
    }
}

/// Entri jejak audit, append-only. Actor disalin denormalized (bukan foreign
/// key); terbaru disimpan di depan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub action: String,
    pub user_id: String,
    pub user_role: Role,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default)]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
