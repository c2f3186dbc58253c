use chrono::Utc;
use serde_json::json;

use super::{local_id, DataContext};
use crate::errors::AppError;
use crate::log_error;
use crate::models::activity::{ActivityKind, ActivityLog};
use crate::models::user::Role;

/// Jumlah maksimum entri log yang dipertahankan; yang terlama dibuang.
pub(crate) const MAX_ACTIVITY_LOGS: usize = 100;

impl DataContext {
    /// Tambah entri log aktivitas. Append-only, terbaru di depan.
    pub async fn add_activity_log(
        &mut self,
        action: &str,
        user_id: &str,
        user_role: Role,
        kind: ActivityKind,
        details: Option<String>,
    ) -> Result<ActivityLog, AppError> {
        let entry: ActivityLog = if let Some(remote) = self.remote() {
            let row = remote
                .insert(
                    "activity_logs",
                    json!({
                        "action": action,
                        "user_id": user_id,
                        "user_role": user_role,
                        "type": kind,
                        "details": details,
                    }),
                )
                .await?;
            serde_json::from_value(row)?
        } else {
            ActivityLog {
                id: local_id(),
                action: action.to_string(),
                user_id: user_id.to_string(),
                user_role,
                kind,
                details,
                created_at: Utc::now(),
            }
        };

        self.activity_logs.insert(0, entry.clone());
        self.activity_logs.truncate(MAX_ACTIVITY_LOGS);
        self.persist_activity_logs().await?;

        Ok(entry)
    }

    /// Catat aktivitas tanpa menggagalkan operasi pemanggil. Dipakai oleh
    /// jalur mutasi lain; kegagalan hanya dilog.
    pub(crate) async fn record_activity(
        &mut self,
        action: String,
        user_id: String,
        user_role: Role,
        kind: ActivityKind,
        details: Option<String>,
    ) {
        if !self.config.features.enable_activity_logs {
            return;
        }

        if let Err(e) = self
            .add_activity_log(&action, &user_id, user_role, kind, details)
            .await
        {
            log_error!("ACTIVITY", "Gagal mencatat aktivitas", e.to_string());
        }
    }
}
