//! On-device key-value cache
//!
//! Values are JSON-serialized collections, one key per collection plus the
//! session record. Backed by SQLite so the mirror survives process restarts.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::config::StorageConfig;
use crate::errors::AppError;

/// Key-value store collaborator. Nilai adalah string JSON.
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Cache SQLite dengan connection pooling.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Inisialisasi database cache di direktori yang diberikan (biasanya
    /// AppData).
    ///
    /// Features:
    /// - WAL mode untuk concurrent reads/writes
    /// - Foreign keys enforcement
    /// - Busy timeout untuk handle concurrent access
    pub async fn init(app_data_dir: &Path, config: &StorageConfig) -> Result<Self, AppError> {
        std::fs::create_dir_all(app_data_dir)
            .map_err(|e| AppError::Internal(format!("Gagal membuat direktori data: {}", e)))?;

        let db_path = app_data_dir.join(&config.path);
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Health check. Ok(()) bila database reachable.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// Skema cache: satu tabel key-value.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: kv_store
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key        TEXT     PRIMARY KEY,
            value      TEXT     NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl LocalCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    async fn open_cache(dir: &Path) -> SqliteCache {
        let config = AppConfig::default();
        SqliteCache::init(dir, &config.storage).await.unwrap()
    }

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_cache(dir.path()).await;

        assert_eq!(cache.get("products").await.unwrap(), None);

        cache.set("products", r#"[{"id":"1"}]"#).await.unwrap();
        assert_eq!(
            cache.get("products").await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        cache.set("products", "[]").await.unwrap();
        assert_eq!(cache.get("products").await.unwrap().as_deref(), Some("[]"));

        cache.remove("products").await.unwrap();
        assert_eq!(cache.get("products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = open_cache(dir.path()).await;
            cache.set("user", r#"{"username":"admin","role":"admin"}"#).await.unwrap();
        }

        let cache = open_cache(dir.path()).await;
        cache.health_check().await.unwrap();
        assert!(cache.get("user").await.unwrap().is_some());
    }
}
