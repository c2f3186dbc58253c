//! In-memory collaborator fakes
//!
//! Drop-in `LocalCache`/`RemoteBackend` implementations without device
//! storage or network. Tests inject these to observe write counts and to
//! simulate backend failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

use super::cache::LocalCache;
use super::remote::RemoteBackend;
use crate::errors::AppError;

/// Cache key-value di memori, dengan penghitung penulisan per key.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, u64>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Berapa kali `set` dipanggil untuk key ini.
    pub async fn write_count(&self, key: &str) -> u64 {
        self.writes.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Isi key langsung tanpa menaikkan penghitung penulisan.
    pub async fn preload(&self, key: &str, value: &str) {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
        *self.writes.lock().await.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Tabular store di memori. Id di-assign dari counter, meniru backend yang
/// menentukan id sendiri.
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    /// Saat true, semua verb tulis mengembalikan error backend.
    pub fail_writes: AtomicBool,
    /// Saat true, semua verb baca mengembalikan error backend.
    pub fail_reads: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload rows ke sebuah tabel.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.lock().await.insert(table.to_string(), rows);
    }

    /// Snapshot isi tabel (untuk assertion).
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().await.get(table).cloned().unwrap_or_default()
    }

    fn check_read(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Backend("simulated read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Backend("simulated write failure".into()));
        }
        Ok(())
    }

    fn matches(row: &Value, column: &str, value: &str) -> bool {
        match row.get(column) {
            Some(Value::String(s)) => s == value,
            Some(other) => other.to_string() == value,
            None => false,
        }
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn select_all(&self, table: &str) -> Result<Vec<Value>, AppError> {
        self.check_read()?;
        Ok(self.rows(table).await)
    }

    async fn select_where(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>, AppError> {
        self.check_read()?;
        let rows = self.rows(table).await;
        Ok(rows
            .into_iter()
            .filter(|row| filters.iter().all(|(col, val)| Self::matches(row, col, val)))
            .collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        self.check_write()?;

        let mut row = row;
        if let Some(object) = row.as_object_mut() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            object.entry("id").or_insert(Value::String(id.to_string()));
            let now = Value::String(chrono::Utc::now().to_rfc3339());
            object.entry("created_at").or_insert(now.clone());
            object.entry("updated_at").or_insert(now);
        }

        let mut tables = self.tables.lock().await;
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, AppError> {
        self.check_write()?;

        let mut tables = self.tables.lock().await;
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return Ok(None),
        };

        for row in rows.iter_mut() {
            if Self::matches(row, "id", id) {
                merge_patch(row, &patch);
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn update_where(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<(), AppError> {
        self.check_write()?;

        let mut tables = self.tables.lock().await;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if Self::matches(row, column, value) {
                    merge_patch(row, &patch);
                }
            }
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> Result<(), AppError> {
        self.check_write()?;

        let mut tables = self.tables.lock().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !Self::matches(row, "id", id));
        }
        Ok(())
    }
}

fn merge_patch(row: &mut Value, patch: &Value) {
    if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}
