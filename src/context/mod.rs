//! Local/Remote Data Synchronizer
//!
//! `DataContext` memegang lima koleksi domain sebagai state in-memory dan
//! menjadi satu-satunya jalur mutasi. Setiap tulisan diarahkan ke remote
//! backend atau cache lokal sesuai flag `use_backend`, lalu koleksi
//! in-memory di-patch dan mirror cache dipersist. Tulisan pesimistis:
//! mutasi in-memory hanya terjadi setelah backend sukses.

pub mod seed;

mod activity;
mod auth;
mod notifications;
mod products;
mod reports;
mod transactions;
mod users;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::activity::ActivityLog;
use crate::models::notification::Notification;
use crate::models::product::Product;
use crate::models::transaction::Transaction;
use crate::models::user::{Role, SessionUser, User};
use crate::storage::{LocalCache, RemoteBackend};
use crate::{log_error, log_info, log_warn};

/// Status lifecycle synchronizer. Kegagalan load didegradasi ke data
/// contoh/koleksi kosong, jadi tidak ada state error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Loading,
    Ready,
}

/// Synchronizer data lokal/remote. Koleksi in-memory dimiliki eksklusif oleh
/// struct ini; komponen luar membaca lewat accessor dan memutasi lewat
/// operasinya.
pub struct DataContext {
    config: AppConfig,
    cache: Arc<dyn LocalCache>,
    remote: Option<Arc<dyn RemoteBackend>>,
    state: LifecycleState,
    session: Option<SessionUser>,

    products: Vec<Product>,
    users: Vec<User>,
    transactions: Vec<Transaction>,
    activity_logs: Vec<ActivityLog>,
    notifications: Vec<Notification>,
}

impl DataContext {
    /// Buat synchronizer baru dalam state `Loading`. Mode remote butuh
    /// `remote` terisi; tanpa itu operasi jatuh ke mode lokal.
    pub fn new(
        config: AppConfig,
        cache: Arc<dyn LocalCache>,
        remote: Option<Arc<dyn RemoteBackend>>,
    ) -> Self {
        if config.features.use_backend && remote.is_none() {
            log_warn!("SYNC", "USE_BACKEND aktif tanpa remote backend; memakai mode lokal");
        }

        Self {
            config,
            cache,
            remote,
            state: LifecycleState::Loading,
            session: None,
            products: Vec::new(),
            users: Vec::new(),
            transactions: Vec::new(),
            activity_logs: Vec::new(),
            notifications: Vec::new(),
        }
    }

    // ---------- ACCESSORS ----------

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn activity_logs(&self) -> &[ActivityLog] {
        &self.activity_logs
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ---------- LOAD DATA ----------

    /// Muat (atau muat ulang) semua koleksi. Mode remote: lima fetch
    /// konkuren, fallback per koleksi. Mode lokal: baca cache, seed data
    /// contoh saat key belum ada. Selalu berakhir `Ready`.
    pub async fn load_all(&mut self) {
        if self.remote().is_some() {
            self.load_remote().await;
        } else {
            self.load_local().await;
        }

        self.session = self.read_session().await;
        self.state = LifecycleState::Ready;

        log_info!(
            "SYNC",
            "Collections loaded",
            serde_json::json!({
                "products": self.products.len(),
                "users": self.users.len(),
                "transactions": self.transactions.len(),
            })
        );
    }

    async fn load_remote(&mut self) {
        let remote = match self.remote() {
            Some(remote) => remote,
            None => return,
        };

        let (products, users, transactions, logs, notifications) = tokio::join!(
            remote.select_all("products"),
            remote.select_all("users"),
            remote.select_all("transactions"),
            remote.select_all("activity_logs"),
            remote.select_all("notifications"),
        );

        self.products = rows_or(products, seed::sample_products, "products");
        self.users = rows_or(users, seed::sample_users, "users");
        self.transactions = rows_or(transactions, Vec::new, "transactions");
        self.activity_logs = rows_or(logs, Vec::new, "activity_logs");
        self.notifications = rows_or(notifications, Vec::new, "notifications");
    }

    async fn load_local(&mut self) {
        let keys = self.config.storage.keys.clone();
        self.products = self.local_collection(&keys.products, seed::sample_products, true).await;
        self.users = self.local_collection(&keys.users, seed::sample_users, true).await;
        self.transactions = self.local_collection(&keys.transactions, Vec::new, false).await;
        self.activity_logs = self.local_collection(&keys.activity_logs, Vec::new, false).await;
        self.notifications = self.local_collection(&keys.notifications, Vec::new, false).await;
    }

    /// Baca satu koleksi dari cache. Key absen atau nilai korup diperlakukan
    /// sebagai "tidak ada data"; seed hanya ditulis saat key benar-benar
    /// belum ada.
    async fn local_collection<T: DeserializeOwned + Serialize>(
        &self,
        key: &str,
        fallback: impl FnOnce() -> Vec<T>,
        seed_if_missing: bool,
    ) -> Vec<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(_) => {
                    log_warn!("CACHE", &format!("Nilai cache {} korup, memakai fallback", key));
                    fallback()
                }
            },
            Ok(None) => {
                let items = fallback();
                if seed_if_missing {
                    if let Ok(json) = serde_json::to_string(&items) {
                        if let Err(e) = self.cache.set(key, &json).await {
                            log_error!("CACHE", "Gagal menulis seed", e.to_string());
                        }
                    }
                }
                items
            }
            Err(e) => {
                log_error!("CACHE", &format!("Gagal membaca cache {}", key), e.to_string());
                fallback()
            }
        }
    }

    async fn read_session(&self) -> Option<SessionUser> {
        match self.cache.get(&self.config.storage.keys.user).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            _ => None,
        }
    }

    // ---------- INTERNAL HELPERS ----------

    /// Backend aktif, atau `None` di mode lokal.
    pub(crate) fn remote(&self) -> Option<&dyn RemoteBackend> {
        if self.config.features.use_backend {
            self.remote.as_deref()
        } else {
            None
        }
    }

    /// Persist mirror satu koleksi ke cache (dilakukan di kedua mode).
    async fn persist<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), AppError> {
        let json = serde_json::to_string(items)?;
        self.cache.set(key, &json).await
    }

    pub(crate) async fn persist_products(&self) -> Result<(), AppError> {
        self.persist(&self.config.storage.keys.products, &self.products).await
    }

    pub(crate) async fn persist_users(&self) -> Result<(), AppError> {
        self.persist(&self.config.storage.keys.users, &self.users).await
    }

    pub(crate) async fn persist_transactions(&self) -> Result<(), AppError> {
        self.persist(&self.config.storage.keys.transactions, &self.transactions).await
    }

    pub(crate) async fn persist_activity_logs(&self) -> Result<(), AppError> {
        self.persist(&self.config.storage.keys.activity_logs, &self.activity_logs).await
    }

    pub(crate) async fn persist_notifications(&self) -> Result<(), AppError> {
        self.persist(&self.config.storage.keys.notifications, &self.notifications).await
    }

    /// Actor untuk entri aktivitas: sesi aktif, atau "system".
    pub(crate) fn actor(&self) -> (String, Role) {
        match &self.session {
            Some(session) => (session.username.clone(), session.role),
            None => ("system".to_string(), Role::Admin),
        }
    }
}

/// Id untuk record yang dibuat di mode lokal (turunan timestamp, meniru
/// perangkat tanpa backend penghasil id).
pub(crate) fn local_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Deserialize hasil fetch; error fetch maupun parse jatuh ke fallback.
fn rows_or<T: DeserializeOwned>(
    result: Result<Vec<Value>, AppError>,
    fallback: impl FnOnce() -> Vec<T>,
    collection: &'static str,
) -> Vec<T> {
    let parsed = result.and_then(|rows| {
        rows.into_iter()
            .map(|row| serde_json::from_value::<T>(row).map_err(AppError::from))
            .collect::<Result<Vec<T>, AppError>>()
    });

    match parsed {
        Ok(items) => items,
        Err(e) => {
            log_error!(
                "SYNC",
                &format!("Gagal memuat koleksi {}, memakai fallback", collection),
                e.to_string()
            );
            fallback()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{local_context, remote_context};
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn load_all_seeds_local_cache_exactly_once() {
        let (mut ctx, cache) = local_context();

        ctx.load_all().await;
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.products().len(), 2);
        assert_eq!(ctx.users().len(), 2);

        let first_products = ctx.products().to_vec();
        let first_users = ctx.users().to_vec();

        // Load kedua membaca seed dari cache, tanpa menulis ulang
        ctx.load_all().await;
        assert_eq!(ctx.products(), first_products.as_slice());
        assert_eq!(ctx.users(), first_users.as_slice());
        assert_eq!(cache.write_count("products").await, 1);
        assert_eq!(cache.write_count("users").await, 1);
        assert_eq!(cache.write_count("transactions").await, 0);
    }

    #[tokio::test]
    async fn corrupt_cache_entry_falls_back_without_reseeding() {
        let (mut ctx, cache) = local_context();
        cache.preload("products", "{ not json").await;

        ctx.load_all().await;
        assert_eq!(ctx.products().len(), 2);
        // Nilai korup bukan "key absen", jadi tidak ada seed yang ditulis
        assert_eq!(cache.write_count("products").await, 0);
    }

    #[tokio::test]
    async fn remote_load_failure_degrades_to_samples() {
        let (mut ctx, _cache, backend) = remote_context();
        backend.fail_reads.store(true, Ordering::SeqCst);

        ctx.load_all().await;
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.products().len(), 2);
        assert_eq!(ctx.users().len(), 2);
        assert!(ctx.transactions().is_empty());
        assert!(ctx.notifications().is_empty());
    }

    #[tokio::test]
    async fn session_record_is_restored_from_cache() {
        let (mut ctx, cache) = local_context();
        cache
            .preload("user", r#"{"username":"admin","role":"admin"}"#)
            .await;

        ctx.load_all().await;
        let session = ctx.current_user().expect("session restored");
        assert_eq!(session.username, "admin");
        assert_eq!(session.role, Role::Admin);
    }
}
