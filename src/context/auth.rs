use serde_json::json;

use super::DataContext;
use crate::errors::AppError;
use crate::models::activity::ActivityKind;
use crate::models::user::{SessionUser, User};
use crate::{log_error, log_info};

impl DataContext {
    /// Login dengan lookup username/password di tabel user. Pencocokan
    /// plaintext — placeholder, bukan desain keamanan untuk ditiru; sistem
    /// nyata butuh salted password hashing.
    ///
    /// Kredensial salah menghasilkan `Ok(None)`, bukan error. Di mode
    /// remote, kegagalan backend juga didegradasi ke `Ok(None)`.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<SessionUser>, AppError> {
        let found: Option<User> = if let Some(remote) = self.remote() {
            match remote
                .select_where("users", &[("username", username), ("password", password)])
                .await
            {
                Ok(rows) => rows.into_iter().next().and_then(|row| serde_json::from_value(row).ok()),
                Err(e) => {
                    log_error!("AUTH", "Login lookup failed", e.to_string());
                    return Ok(None);
                }
            }
        } else {
            self.users
                .iter()
                .find(|u| u.username == username && u.password == password)
                .cloned()
        };

        let user = match found {
            Some(user) => user,
            None => {
                log_info!("AUTH", "Login failed", json!({ "username": username }));
                return Ok(None);
            }
        };

        let session = SessionUser {
            username: user.username.clone(),
            role: user.role,
        };
        self.session = Some(session.clone());

        let raw = serde_json::to_string(&session)?;
        self.cache.set(&self.config.storage.keys.user, &raw).await?;

        self.record_activity(
            format!("User {} berhasil login", user.username),
            user.id.clone(),
            user.role,
            ActivityKind::Login,
            None,
        )
        .await;

        log_info!("AUTH", "Login successful", json!({ "username": user.username }));
        Ok(Some(session))
    }

    /// Logout — catat aktivitas lalu hapus record sesi.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        if let Some(session) = self.session.take() {
            let user_id = self
                .users
                .iter()
                .find(|u| u.username == session.username)
                .map(|u| u.id.clone())
                .unwrap_or_else(|| session.username.clone());

            self.record_activity(
                format!("User {} logout", session.username),
                user_id,
                session.role,
                ActivityKind::Logout,
                None,
            )
            .await;
        }

        self.cache.remove(&self.config.storage.keys.user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{local_context, remote_context};
    use super::*;
    use crate::models::user::Role;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn login_with_seeded_credentials() {
        let (mut ctx, cache) = local_context();
        ctx.load_all().await;

        let session = ctx.login("admin", "admin123").await.unwrap().expect("valid login");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(ctx.current_user().unwrap().username, "admin");

        // Record sesi dipersist ke cache key `user`
        let raw = cache.get("user").await.unwrap().unwrap();
        let stored: SessionUser = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, session);

        // Aktivitas login tercatat
        assert_eq!(ctx.activity_logs()[0].kind, ActivityKind::Login);
    }

    #[tokio::test]
    async fn bad_credentials_are_a_none_not_an_error() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        assert!(ctx.login("admin", "salah").await.unwrap().is_none());
        assert!(ctx.login("tidak-ada", "admin123").await.unwrap().is_none());
        assert!(ctx.current_user().is_none());
    }

    #[tokio::test]
    async fn logout_clears_session_and_cache_key() {
        let (mut ctx, cache) = local_context();
        ctx.load_all().await;

        ctx.login("staff", "staff123").await.unwrap();
        ctx.logout().await.unwrap();

        assert!(ctx.current_user().is_none());
        assert!(cache.get("user").await.unwrap().is_none());
        assert_eq!(ctx.activity_logs()[0].kind, ActivityKind::Logout);
    }

    #[tokio::test]
    async fn remote_login_uses_equality_filter() {
        let (mut ctx, _cache, backend) = remote_context();
        backend
            .seed(
                "users",
                vec![serde_json::json!({
                    "id": "7",
                    "username": "admin",
                    "password": "admin123",
                    "role": "admin",
                    "email": null,
                    "created_at": "2026-08-01T09:00:00Z",
                })],
            )
            .await;
        ctx.load_all().await;

        let session = ctx.login("admin", "admin123").await.unwrap().expect("remote login");
        assert_eq!(session.role, Role::Admin);
        assert!(ctx.login("admin", "salah").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remote_outage_degrades_to_failed_login() {
        let (mut ctx, _cache, backend) = remote_context();
        ctx.load_all().await;

        backend.fail_reads.store(true, Ordering::SeqCst);
        assert!(ctx.login("admin", "admin123").await.unwrap().is_none());
    }
}
