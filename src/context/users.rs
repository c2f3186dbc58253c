use chrono::Utc;
use serde_json::json;

use super::{local_id, DataContext};
use crate::errors::AppError;
use crate::log_info;
use crate::models::activity::ActivityKind;
use crate::models::user::{NewUser, User, UserPatch};
use crate::validation;

impl DataContext {
    /// Tambah akun baru. Username harus unik di himpunan user aktif.
    pub async fn add_user(&mut self, payload: NewUser) -> Result<User, AppError> {
        validation::validate_username(&payload.username).map_err(AppError::Validation)?;
        validation::validate_password(&payload.password).map_err(AppError::Validation)?;
        if let Some(email) = &payload.email {
            validation::validate_email(email).map_err(AppError::Validation)?;
        }

        if self.users.iter().any(|u| u.username == payload.username) {
            return Err(AppError::Validation("Username sudah digunakan".into()));
        }

        let user: User = if let Some(remote) = self.remote() {
            let row = remote
                .insert(
                    "users",
                    json!({
                        "username": payload.username,
                        "password": payload.password,
                        "role": payload.role,
                        "email": payload.email,
                    }),
                )
                .await?;
            serde_json::from_value(row)?
        } else {
            User {
                id: local_id(),
                username: payload.username,
                password: payload.password,
                role: payload.role,
                email: payload.email,
                created_at: Utc::now(),
            }
        };

        self.users.push(user.clone());
        self.persist_users().await?;

        let (actor_id, actor_role) = self.actor();
        self.record_activity(
            format!("User {} ({}) ditambahkan", user.username, user.role.as_str()),
            actor_id,
            actor_role,
            ActivityKind::UserManagement,
            None,
        )
        .await;

        log_info!(
            "USERS",
            "User created",
            json!({ "id": user.id, "username": user.username, "role": user.role.as_str() })
        );
        Ok(user)
    }

    /// Update sebagian field user. Id yang tidak ada → no-op, `None`.
    pub async fn update_user(
        &mut self,
        id: &str,
        patch: UserPatch,
    ) -> Result<Option<User>, AppError> {
        if let Some(username) = &patch.username {
            validation::validate_username(username).map_err(AppError::Validation)?;
        }
        if let Some(password) = &patch.password {
            validation::validate_password(password).map_err(AppError::Validation)?;
        }
        if let Some(email) = &patch.email {
            validation::validate_email(email).map_err(AppError::Validation)?;
        }

        let position = match self.users.iter().position(|u| u.id == id) {
            Some(position) => position,
            None => return Ok(None),
        };

        if let Some(username) = &patch.username {
            let taken = self.users.iter().any(|u| u.id != id && &u.username == username);
            if taken {
                return Err(AppError::Validation("Username sudah digunakan".into()));
            }
        }

        if let Some(remote) = self.remote() {
            let body = serde_json::to_value(&patch)?;
            remote.update_by_id("users", id, body).await?;
        }

        patch.apply(&mut self.users[position]);
        let updated = self.users[position].clone();
        self.persist_users().await?;

        Ok(Some(updated))
    }

    /// Hapus akun. Akun milik sesi aktif tidak bisa dihapus.
    pub async fn delete_user(&mut self, id: &str) -> Result<bool, AppError> {
        if let (Some(session), Some(target)) =
            (&self.session, self.users.iter().find(|u| u.id == id))
        {
            if session.username == target.username {
                return Err(AppError::Validation("Tidak dapat menghapus akun sendiri".into()));
            }
        }

        if let Some(remote) = self.remote() {
            remote.delete_by_id("users", id).await?;
        }

        let removed_username = self.users.iter().find(|u| u.id == id).map(|u| u.username.clone());
        self.users.retain(|u| u.id != id);
        let removed = removed_username.is_some();
        self.persist_users().await?;

        if let Some(username) = removed_username {
            let (actor_id, actor_role) = self.actor();
            self.record_activity(
                format!("User {} dihapus", username),
                actor_id,
                actor_role,
                ActivityKind::UserManagement,
                None,
            )
            .await;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::local_context;
    use super::*;
    use crate::models::user::Role;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "rahasia1".to_string(),
            role,
            email: None,
        }
    }

    #[tokio::test]
    async fn add_user_rejects_duplicate_username() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        assert!(ctx.add_user(new_user("kasir2", Role::Staff)).await.is_ok());
        let duplicate = ctx.add_user(new_user("kasir2", Role::Staff)).await;
        assert!(duplicate.is_err());
        // Seed admin+staff plus satu akun baru
        assert_eq!(ctx.users().len(), 3);
    }

    #[tokio::test]
    async fn update_user_changes_only_given_fields() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        let patch = UserPatch {
            email: Some("staff@bymonday.coffee".to_string()),
            ..Default::default()
        };
        let updated = ctx.update_user("2", patch).await.unwrap().expect("seed user");

        assert_eq!(updated.username, "staff");
        assert_eq!(updated.email.as_deref(), Some("staff@bymonday.coffee"));
    }

    #[tokio::test]
    async fn cannot_delete_own_account() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;
        ctx.login("admin", "admin123").await.unwrap();

        assert!(ctx.delete_user("1").await.is_err());
        assert!(ctx.delete_user("2").await.unwrap());
        assert!(!ctx.delete_user("2").await.unwrap());
    }
}
