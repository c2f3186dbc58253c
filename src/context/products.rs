use chrono::Utc;
use serde_json::json;

use super::{local_id, DataContext};
use crate::errors::AppError;
use crate::log_info;
use crate::models::activity::ActivityKind;
use crate::models::product::{NewProduct, Product, ProductPatch};
use crate::validation;

impl DataContext {
    /// Tambah produk baru.
    pub async fn add_product(&mut self, payload: NewProduct) -> Result<Product, AppError> {
        validation::validate_product_name(&payload.name).map_err(AppError::Validation)?;
        validation::validate_price(payload.price).map_err(AppError::Validation)?;
        validation::validate_quantity(payload.stock).map_err(AppError::Validation)?;

        let product: Product = if let Some(remote) = self.remote() {
            let row = remote
                .insert(
                    "products",
                    json!({
                        "name": payload.name,
                        "price": payload.price,
                        "stock": payload.stock,
                        "image": payload.image,
                        "category": payload.category,
                    }),
                )
                .await?;
            serde_json::from_value(row)?
        } else {
            let now = Utc::now();
            Product {
                id: local_id(),
                name: payload.name,
                price: payload.price,
                stock: payload.stock,
                image: payload.image,
                category: payload.category,
                created_at: now,
                updated_at: now,
            }
        };

        self.products.push(product.clone());
        self.persist_products().await?;

        let (actor_id, actor_role) = self.actor();
        self.record_activity(
            format!("Produk {} ditambahkan", product.name),
            actor_id,
            actor_role,
            ActivityKind::Inventory,
            None,
        )
        .await;

        log_info!(
            "INVENTORY",
            "Product created",
            json!({ "id": product.id, "name": product.name })
        );
        Ok(product)
    }

    /// Update sebagian field produk. Id yang tidak ada bukan error: tidak
    /// ada yang berubah dan hasilnya `None`.
    pub async fn update_product(
        &mut self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Option<Product>, AppError> {
        if let Some(name) = &patch.name {
            validation::validate_product_name(name).map_err(AppError::Validation)?;
        }
        if let Some(price) = patch.price {
            validation::validate_price(price).map_err(AppError::Validation)?;
        }

        let position = match self.products.iter().position(|p| p.id == id) {
            Some(position) => position,
            None => return Ok(None),
        };

        if let Some(remote) = self.remote() {
            let body = serde_json::to_value(&patch)?;
            remote.update_by_id("products", id, body).await?;
        }

        patch.apply(&mut self.products[position]);
        let updated = self.products[position].clone();
        self.persist_products().await?;

        Ok(Some(updated))
    }

    /// Hapus produk. Menghapus id yang tidak ada bukan error.
    pub async fn delete_product(&mut self, id: &str) -> Result<bool, AppError> {
        if let Some(remote) = self.remote() {
            remote.delete_by_id("products", id).await?;
        }

        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        let removed = self.products.len() < before;
        self.persist_products().await?;

        if removed {
            let (actor_id, actor_role) = self.actor();
            self.record_activity(
                format!("Produk {} dihapus", id),
                actor_id,
                actor_role,
                ActivityKind::Inventory,
                None,
            )
            .await;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{local_context, remote_context};
    use super::*;
    use crate::models::product::Product;
    use std::sync::atomic::Ordering;

    fn new_product(name: &str, price: f64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            stock,
            image: None,
            category: "Coffee".to_string(),
        }
    }

    #[tokio::test]
    async fn create_roundtrips_through_list_and_cache_mirror() {
        let (mut ctx, cache) = local_context();
        ctx.load_all().await;

        let created = ctx.add_product(new_product("Cappuccino", 110.0, 8)).await.unwrap();
        assert!(!created.id.is_empty());

        let listed = ctx
            .products()
            .iter()
            .find(|p| p.id == created.id)
            .expect("created product listed");
        assert_eq!(listed.name, "Cappuccino");
        assert_eq!(listed.price, 110.0);
        assert_eq!(listed.stock, 8);

        // Mirror cache harus deserialize kembali ke koleksi yang sama
        let raw = cache.get("products").await.unwrap().unwrap();
        let mirrored: Vec<Product> = serde_json::from_str(&raw).unwrap();
        assert_eq!(mirrored, ctx.products());
    }

    #[tokio::test]
    async fn failed_remote_create_leaves_state_untouched() {
        let (mut ctx, _cache, backend) = remote_context();
        ctx.load_all().await;
        let before = ctx.products().len();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let result = ctx.add_product(new_product("Mocha", 130.0, 5)).await;

        assert!(result.is_err());
        assert_eq!(ctx.products().len(), before);
    }

    #[tokio::test]
    async fn remote_create_uses_backend_assigned_id() {
        let (mut ctx, _cache, backend) = remote_context();
        ctx.load_all().await;

        let created = ctx.add_product(new_product("Americano", 90.0, 12)).await.unwrap();
        assert_eq!(created.id, "1"); // counter id dari backend, bukan timestamp
        assert_eq!(backend.rows("products").await.len(), 1);
    }

    #[tokio::test]
    async fn update_missing_id_is_silent_noop() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;
        let before = ctx.products().to_vec();

        let patch = ProductPatch { price: Some(999.0), ..Default::default() };
        let result = ctx.update_product("tidak-ada", patch).await.unwrap();

        assert!(result.is_none());
        assert_eq!(ctx.products(), before.as_slice());
    }

    #[tokio::test]
    async fn update_merges_partial_fields() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        let updated = ctx
            .update_product("1", ProductPatch { stock: Some(4), ..Default::default() })
            .await
            .unwrap()
            .expect("seed product exists");

        assert_eq!(updated.stock, 4);
        assert_eq!(updated.name, "Latte");
    }

    #[tokio::test]
    async fn delete_reports_removal_flag() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        assert!(ctx.delete_product("1").await.unwrap());
        assert!(!ctx.delete_product("1").await.unwrap());
        assert_eq!(ctx.products().len(), 1);
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_any_write() {
        let (mut ctx, cache) = local_context();
        ctx.load_all().await;

        let result = ctx.add_product(new_product("X", -5.0, 3)).await;
        assert!(result.is_err());
        assert_eq!(cache.write_count("products").await, 1); // hanya seed awal
    }
}
