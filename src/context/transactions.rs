use chrono::Utc;
use serde_json::json;

use super::{local_id, DataContext};
use crate::errors::AppError;
use crate::models::activity::ActivityKind;
use crate::models::notification::NotificationKind;
use crate::models::product::ProductPatch;
use crate::models::transaction::{LineItem, Transaction};
use crate::models::user::Role;
use crate::validation;
use crate::{log_error, log_info};

impl DataContext {
    /// Catat transaksi penjualan dari keranjang checkout.
    ///
    /// Total dihitung dari line item yang diberikan pemanggil; tidak ada
    /// pencocokan harga terhadap produk live. Pengurangan stok per item
    /// berjalan sekuensial tanpa batas transaksi; dua checkout bersamaan
    /// atas produk yang sama bisa saling menimpa (lost update), dan stok
    /// bisa menjadi negatif.
    pub async fn record_transaction(
        &mut self,
        items: Vec<LineItem>,
        payment_method: &str,
        user_id: &str,
    ) -> Result<Transaction, AppError> {
        if items.is_empty() {
            return Err(AppError::Validation("Keranjang kosong".into()));
        }
        validation::validate_payment_method(payment_method).map_err(AppError::Validation)?;
        for item in &items {
            if item.quantity < 1 {
                return Err(AppError::Validation("Jumlah item minimal 1".into()));
            }
            validation::validate_price(item.price).map_err(AppError::Validation)?;
        }

        let total: f64 = items.iter().map(LineItem::subtotal).sum();

        let transaction: Transaction = if let Some(remote) = self.remote() {
            let row = remote
                .insert(
                    "transactions",
                    json!({
                        "items": items,
                        "total": total,
                        "payment_method": payment_method,
                        "user_id": user_id,
                    }),
                )
                .await?;
            serde_json::from_value(row)?
        } else {
            Transaction {
                id: local_id(),
                items,
                total,
                payment_method: payment_method.to_string(),
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            }
        };

        self.transactions.push(transaction.clone());
        self.persist_transactions().await?;

        // Kurangi stok per line item
        let lines = transaction.items.clone();
        for line in &lines {
            let current = self
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|p| p.stock);

            if let Some(stock) = current {
                let patch = ProductPatch {
                    stock: Some(stock - line.quantity),
                    ..Default::default()
                };
                if let Err(e) = self.update_product(&line.product_id, patch).await {
                    log_error!("TRANSACTION", "Gagal mengurangi stok", e.to_string());
                }
            }
        }

        let operator_role = self
            .users
            .iter()
            .find(|u| u.id == user_id || u.username == user_id)
            .map(|u| u.role)
            .unwrap_or(Role::Staff);
        self.record_activity(
            format!(
                "Transaksi {} item, total {} ({})",
                transaction.items.len(),
                transaction.total,
                transaction.payment_method
            ),
            user_id.to_string(),
            operator_role,
            ActivityKind::Transaction,
            None,
        )
        .await;

        // Notifikasi stok menipis untuk produk yang baru terjual
        if self.config.features.enable_low_stock_alerts {
            self.emit_low_stock_alerts(&lines).await;
        }

        log_info!(
            "TRANSACTION",
            "Transaction recorded",
            json!({ "id": transaction.id, "total": transaction.total })
        );
        Ok(transaction)
    }

    async fn emit_low_stock_alerts(&mut self, lines: &[LineItem]) {
        let threshold = self.config.inventory.low_stock_threshold;

        let mut flagged: Vec<(String, i64)> = Vec::new();
        for line in lines {
            if flagged.iter().any(|(id, _)| id == &line.product_id) {
                continue;
            }
            if let Some(product) = self.products.iter().find(|p| p.id == line.product_id) {
                if product.stock <= threshold {
                    flagged.push((product.id.clone(), product.stock));
                }
            }
        }

        for (product_id, stock) in flagged {
            let name = self
                .products
                .iter()
                .find(|p| p.id == product_id)
                .map(|p| p.name.clone())
                .unwrap_or(product_id);

            let message = format!("Stok {} tersisa {}", name, stock);
            if let Err(e) = self
                .add_notification("Stok menipis", &message, NotificationKind::LowStock)
                .await
            {
                log_error!("TRANSACTION", "Gagal membuat notifikasi stok", e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::local_context;
    use super::*;
    use crate::models::notification::NotificationKind;

    fn line(product_id: &str, name: &str, price: f64, quantity: i64) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn total_is_sum_of_line_subtotals() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        let tx = ctx
            .record_transaction(
                vec![line("1", "Latte", 120.0, 2), line("2", "Espresso", 85.0, 1)],
                "Cash",
                "staff",
            )
            .await
            .unwrap();

        assert_eq!(tx.total, 325.0);
        assert_eq!(ctx.transactions().len(), 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        assert!(ctx.record_transaction(Vec::new(), "Cash", "staff").await.is_err());
        assert!(ctx.transactions().is_empty());
    }

    #[tokio::test]
    async fn stock_is_decremented_per_line() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        // Seed: Latte stock 15, Espresso stock 25
        ctx.record_transaction(
            vec![line("1", "Latte", 120.0, 3), line("2", "Espresso", 80.0, 5)],
            "GCash",
            "staff",
        )
        .await
        .unwrap();

        let latte = ctx.products().iter().find(|p| p.id == "1").unwrap();
        let espresso = ctx.products().iter().find(|p| p.id == "2").unwrap();
        assert_eq!(latte.stock, 12);
        assert_eq!(espresso.stock, 20);
    }

    #[tokio::test]
    async fn unknown_product_reference_is_tolerated() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        // Referensi produk yang tidak ada: transaksi tetap tercatat,
        // tidak ada stok yang berubah
        let tx = ctx
            .record_transaction(vec![line("999", "Hantu", 50.0, 1)], "Cash", "staff")
            .await
            .unwrap();

        assert_eq!(tx.total, 50.0);
        assert_eq!(ctx.products().iter().find(|p| p.id == "1").unwrap().stock, 15);
    }

    #[tokio::test]
    async fn crossing_low_stock_threshold_emits_notification() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        // Latte 15 → 8, di bawah ambang 10
        ctx.record_transaction(vec![line("1", "Latte", 120.0, 7)], "Cash", "staff")
            .await
            .unwrap();

        let alert = ctx
            .notifications()
            .iter()
            .find(|n| n.kind == NotificationKind::LowStock)
            .expect("low stock notification");
        assert!(alert.message.contains("Latte"));
        assert!(alert.message.contains('8'));

        // Espresso 25 → 20, masih di atas ambang: tidak ada notifikasi baru
        ctx.record_transaction(vec![line("2", "Espresso", 80.0, 5)], "Cash", "staff")
            .await
            .unwrap();
        let low_stock_count = ctx
            .notifications()
            .iter()
            .filter(|n| n.kind == NotificationKind::LowStock)
            .count();
        assert_eq!(low_stock_count, 1);
    }

    #[tokio::test]
    async fn sale_appends_activity_entry() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        ctx.record_transaction(vec![line("1", "Latte", 120.0, 1)], "Cash", "staff")
            .await
            .unwrap();

        let entry = &ctx.activity_logs()[0];
        assert_eq!(entry.kind, ActivityKind::Transaction);
        assert_eq!(entry.user_id, "staff");
        assert_eq!(entry.user_role, Role::Staff);
    }

    #[tokio::test]
    async fn stock_may_go_negative_without_error() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        ctx.record_transaction(vec![line("1", "Latte", 120.0, 20)], "Cash", "staff")
            .await
            .unwrap();

        // Batasan yang diterima: tidak ada pengecekan stok atomik
        assert_eq!(ctx.products().iter().find(|p| p.id == "1").unwrap().stock, -5);
    }
}
