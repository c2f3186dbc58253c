use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;

use super::DataContext;
use crate::models::product::Product;
use crate::models::report::{DailySummary, PaymentBreakdown, ProductStat};
use crate::models::transaction::Transaction;

/// View turunan, dihitung murni dari koleksi in-memory. Tidak ada I/O.
impl DataContext {
    /// Total penjualan hari ini (tanggal kalender waktu lokal).
    pub fn todays_sales(&self) -> f64 {
        let today = Local::now().date_naive();
        self.transactions
            .iter()
            .filter(|t| local_date(t) == today)
            .map(|t| t.total)
            .sum()
    }

    /// Produk dengan stok di ambang restock, urut naik berdasarkan stok.
    pub fn low_stock_products(&self) -> Vec<&Product> {
        let threshold = self.config.inventory.low_stock_threshold;
        let mut flagged: Vec<&Product> =
            self.products.iter().filter(|p| p.stock <= threshold).collect();
        flagged.sort_by_key(|p| p.stock);
        flagged
    }

    /// Produk di ambang kritis. Hanya untuk tampilan; tidak memicu
    /// notifikasi.
    pub fn critical_stock_products(&self) -> Vec<&Product> {
        let threshold = self.config.inventory.critical_stock_threshold;
        let mut flagged: Vec<&Product> =
            self.products.iter().filter(|p| p.stock <= threshold).collect();
        flagged.sort_by_key(|p| p.stock);
        flagged
    }

    /// Ringkasan penjualan satu hari kalender.
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let day: Vec<&Transaction> =
            self.transactions.iter().filter(|t| local_date(t) == date).collect();

        let total_revenue: f64 = day.iter().map(|t| t.total).sum();
        let transaction_count = day.len() as i64;
        let average_transaction = if transaction_count > 0 {
            total_revenue / transaction_count as f64
        } else {
            0.0
        };
        let total_items_sold: i64 = day
            .iter()
            .flat_map(|t| t.items.iter())
            .map(|item| item.quantity)
            .sum();

        let mut by_method: BTreeMap<String, f64> = BTreeMap::new();
        for transaction in &day {
            *by_method.entry(transaction.payment_method.clone()).or_insert(0.0) +=
                transaction.total;
        }

        DailySummary {
            date,
            total_revenue,
            transaction_count,
            average_transaction,
            total_items_sold,
            by_payment_method: by_method
                .into_iter()
                .map(|(method, total)| PaymentBreakdown { method, total })
                .collect(),
        }
    }

    /// Produk terlaris berdasarkan kuantitas terjual.
    pub fn top_products(&self, limit: usize) -> Vec<ProductStat> {
        let mut stats: BTreeMap<String, ProductStat> = BTreeMap::new();
        for transaction in &self.transactions {
            for item in &transaction.items {
                let stat = stats.entry(item.product_id.clone()).or_insert_with(|| ProductStat {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    total_sold: 0,
                    total_revenue: 0.0,
                });
                stat.total_sold += item.quantity;
                stat.total_revenue += item.subtotal();
            }
        }

        let mut ranked: Vec<ProductStat> = stats.into_values().collect();
        ranked.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
        ranked.truncate(limit);
        ranked
    }
}

fn local_date(transaction: &Transaction) -> NaiveDate {
    transaction.created_at.with_timezone(&Local).date_naive()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::local_context;
    use super::*;
    use crate::models::transaction::LineItem;
    use chrono::{Duration, Utc};

    fn transaction(total: f64, method: &str, items: Vec<LineItem>, days_ago: i64) -> Transaction {
        Transaction {
            id: format!("t{}", days_ago),
            items,
            total,
            payment_method: method.to_string(),
            user_id: "staff".to_string(),
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn line(product_id: &str, name: &str, price: f64, quantity: i64) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn todays_sales_excludes_yesterday() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        ctx.transactions.push(transaction(325.0, "Cash", Vec::new(), 0));
        ctx.transactions.push(transaction(500.0, "Cash", Vec::new(), 1));

        assert_eq!(ctx.todays_sales(), 325.0);
    }

    #[tokio::test]
    async fn low_stock_is_filtered_and_sorted_ascending() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;
        ctx.products.clear();

        for (id, stock) in [("a", 20), ("b", 10), ("c", 3), ("d", 11)] {
            let now = Utc::now();
            ctx.products.push(crate::models::product::Product {
                id: id.to_string(),
                name: format!("produk {}", id),
                price: 100.0,
                stock,
                image: None,
                category: String::new(),
                created_at: now,
                updated_at: now,
            });
        }

        let flagged: Vec<i64> = ctx.low_stock_products().iter().map(|p| p.stock).collect();
        assert_eq!(flagged, vec![3, 10]);

        let critical: Vec<&str> =
            ctx.critical_stock_products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(critical, vec!["c"]);
    }

    #[tokio::test]
    async fn daily_summary_breaks_down_by_payment_method() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        ctx.transactions.push(transaction(
            240.0,
            "Cash",
            vec![line("1", "Latte", 120.0, 2)],
            0,
        ));
        ctx.transactions.push(transaction(
            80.0,
            "GCash",
            vec![line("2", "Espresso", 80.0, 1)],
            0,
        ));

        let summary = ctx.daily_summary(Local::now().date_naive());
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_revenue, 320.0);
        assert_eq!(summary.average_transaction, 160.0);
        assert_eq!(summary.total_items_sold, 3);
        assert_eq!(summary.by_payment_method.len(), 2);
        assert_eq!(summary.by_payment_method[0].method, "Cash");
        assert_eq!(summary.by_payment_method[0].total, 240.0);
    }

    #[tokio::test]
    async fn top_products_ranks_by_quantity_sold() {
        let (mut ctx, _cache) = local_context();
        ctx.load_all().await;

        ctx.transactions.push(transaction(
            440.0,
            "Cash",
            vec![line("1", "Latte", 120.0, 3), line("2", "Espresso", 80.0, 1)],
            0,
        ));
        ctx.transactions.push(transaction(
            320.0,
            "Cash",
            vec![line("2", "Espresso", 80.0, 4)],
            0,
        ));

        let ranked = ctx.top_products(10);
        assert_eq!(ranked[0].name, "Espresso");
        assert_eq!(ranked[0].total_sold, 5);
        assert_eq!(ranked[0].total_revenue, 400.0);
        assert_eq!(ranked[1].name, "Latte");
        assert_eq!(ranked[1].total_sold, 3);

        assert_eq!(ctx.top_products(1).len(), 1);
    }
}
