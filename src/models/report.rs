use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ringkasan penjualan satu hari kalender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_revenue: f64,
    pub transaction_count: i64,
    pub average_transaction: f64,
    pub total_items_sold: i64,
    pub by_payment_method: Vec<PaymentBreakdown>,
}

/// Total pendapatan per metode pembayaran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub method: String,
    pub total: f64,
}

/// Statistik produk terlaris.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStat {
    pub product_id: String,
    pub name: String,
    pub total_sold: i64,
    pub total_revenue: f64,
}
