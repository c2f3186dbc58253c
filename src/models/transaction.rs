use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Satu baris keranjang: referensi produk + kuantitas, dengan harga satuan
/// sebagaimana diberikan kasir saat checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Transaksi penjualan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub items: Vec<LineItem>,
    pub total: f64,
    /// Label bebas, mis. "Cash" | "GCash"
    pub payment_method: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
