use chrono::Utc;

use crate::models::product::Product;
use crate::models::user::{Role, User};

/// Data contoh bawaan untuk first run mode lokal.
pub fn sample_products() -> Vec<Product> {
    let now = Utc::now();
    vec![
        Product {
            id: "1".to_string(),
            name: "Latte".to_string(),
            price: 120.0,
            stock: 15,
            image: Some("https://images.pexels.com/photos/302896/pexels-photo-302896.jpeg".to_string()),
            category: "Coffee".to_string(),
            created_at: now,
            updated_at: now,
        },
        Product {
            id: "2".to_string(),
            name: "Espresso".to_string(),
            price: 80.0,
            stock: 25,
            image: Some("https://images.pexels.com/photos/34085/pexels-photo.jpg".to_string()),
            category: "Coffee".to_string(),
            created_at: now,
            updated_at: now,
        },
    ]
}

/// Akun contoh bawaan. Kredensial plaintext, hanya untuk mode lokal/demo.
pub fn sample_users() -> Vec<User> {
    let now = Utc::now();
    vec![
        User {
            id: "1".to_string(),
            username: "admin".to_string(),
            password: "admin123".to_string(),
            role: Role::Admin,
            email: None,
            created_at: now,
        },
        User {
            id: "2".to_string(),
            username: "staff".to_string(),
            password: "staff123".to_string(),
            role: Role::Staff,
            email: None,
            created_at: now,
        },
    ]
}
