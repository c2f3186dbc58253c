//! Input validation and sanitization module
//!
//! Centralized validation for user accounts, products, and checkout input.

/// Validation result type
pub type ValidationResult = Result<(), String>;

/// Validate a username
/// - Length: 3-50 characters
/// - Allowed: alphanumeric, underscore, hyphen
/// - Must start with letter
pub fn validate_username(username: &str) -> ValidationResult {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err("Username tidak boleh kosong".into());
    }

    if trimmed.len() < 3 || trimmed.len() > 50 {
        return Err("Username harus 3-50 karakter".into());
    }

    if !trimmed.chars().next().unwrap().is_alphabetic() {
        return Err("Username harus dimulai dengan huruf".into());
    }

    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err("Username hanya boleh berisi huruf, angka, underscore, dan hyphen".into());
    }

    Ok(())
}

/// Validate password length. Credentials are compared in plaintext in this
/// design, so only a length check applies here.
pub fn validate_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return Err("Password tidak boleh kosong".into());
    }

    if password.len() < 6 {
        return Err("Password minimal 6 karakter".into());
    }

    if password.len() > 128 {
        return Err("Password maksimal 128 karakter".into());
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> ValidationResult {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err("Email tidak boleh kosong".into());
    }

    if trimmed.len() > 254 {
        return Err("Email terlalu panjang (max 254 karakter)".into());
    }

    let parts: Vec<&str> = trimmed.split('@').collect();
    if parts.len() != 2 {
        return Err("Format email tidak valid".into());
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 {
        return Err("Bagian lokal email tidak valid".into());
    }

    if !domain.contains('.') {
        return Err("Domain email tidak valid".into());
    }

    Ok(())
}

/// Validate product name
pub fn validate_product_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Nama produk tidak boleh kosong".into());
    }

    if trimmed.len() < 2 || trimmed.len() > 200 {
        return Err("Nama produk harus 2-200 karakter".into());
    }

    Ok(())
}

/// Validate unit price
/// - Must be finite and non-negative
/// - Maximum: 1 billion
pub fn validate_price(price: f64) -> ValidationResult {
    if price.is_nan() || price.is_infinite() {
        return Err("Harga tidak valid".into());
    }

    if price < 0.0 {
        return Err("Harga tidak boleh negatif".into());
    }

    if price > 1_000_000_000.0 {
        return Err("Harga maksimal 1.000.000.000".into());
    }

    Ok(())
}

/// Validate stock quantity
pub fn validate_quantity(qty: i64) -> ValidationResult {
    if qty < 0 {
        return Err("Jumlah tidak boleh negatif".into());
    }

    if qty > 1_000_000 {
        return Err("Jumlah maksimal 1.000.000".into());
    }

    Ok(())
}

/// Validate payment method label (free text, e.g. "Cash", "GCash")
pub fn validate_payment_method(method: &str) -> ValidationResult {
    let trimmed = method.trim();

    if trimmed.is_empty() {
        return Err("Metode pembayaran tidak boleh kosong".into());
    }

    if trimmed.len() > 50 {
        return Err("Metode pembayaran maksimal 50 karakter".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("1admin").is_err());
        assert!(validate_username("kasir_01").is_ok());
        assert!(validate_username("kasir 01").is_err());
    }

    #[test]
    fn password_length_only() {
        assert!(validate_password("admin123").is_ok());
        // No complexity requirement in the plaintext credential model
        assert!(validate_password("aaaaaa").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(120.0).is_ok());
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("staff@bymonday.coffee").is_ok());
        assert!(validate_email("staff@nodomain").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }
}
