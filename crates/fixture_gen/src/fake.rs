//! Fake data pools and helpers.
//!
//! Every helper draws from the caller's RNG so that output depends only on
//! the generator seed.

use rand::Rng;

pub const COUNTRIES: &[&str] = &["US", "GB", "CA", "AU", "DE", "FR", "JP", "SG", "BR", "IN"];

pub const SUSPICIOUS_COUNTRIES: &[&str] = &["NG", "RU", "CN", "KP"];

pub const SUSPICIOUS_IPS: &[&str] = &["45.142.212.61", "185.220.101.52", "91.109.190.28"];

pub const CURRENCIES: &[&str] = &["USD", "EUR", "GBP"];

pub const PAYMENT_METHODS: &[&str] = &["credit_card", "debit_card", "bank_transfer"];

pub const RISKY_PAYMENT_METHODS: &[&str] = &["crypto", "wire_transfer"];

pub const LOGIN_METHODS: &[&str] = &["password", "oauth", "sso"];

pub const MERCHANT_CATEGORIES: &[&str] = &["retail", "food", "travel", "online"];

/// Pick one element of a non-empty slice.
pub fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

pub fn normal_user<R: Rng>(rng: &mut R) -> String {
    format!("user_{:04}", rng.random_range(1..=50))
}

pub fn suspicious_user<R: Rng>(rng: &mut R) -> String {
    format!("sus_{:04}", rng.random_range(1..=10))
}

pub fn vip_user<R: Rng>(rng: &mut R) -> String {
    format!("vip_{:04}", rng.random_range(1..=5))
}

pub fn merchant<R: Rng>(rng: &mut R) -> String {
    format!("merchant_{:03}", rng.random_range(1..=20))
}

pub fn device<R: Rng>(rng: &mut R) -> String {
    format!("device_{:05}", rng.random_range(1..=100))
}

pub fn ip<R: Rng>(rng: &mut R) -> String {
    format!(
        "192.168.{}.{}",
        rng.random_range(1..=255),
        rng.random_range(1..=255)
    )
}

pub fn email(user_id: &str) -> String {
    format!("{}@example.com", user_id)
}

pub fn phone<R: Rng>(rng: &mut R) -> String {
    format!("+1555{}", rng.random_range(1_000_000..=9_999_999))
}

/// Amount with two decimals in `[low, high)`.
pub fn amount<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    (rng.random_range(low..high) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_user_formats() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(normal_user(&mut rng).starts_with("user_"));
        assert_eq!(vip_user(&mut rng).len(), "vip_0001".len());
    }

    #[test]
    fn test_amount_has_two_decimals() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let a = amount(&mut rng, 10.0, 500.0);
            assert!((10.0..=500.0).contains(&a));
            assert_eq!(format!("{:.2}", a).parse::<f64>().unwrap(), a);
        }
    }
}
