use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::store::UserId;

/// The fields a transaction fingerprint is computed from.
#[derive(Debug, Clone)]
pub struct HashInput<'a> {
    pub category: &'a str,
    pub amount: Decimal,
    pub notes: &'a str,
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub batch_index: usize,
    pub currency: &'a str,
}

/// Dedup window applied to timestamps before hashing, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupWindow(u32);

impl DedupWindow {
    pub const ONE_SECOND: Self = Self(1);

    /// A window of zero seconds is treated as one second.
    pub fn from_secs(secs: u32) -> Self {
        Self(secs.max(1))
    }

    pub fn secs(self) -> u32 {
        self.0
    }

    fn bucket(self, timestamp: DateTime<Utc>) -> i64 {
        let window = i64::from(self.0);
        timestamp.timestamp().div_euclid(window) * window
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::ONE_SECOND
    }
}

const FIELD_SEPARATOR: u8 = 0x1f;

/// SHA-256 fingerprint of a transaction as 64 lowercase hex characters.
///
/// Used only as an equality key for duplicate detection. Sub-window
/// timestamp differences do not change the result.
pub fn transaction_hash(input: &HashInput<'_>, window: DedupWindow) -> String {
    let mut hasher = Sha256::new();
    let amount = format!("{:.2}", input.amount);
    let timestamp = window.bucket(input.timestamp).to_string();
    let user_id = input.user_id.to_string();
    let batch_index = input.batch_index.to_string();

    for field in [
        input.category,
        amount.as_str(),
        input.notes,
        timestamp.as_str(),
        user_id.as_str(),
        batch_index.as_str(),
        input.currency,
    ] {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use std::str::FromStr;

    fn base() -> HashInput<'static> {
        HashInput {
            category: "Groceries",
            amount: Decimal::from_str("45").unwrap(),
            notes: "Woolworths",
            timestamp: Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap(),
            user_id: 7,
            batch_index: 0,
            currency: "NZD",
        }
    }

    fn hash(input: &HashInput<'_>) -> String {
        transaction_hash(input, DedupWindow::ONE_SECOND)
    }

    #[test]
    fn is_deterministic_hex() {
        let a = hash(&base());
        assert_eq!(a, hash(&base()));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn each_field_changes_digest() {
        let reference = hash(&base());
        let variants = [
            HashInput { category: "Transport", ..base() },
            HashInput { amount: Decimal::from_str("45.01").unwrap(), ..base() },
            HashInput { notes: "Countdown", ..base() },
            HashInput { timestamp: base().timestamp + TimeDelta::seconds(1), ..base() },
            HashInput { user_id: 8, ..base() },
            HashInput { batch_index: 1, ..base() },
            HashInput { currency: "USD", ..base() },
        ];
        for variant in &variants {
            assert_ne!(hash(variant), reference, "{variant:?}");
        }
    }

    #[test]
    fn amount_uses_fixed_precision() {
        let a = HashInput { amount: Decimal::from_str("45.0").unwrap(), ..base() };
        let b = HashInput { amount: Decimal::from_str("45.00").unwrap(), ..base() };
        assert_eq!(hash(&a), hash(&b));
        assert_eq!(hash(&a), hash(&base()));
    }

    #[test]
    fn sub_second_noise_is_ignored() {
        let noisy = HashInput {
            timestamp: base().timestamp + TimeDelta::milliseconds(750),
            ..base()
        };
        assert_eq!(hash(&noisy), hash(&base()));
    }

    #[test]
    fn fields_cannot_bleed_into_each_other() {
        let a = HashInput { category: "Gro", notes: "ceries", ..base() };
        let b = HashInput { category: "Groceries", notes: "", ..base() };
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn wider_window_merges_nearby_timestamps() {
        let window = DedupWindow::from_secs(60);
        let later = HashInput {
            timestamp: base().timestamp + TimeDelta::seconds(30),
            ..base()
        };
        assert_eq!(
            transaction_hash(&later, window),
            transaction_hash(&base(), window)
        );
        assert_eq!(DedupWindow::from_secs(0), DedupWindow::ONE_SECOND);
    }
}
