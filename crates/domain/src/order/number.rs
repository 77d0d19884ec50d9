use chrono::Utc;
use uuid::Uuid;

/// Source of customer-facing order numbers.
///
/// Generators only need to make collisions unlikely; uniqueness is enforced
/// by the store and a collision is retried with a fresh number.
pub trait OrderNumberGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `ORD` + UTC date + 8 random digits, e.g. `ORD2026101804817263`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderNumbers;

impl OrderNumberGenerator for RandomOrderNumbers {
    fn generate(&self) -> String {
        let suffix = Uuid::new_v4().as_u128() % 100_000_000;
        format!("ORD{}{suffix:08}", Utc::now().format("%Y%m%d"))
    }
}
