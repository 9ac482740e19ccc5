/// Minimal units per display unit.
pub const COIN: f64 = 1e8;

/// Convert a minimal-unit amount to its decimal display amount.
pub fn to_decimal(satoshis: i64) -> f64 {
    satoshis as f64 / COIN
}
