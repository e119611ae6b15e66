//! Rating boost

/// Lowest rating written to the table
pub const MIN_RATING: f64 = 1.0;

/// Highest rating written to the table
pub const MAX_RATING: f64 = 10.0;

/// `clamp(round(rating + boost), 1, 10)`
///
/// Always applied to provider ratings, so a zero boost still rounds
/// fractional ratings and clamps out-of-range ones.
pub fn apply_boost(rating: f64, boost: f64) -> u8 {
    (rating + boost).round().clamp(MIN_RATING, MAX_RATING) as u8
}
