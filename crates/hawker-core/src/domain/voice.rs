//! Stable logical voice tags.
//!
//! Tags are resolved to provider-specific voice ids at synthesis time by
//! the TTS adapter; the core only deals in these identifiers.

/// Sunny young man — fruit and vegetables, fresh and upbeat.
pub const SUNNY_BOY: &str = "sunny_boy";
/// Friendly neighbour lady — cooked food and meat, trustworthy.
pub const SOFT_GIRL: &str = "soft_girl";
/// Big-voiced market boss — seafood and big promotions.
pub const PROMO_BOSS: &str = "promo_boss";
/// Sweet customer-service girl — snacks and desserts.
pub const SWEET_GIRL: &str = "sweet_girl";

/// Every supported tag, in catalogue pre-warm order.
pub const ALL: [&str; 4] = [SUNNY_BOY, SOFT_GIRL, PROMO_BOSS, SWEET_GIRL];
