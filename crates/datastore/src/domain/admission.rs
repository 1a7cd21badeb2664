//! Pure admission-policy functions: whether a new block fits the quota,
//! and the one-time aging bonus older databases grant newly admitted
//! content so they don't out-compete a node that's been running longer.

use super::config::AGING_BONUS_PERIOD_SECS;

/// `max(1, (now - db_creation_time) / 30 days)` — granted once, at insert
/// time, and stored as part of the row's priority from then on.
pub fn aging_bonus(now: u64, db_creation_time: u64) -> u32 {
    let age_secs = now.saturating_sub(db_creation_time);
    ((age_secs / AGING_BONUS_PERIOD_SECS) as u32).max(1)
}

/// Whether a block of `size` bytes at `priority` may be admitted given
/// `available` free bytes and the store's current `min_priority` floor.
///
/// Rejection is a normal outcome here, not an error: the caller decides
/// how to report it.
pub fn admits(available: u64, size: u64, priority: u32, min_priority: u32, bonus: u32) -> bool {
    available >= size && priority.saturating_add(bonus) > min_priority
}
