//! Pure decision logic for the host registry: which of two HELLOs for the
//! same (peer, protocol) wins, and how a blacklist back-off window grows.

use crate::domain::entities::{BlacklistEntry, MAX_BLACKLIST_DELTA_SECS};
use shared_types::entities::HelloRecord;

/// Given an optional existing HELLO for (peer, protocol) and a freshly
/// received one, decide whether the new one should replace it: the later
/// expiration wins, ties keep the existing record.
#[must_use]
pub fn newer_hello_wins<'a>(existing: Option<&'a HelloRecord>, incoming: &'a HelloRecord) -> bool {
    match existing {
        None => true,
        Some(current) => incoming.expiration > current.expiration,
    }
}

/// Compute the next blacklist window for a peer given a desperation level
/// and a `jitter` value the caller has already drawn from `0..=desperation`.
///
/// - If the peer isn't currently blacklisted, the new delta is the jitter
///   alone.
/// - If it already is, the jitter is added to the remaining delta
///   (`until - now`), so repeated hits accumulate rather than reset.
///
/// The result is capped at `MAX_BLACKLIST_DELTA_SECS` and `strict` only
/// ever upgrades an existing entry, never downgrades it.
#[must_use]
pub fn next_blacklist_entry(
    existing: Option<BlacklistEntry>,
    now: u64,
    jitter_secs: u64,
    strict: bool,
) -> BlacklistEntry {
    let (base_delta, prior_strict) = match existing {
        Some(entry) if entry.until > now => (entry.until - now, entry.strict),
        _ => (0, false),
    };
    let delta = (base_delta + jitter_secs).min(MAX_BLACKLIST_DELTA_SECS);
    BlacklistEntry { until: now + delta, strict: strict || prior_strict }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::entities::PeerId;

    fn hello(expiration: u64) -> HelloRecord {
        HelloRecord {
            public_key: vec![1, 2, 3],
            peer_id: PeerId::from_public_key(&[1, 2, 3]),
            expiration,
            mtu: 1500,
            protocol: 0,
            address: vec![127, 0, 0, 1],
            signature: vec![],
        }
    }

    #[test]
    fn no_existing_hello_always_wins() {
        assert!(newer_hello_wins(None, &hello(100)));
    }

    #[test]
    fn later_expiration_wins() {
        let existing = hello(100);
        assert!(newer_hello_wins(Some(&existing), &hello(200)));
        assert!(!newer_hello_wins(Some(&existing), &hello(50)));
    }

    #[test]
    fn tie_keeps_existing() {
        let existing = hello(100);
        assert!(!newer_hello_wins(Some(&existing), &hello(100)));
    }

    #[test]
    fn fresh_blacklist_uses_jitter_only() {
        let entry = next_blacklist_entry(None, 1_000, 30, false);
        assert_eq!(entry.until, 1_030);
        assert!(!entry.strict);
    }

    #[test]
    fn repeat_blacklist_accumulates_remaining_delta() {
        let existing = BlacklistEntry { until: 1_100, strict: false };
        let entry = next_blacklist_entry(Some(existing), 1_000, 30, false);
        // remaining delta (100) + jitter (30)
        assert_eq!(entry.until, 1_130);
    }

    #[test]
    fn delta_is_capped_at_four_hours() {
        let existing = BlacklistEntry { until: 1_000 + super::MAX_BLACKLIST_DELTA_SECS, strict: false };
        let entry = next_blacklist_entry(Some(existing), 1_000, 999_999, false);
        assert_eq!(entry.until, 1_000 + super::MAX_BLACKLIST_DELTA_SECS);
    }

    #[test]
    fn strict_only_upgrades() {
        let existing = BlacklistEntry { until: 1_100, strict: true };
        let entry = next_blacklist_entry(Some(existing), 1_000, 10, false);
        assert!(entry.strict);
    }

    #[test]
    fn expired_entry_is_treated_as_fresh() {
        let existing = BlacklistEntry { until: 900, strict: true };
        let entry = next_blacklist_entry(Some(existing), 1_000, 10, false);
        assert_eq!(entry.until, 1_010);
        assert!(!entry.strict);
    }
}
