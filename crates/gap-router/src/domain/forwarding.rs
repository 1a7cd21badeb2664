//! Weighted peer selection and TTL/priority decay for one forwarding hop.

use shared_types::entities::PeerId;

/// One candidate peer this node could forward a query to, with the inputs
/// the selection weight is built from.
#[derive(Debug, Clone, Copy)]
pub struct ForwardCandidate {
    pub peer: PeerId,
    pub trust: u32,
    pub bandwidth_share: f64,
}

impl ForwardCandidate {
    fn weight(&self) -> f64 {
        f64::from(self.trust) * self.bandwidth_share
    }
}

/// Picks up to `count` distinct peers from `candidates`, excluding any
/// already in `exclude`, weighted by `trust * bandwidth_share`. A candidate
/// with zero weight can still be picked if every remaining candidate is
/// also zero-weight — otherwise queries would stall entirely on a
/// cold-started node where no peer has accrued trust yet.
pub fn select_forward_peers(
    candidates: &[ForwardCandidate],
    exclude: &[PeerId],
    count: usize,
    random_unit: &mut dyn FnMut() -> f64,
) -> Vec<PeerId> {
    let mut pool: Vec<ForwardCandidate> =
        candidates.iter().filter(|c| !exclude.contains(&c.peer)).copied().collect();

    let mut chosen = Vec::with_capacity(count.min(pool.len()));
    while chosen.len() < count && !pool.is_empty() {
        let total_weight: f64 = pool.iter().map(ForwardCandidate::weight).sum();
        let pick_index = if total_weight <= 0.0 {
            // All remaining candidates are zero-weight: pick uniformly.
            ((random_unit)() * pool.len() as f64) as usize
        } else {
            let target = (random_unit)() * total_weight;
            let mut running = 0.0;
            let mut idx = pool.len() - 1;
            for (i, c) in pool.iter().enumerate() {
                running += c.weight();
                if running >= target {
                    idx = i;
                    break;
                }
            }
            idx
        };
        let pick_index = pick_index.min(pool.len() - 1);
        chosen.push(pool.remove(pick_index).peer);
    }
    chosen
}

/// Decrements TTL by the configured base plus a random jitter in
/// `[0, jitter_max)`, never going below zero.
pub fn decrement_ttl(ttl: i32, base: i32, jitter_max: i32, random_jitter: impl FnOnce(i32) -> i32) -> i32 {
    let jitter = if jitter_max > 0 { random_jitter(jitter_max) } else { 0 };
    (ttl - base - jitter).max(0)
}

/// Decrements priority proportionally to how much TTL was just spent,
/// relative to the TTL the entry started with. A query that has already
/// burned most of its TTL budget has little priority left to spend on
/// further forwards either.
pub fn decrement_priority(priority: u32, ttl_before: i32, ttl_after: i32) -> u32 {
    if ttl_before <= 0 {
        return priority;
    }
    let spent_fraction = (ttl_before - ttl_after).max(0) as f64 / ttl_before as f64;
    let decrement = (f64::from(priority) * spent_fraction).round() as u32;
    priority.saturating_sub(decrement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(byte: u8, trust: u32, bandwidth_share: f64) -> ForwardCandidate {
        ForwardCandidate { peer: PeerId::from_public_key(&[byte]), trust, bandwidth_share }
    }

    #[test]
    fn a_peer_already_crossed_by_this_query_is_never_selected_again() {
        let seen = candidate(1, 1000, 1.0);
        let fresh = candidate(2, 1, 0.1);
        let chosen = select_forward_peers(&[seen, fresh], &[seen.peer], 2, &mut || 0.99);
        assert_eq!(chosen, vec![fresh.peer]);
    }

    #[test]
    fn selection_never_returns_more_than_requested() {
        let pool: Vec<_> = (0..5u8).map(|b| candidate(b, 10, 1.0)).collect();
        let chosen = select_forward_peers(&pool, &[], 3, &mut || 0.5);
        assert_eq!(chosen.len(), 3);
    }

    #[test]
    fn zero_trust_peers_still_get_picked_when_nothing_else_is_eligible() {
        let only = candidate(1, 0, 0.0);
        let chosen = select_forward_peers(&[only], &[], 1, &mut || 0.5);
        assert_eq!(chosen, vec![only.peer]);
    }

    #[test]
    fn ttl_never_goes_negative() {
        assert_eq!(decrement_ttl(1, 2, 3, |_| 0), 0);
    }

    #[test]
    fn priority_decays_in_proportion_to_ttl_spent() {
        assert_eq!(decrement_priority(100, 10, 5), 50);
        assert_eq!(decrement_priority(100, 10, 10), 0);
        assert_eq!(decrement_priority(100, 0, 0), 100);
    }
}
