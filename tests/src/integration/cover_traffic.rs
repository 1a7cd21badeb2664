//! S6 (cover-traffic gating): a send at anonymity level 5 needs at least
//! 5 received messages of the same type in the current window, grounded
//! on `traffic_accountant::domain::admission::cover_sufficient` and its
//! own service-level test module.

use shared_types::entities::PeerId;
use traffic_accountant::{MessageDirection, SystemTimeSource, TrafficAccountantApi, TrafficAccountantService};

const QUERY_MESSAGE_TYPE: u16 = 1;
const ANONYMITY_LEVEL: u32 = 5;

fn peer(seed: u8) -> PeerId {
    PeerId::from_public_key(&[seed])
}

#[test]
fn s6_cover_traffic_gates_the_send_until_enough_has_been_received() {
    let accountant = TrafficAccountantService::new(SystemTimeSource);

    for seed in 0..3u8 {
        accountant.record(QUERY_MESSAGE_TYPE, MessageDirection::Received, peer(seed), 128);
    }
    assert!(
        !accountant.cover_sufficient(QUERY_MESSAGE_TYPE, ANONYMITY_LEVEL),
        "3 received messages shouldn't cover a level-5 send"
    );

    for seed in 3..5u8 {
        accountant.record(QUERY_MESSAGE_TYPE, MessageDirection::Received, peer(seed), 128);
    }
    assert!(
        accountant.cover_sufficient(QUERY_MESSAGE_TYPE, ANONYMITY_LEVEL),
        "5 received messages should cover a level-5 send"
    );
}

#[test]
fn s6_sent_traffic_never_counts_as_its_own_cover() {
    let accountant = TrafficAccountantService::new(SystemTimeSource);

    for seed in 0..5u8 {
        accountant.record(QUERY_MESSAGE_TYPE, MessageDirection::Sent, peer(seed), 128);
    }
    assert!(!accountant.cover_sufficient(QUERY_MESSAGE_TYPE, ANONYMITY_LEVEL));
}
