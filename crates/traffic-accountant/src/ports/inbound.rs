//! Driving port (API): what the rest of the node can ask of the traffic
//! accountant.

use crate::domain::MessageDirection;
use shared_types::entities::PeerId;

pub trait TrafficAccountantApi: Send + Sync {
    /// Record one message of `size` bytes for `message_type`, in the given
    /// direction, attributed to `peer`.
    fn record(&self, message_type: u16, direction: MessageDirection, peer: PeerId, size: u32);

    /// The sole admission decision for an anonymity-constrained send: does
    /// recent received traffic for `message_type` cover a send at `level`?
    fn cover_sufficient(&self, message_type: u16, level: u32) -> bool;
}
