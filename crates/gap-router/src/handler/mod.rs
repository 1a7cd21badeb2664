//! Handler layer: wire framing for the peer-to-peer GAP protocol and
//! dispatch of decoded frames into the router service.

pub mod dispatch;
pub mod wire;

pub use dispatch::{dispatch_query, dispatch_reply};
pub use wire::{GapQueryMessage, GapResultMessage, WireError, GAP_QUERY_TYPE, GAP_RESULT_TYPE};
