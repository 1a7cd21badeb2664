pub mod inbound;
pub mod outbound;

pub use inbound::TrafficAccountantApi;
pub use outbound::{SystemTimeSource, TimeSource};
