//! Driven port (SPI): the one thing the host application supplies — a
//! clock. The accounting state itself is ephemeral (cleared on restart,
//! same as the rest of the node's in-memory traffic picture), so there is
//! no persistence port here.

pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
