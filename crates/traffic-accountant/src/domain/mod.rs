pub mod admission;
pub mod entities;
pub mod window;

pub use admission::cover_sufficient;
pub use entities::{DiversityEntry, DiversityRing, MessageDirection, Slot, DIVERSITY_CAPACITY, SLOT_DURATION_SECS, WINDOW_SLOTS};
pub use window::{MessageTypeBucket, RotatingWindow};
