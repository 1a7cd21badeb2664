pub mod router;

pub use router::GapRouterService;
