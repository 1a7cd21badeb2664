pub mod accountant;

pub use accountant::TrafficAccountantService;
