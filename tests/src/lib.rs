//! End-to-end scenarios exercising two or more subsystems wired through
//! their real service layers — no mocked transport, only the test doubles
//! each subsystem's own outbound ports already require (a fixed clock, a
//! fixed RNG draw, an in-memory store standing in for a file-backed one).
//!
//! ```text
//! tests/src/
//! └── integration/   # S1-S6 end-to-end scenarios
//! ```
//!
//! ```bash
//! cargo test -p gnunet-core-tests
//! ```

pub mod integration;
