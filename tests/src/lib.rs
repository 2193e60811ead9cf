//! # Cinderchain Test Suite
//!
//! End-to-end scenarios driving real workers over the in-memory bus.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Witness-ring builder shared by the scenarios
//! └── scenarios/        # Cross-subsystem consensus flows
//!     ├── happy_path.rs # Three-witness ring producing effective blocks
//!     └── reject_cycle.rs # Missed proposer, oppose-majority, re-propose
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All scenarios
//! cargo test -p cinder-tests
//!
//! # By scenario
//! cargo test -p cinder-tests scenarios::reject_cycle
//! ```

pub mod harness;

#[cfg(test)]
mod scenarios;
