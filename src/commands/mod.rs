//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `release.rs` — release/run (executor driven).
//! - `ops.rs` — deploy/install-scripts/setup-nodes/smoke.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `executor` and `services/*`.
//! - Keep behavior and output schema stable.

pub mod ops;
pub mod release;

pub use ops::handle_ops_commands;
pub use release::handle_release_commands;
