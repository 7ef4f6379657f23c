//! Shared data model layer (structs/errors only).
//!
//! ## Files
//! - `models.rs` — report/output structs serialized by `--json`.
//! - `errors.rs` — typed errors and their stable error codes.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! Changes in these structs can affect `--json` outputs and integration contracts.
//! Keep schema-impacting changes explicit and synchronized with `docs/contracts/*`.

pub mod errors;
pub mod models;
