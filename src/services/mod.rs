//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `nodes.rs` — nodes file loading.
//! - `deploy.rs` — version resolution, per-node deploy, healthcheck polling.
//! - `setup.rs` — install instructions and docker login on nodes.
//! - `smoke/` — HTTP smoke test of a running proxy.
//! - `storage.rs` — audit log.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod deploy;
pub mod nodes;
pub mod output;
pub mod setup;
pub mod smoke;
pub mod storage;

#[cfg(test)]
pub mod mock_http;
