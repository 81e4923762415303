//! Durable run registry for in-flight training requests.
//!
//! The registry is a single SQLite table keyed by `request_id`. A row exists
//! for exactly as long as a request is in flight: inserted at submission,
//! updated once when the real process id is known, and deleted on completion,
//! failure, or abort. Absence of a row is the only externally observable
//! terminal marker.
//!
//! # Durability
//!
//! The backing table is dropped and recreated every time the registry is
//! opened. A supervisor restart therefore starts from a clean slate rather
//! than resuming stale entries whose processes are long gone. This trades
//! durability across restarts for guaranteed consistency.

mod store;

pub use store::{RunRecord, RunRegistry, RegistryError, DEFAULT_REGISTRY_TABLE, PID_NONE};
