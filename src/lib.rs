//! fedlink-core - Coordination plane for a federated-computation server
//!
//! This crate provides the server-side core for coordinating a dynamic
//! population of remote worker nodes:
//! - Authenticated fleet RPC (key exchange on first contact, HMAC after)
//! - Node registry and key/state bookkeeping
//! - Background reconciliation of live workers into a client manager
//! - A driver client for the node-registry service
//!
//! Algorithm strategies, metric aggregation, and process bootstrapping sit
//! on top of this plane and are out of scope here.

pub mod app;
pub mod client;
pub mod crypto;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod protocol;
pub mod shutdown;
pub mod state;

pub use app::{start_coordination, CoordinationConfig, CoordinationHandle};
pub use error::{FedError, Result};
pub use shutdown::ShutdownSignal;

/// Default liveness lease duration in seconds
pub const DEFAULT_PING_INTERVAL_SECS: f64 = 30.0;
