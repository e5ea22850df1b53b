//! Scheduling-facing view of usable workers
//!
//! The client manager holds one proxy per live node; the scheduling layer
//! reads it to pick recipients for the next round, while the reconciliation
//! loop keeps it in sync with the registry.

pub mod manager;
pub mod proxy;

pub use manager::{ClientManager, SimpleClientManager};
pub use proxy::DriverClientProxy;
