//! Client manager
//!
//! Registry of proxies for currently usable workers. Mutated by the
//! reconciliation loop, read concurrently by the scheduling layer, so the
//! map sits behind a synchronous lock rather than an async one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::client::proxy::DriverClientProxy;

/// Interface the scheduling layer and reconciliation loop share
pub trait ClientManager: Send + Sync {
    /// Add a proxy; returns false if its node id is already present
    fn register(&self, proxy: Arc<DriverClientProxy>) -> bool;

    /// Remove the proxy for `node_id`; absent ids are tolerated
    fn unregister(&self, node_id: i64);

    /// Snapshot of all registered proxies
    fn all(&self) -> Vec<Arc<DriverClientProxy>>;

    /// Number of registered proxies
    fn len(&self) -> usize;

    /// Whether no proxies are registered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default in-memory client manager
#[derive(Default)]
pub struct SimpleClientManager {
    proxies: RwLock<HashMap<i64, Arc<DriverClientProxy>>>,
}

impl SimpleClientManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the registered node ids
    pub fn node_ids(&self) -> Vec<i64> {
        self.proxies.read().keys().copied().collect()
    }
}

impl ClientManager for SimpleClientManager {
    fn register(&self, proxy: Arc<DriverClientProxy>) -> bool {
        let mut proxies = self.proxies.write();
        let node_id = proxy.node_id();
        if proxies.contains_key(&node_id) {
            warn!("Refusing to register duplicate proxy for node {}", node_id);
            return false;
        }
        debug!("Registered proxy for node {}", node_id);
        proxies.insert(node_id, proxy);
        true
    }

    fn unregister(&self, node_id: i64) {
        if self.proxies.write().remove(&node_id).is_some() {
            debug!("Unregistered proxy for node {}", node_id);
        }
    }

    fn all(&self) -> Vec<Arc<DriverClientProxy>> {
        self.proxies.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.proxies.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverConfig, GrpcDriver};

    fn proxy(node_id: i64) -> Arc<DriverClientProxy> {
        let driver = Arc::new(GrpcDriver::new(DriverConfig::default()));
        Arc::new(DriverClientProxy::new(node_id, driver, 1))
    }

    #[test]
    fn test_registration_is_idempotent() {
        let manager = SimpleClientManager::new();
        assert!(manager.register(proxy(7)));
        assert!(!manager.register(proxy(7)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_unregister_absent_id_is_tolerated() {
        let manager = SimpleClientManager::new();
        manager.unregister(404);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_all_reflects_membership() {
        let manager = SimpleClientManager::new();
        manager.register(proxy(1));
        manager.register(proxy(2));
        manager.unregister(1);

        let ids: Vec<i64> = manager.all().iter().map(|p| p.node_id()).collect();
        assert_eq!(ids, vec![2]);
    }
}
