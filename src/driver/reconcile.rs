//! Node reconciliation loop
//!
//! Background task keeping the client manager's proxy set in sync with the
//! registry's live node set. Each cycle diffs the freshly fetched ids
//! against a local cache: vanished nodes are unregistered, new nodes get a
//! proxy. Transient fetch failures are retried next cycle; a duplicate
//! registration is a consistency violation and terminates the loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::{ClientManager, DriverClientProxy, SimpleClientManager};
use crate::driver::{GrpcDriver, NodeSource};
use crate::error::{FedError, Result};
use crate::shutdown::ShutdownSignal;

/// Background reconciler between the registry and the client manager
pub struct NodeReconciler<D: NodeSource> {
    source: Arc<D>,
    /// Driver shared with the proxies built for newly seen nodes.
    driver: Arc<GrpcDriver>,
    manager: Arc<SimpleClientManager>,
    run_id: i64,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl<D: NodeSource + 'static> NodeReconciler<D> {
    pub fn new(
        source: Arc<D>,
        driver: Arc<GrpcDriver>,
        manager: Arc<SimpleClientManager>,
        run_id: i64,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            source,
            driver,
            manager,
            run_id,
            interval,
            shutdown,
        }
    }

    /// Run until shutdown or a consistency violation
    pub async fn run(self) -> Result<()> {
        let mut known: HashSet<i64> = HashSet::new();
        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            // Race the fetch against shutdown so a dead registry cannot
            // block cancellation indefinitely.
            let fetched = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.source.live_nodes() => result,
            };

            match fetched {
                Ok(nodes) => {
                    let live: HashSet<i64> = nodes.iter().map(|n| n.node_id).collect();
                    self.apply_diff(&mut known, live)?;
                }
                Err(e) => {
                    // Retried next cycle; the manager keeps its last view.
                    warn!("Failed to fetch live nodes, will retry: {}", e);
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Node reconciliation loop stopped");
        Ok(())
    }

    /// Register new nodes and unregister vanished ones
    fn apply_diff(&self, known: &mut HashSet<i64>, live: HashSet<i64>) -> Result<()> {
        for &node_id in known.difference(&live) {
            // Absent proxies are tolerated: manual deregistration can race
            // the snapshot this diff was computed from.
            self.manager.unregister(node_id);
            debug!("Node {} vanished from the live set", node_id);
        }

        for &node_id in live.difference(known) {
            let proxy = Arc::new(DriverClientProxy::new(
                node_id,
                Arc::clone(&self.driver),
                self.run_id,
            ));
            if !self.manager.register(proxy) {
                // The registry and the local view disagree on who owns
                // this id; that invariant break must surface.
                error!("Duplicate registration for node {}", node_id);
                return Err(FedError::DuplicateNode { node_id });
            }
            debug!("Node {} joined the live set", node_id);
        }

        *known = live;
        Ok(())
    }

    /// Spawn the loop onto the runtime and return a stop handle
    pub fn spawn(self) -> ReconcilerHandle {
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(self.run());
        ReconcilerHandle { shutdown, handle }
    }
}

/// Handle for stopping a spawned reconciler
pub struct ReconcilerHandle {
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<()>>,
}

impl ReconcilerHandle {
    /// Trigger shutdown and wait for the current cycle to finish
    pub async fn stop(self) -> Result<()> {
        self.shutdown.shutdown();
        self.join().await
    }

    /// Wait for the loop to terminate without triggering shutdown
    pub async fn join(self) -> Result<()> {
        self.handle.await.map_err(|e| FedError::Internal {
            message: format!("reconciler task panicked: {e}"),
        })?
    }
}
