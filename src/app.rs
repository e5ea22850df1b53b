//! Driver-side coordination wiring
//!
//! Connects the driver client to the registry, spins up the reconciliation
//! loop, and hands the scheduling layer a client manager that tracks the
//! live worker population.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::client::SimpleClientManager;
use crate::driver::{
    DriverConfig, GrpcDriver, NodeReconciler, ReconcilerHandle, DEFAULT_RECONCILE_INTERVAL_SECS,
};
use crate::error::{FedError, Result};
use crate::shutdown::ShutdownSignal;

/// Configuration for the coordination plane's driver side
#[derive(Debug, Clone)]
pub struct CoordinationConfig {
    /// Driver client configuration (registry address, TLS, timeouts)
    pub driver: DriverConfig,
    /// Cadence of the node reconciliation loop
    pub reconcile_interval: Duration,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
        }
    }
}

/// Running coordination plane: driver, client manager, reconciler
pub struct CoordinationHandle {
    manager: Arc<SimpleClientManager>,
    driver: Arc<GrpcDriver>,
    reconciler: ReconcilerHandle,
}

impl CoordinationHandle {
    /// Client manager the scheduling layer reads
    pub fn client_manager(&self) -> Arc<SimpleClientManager> {
        Arc::clone(&self.manager)
    }

    /// Shared driver client
    pub fn driver(&self) -> Arc<GrpcDriver> {
        Arc::clone(&self.driver)
    }

    /// Stop the reconciliation loop and wait for it to finish
    ///
    /// The driver is released only after the loop has joined.
    pub async fn shutdown(self) -> Result<()> {
        self.reconciler.stop().await
    }
}

/// Connect to the registry and start reconciling the worker population
///
/// Connection failure is returned as-is and should be treated as fatal at
/// startup: a coordination plane that cannot reach its registry must not
/// start degraded.
pub async fn start_coordination(config: CoordinationConfig) -> Result<CoordinationHandle> {
    let driver = Arc::new(GrpcDriver::new(config.driver));
    driver.connect().await?;
    let run_id = driver.run_id().await.ok_or(FedError::NotConnected)?;

    let manager = Arc::new(SimpleClientManager::new());
    let reconciler = NodeReconciler::new(
        Arc::clone(&driver),
        Arc::clone(&driver),
        Arc::clone(&manager),
        run_id,
        config.reconcile_interval,
        ShutdownSignal::new(),
    )
    .spawn();

    info!("Coordination plane started for run {}", run_id);
    Ok(CoordinationHandle {
        manager,
        driver,
        reconciler,
    })
}
