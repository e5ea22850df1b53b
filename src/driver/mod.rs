//! Remote driver client for the node registry
//!
//! The server process's own outbound client: it asks the registry which
//! nodes are currently live and relays task traffic on behalf of client
//! proxies. `connect()` is fatal on a bad address; everything else surfaces
//! transport errors to the caller.

pub mod reconcile;
pub mod service;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::info;

use crate::error::{FedError, Result};
use crate::protocol::driver_client::DriverClient;
use crate::protocol::{
    CreateRunRequest, GetNodesRequest, Node, PullTaskResRequest, PushTaskInsRequest, TaskIns,
    TaskRes,
};

pub use reconcile::{NodeReconciler, ReconcilerHandle};
pub use service::DriverService;

/// Default reconciliation cadence in seconds
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 3;

/// Configuration for the driver client
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Registry (driver API) address
    pub driver_address: String,
    /// PEM-encoded root certificates for TLS, if any
    pub root_certificates: Option<Vec<u8>>,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            driver_address: "http://127.0.0.1:9091".into(),
            root_certificates: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// gRPC client for the registry's Driver service
pub struct GrpcDriver {
    config: DriverConfig,
    client: RwLock<Option<DriverClient<Channel>>>,
    run_id: RwLock<Option<i64>>,
}

impl GrpcDriver {
    /// Create an unconnected driver client
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            run_id: RwLock::new(None),
        }
    }

    /// Establish the channel and open a run
    ///
    /// Fails if the configured address cannot be parsed or reached; callers
    /// are expected to treat this as fatal at startup.
    pub async fn connect(&self) -> Result<()> {
        info!("Connecting to registry at {}", self.config.driver_address);
        let endpoint = Endpoint::from_shared(self.config.driver_address.clone())
            .map_err(|e| FedError::InvalidConfig {
                message: format!(
                    "registry address {} cannot be parsed: {e}",
                    self.config.driver_address
                ),
            })?
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout);

        let endpoint = match &self.config.root_certificates {
            Some(pem) => {
                let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
                endpoint
                    .tls_config(tls)
                    .map_err(|e| FedError::InvalidConfig {
                        message: format!("invalid TLS configuration: {e}"),
                    })?
            }
            None => endpoint,
        };

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| FedError::ConnectionFailed {
                endpoint: self.config.driver_address.clone(),
                reason: e.to_string(),
            })?;
        let mut client = DriverClient::new(channel);

        let response = client.create_run(CreateRunRequest {}).await?;
        let run_id = response.into_inner().run_id;
        info!("Connected to registry, run {}", run_id);

        *self.client.write().await = Some(client);
        *self.run_id.write().await = Some(run_id);
        Ok(())
    }

    /// Run id assigned at connect time
    pub async fn run_id(&self) -> Option<i64> {
        *self.run_id.read().await
    }

    /// Currently live nodes as reported by the registry
    pub async fn get_nodes(&self) -> Result<Vec<Node>> {
        let run_id = self.run_id().await.ok_or(FedError::NotConnected)?;
        let mut guard = self.client.write().await;
        let client = guard.as_mut().ok_or(FedError::NotConnected)?;
        let response = client.get_nodes(GetNodesRequest { run_id }).await?;
        Ok(response.into_inner().nodes)
    }

    /// Relay task instructions to the registry; returns assigned task ids
    pub async fn push_task_ins(&self, task_ins_list: Vec<TaskIns>) -> Result<Vec<String>> {
        let mut guard = self.client.write().await;
        let client = guard.as_mut().ok_or(FedError::NotConnected)?;
        let response = client
            .push_task_ins(PushTaskInsRequest { task_ins_list })
            .await?;
        Ok(response.into_inner().task_ids)
    }

    /// Collect results for the given task ids
    pub async fn pull_task_res(
        &self,
        node_id: i64,
        task_ids: Vec<String>,
    ) -> Result<Vec<TaskRes>> {
        let mut guard = self.client.write().await;
        let client = guard.as_mut().ok_or(FedError::NotConnected)?;
        let response = client
            .pull_task_res(PullTaskResRequest {
                node: Some(Node {
                    node_id,
                    anonymous: false,
                }),
                task_ids,
            })
            .await?;
        Ok(response.into_inner().task_res_list)
    }
}

/// Source of the live node set, abstracted for reconciler tests
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// Fetch the currently live node set
    async fn live_nodes(&self) -> Result<Vec<Node>>;
}

#[async_trait]
impl NodeSource for GrpcDriver {
    async fn live_nodes(&self) -> Result<Vec<Node>> {
        self.get_nodes().await
    }
}
