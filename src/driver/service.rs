//! Registry-facing Driver service
//!
//! Server side of the Driver API: hands out run ids, reports the live node
//! set, and queues task traffic between drivers and workers over the shared
//! state.

use std::sync::Arc;

use rand::Rng;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::protocol::driver_server::Driver;
use crate::protocol::{
    CreateRunRequest, CreateRunResponse, GetNodesRequest, GetNodesResponse, Node,
    PullTaskResRequest, PullTaskResResponse, PushTaskInsRequest, PushTaskInsResponse,
};
use crate::state::InMemoryState;

/// Driver handler over the shared in-memory state
pub struct DriverService {
    state: Arc<InMemoryState>,
}

impl DriverService {
    /// Create a Driver handler backed by `state`
    pub fn new(state: Arc<InMemoryState>) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl Driver for DriverService {
    async fn create_run(
        &self,
        _request: Request<CreateRunRequest>,
    ) -> Result<Response<CreateRunResponse>, Status> {
        let run_id = self.state.create_run().await;
        debug!("Created run {}", run_id);
        Ok(Response::new(CreateRunResponse { run_id }))
    }

    async fn get_nodes(
        &self,
        _request: Request<GetNodesRequest>,
    ) -> Result<Response<GetNodesResponse>, Status> {
        let nodes = self
            .state
            .get_nodes()
            .await
            .into_iter()
            .map(|node_id| Node {
                node_id,
                anonymous: false,
            })
            .collect();
        Ok(Response::new(GetNodesResponse { nodes }))
    }

    async fn push_task_ins(
        &self,
        request: Request<PushTaskInsRequest>,
    ) -> Result<Response<PushTaskInsResponse>, Status> {
        let mut task_ids = Vec::new();
        for mut task_ins in request.into_inner().task_ins_list {
            if task_ins.task_id.is_empty() {
                task_ins.task_id = format!("{:016x}", rand::thread_rng().gen::<u64>());
            }
            let task_id = self.state.store_task_ins(task_ins).await?;
            task_ids.push(task_id);
        }
        Ok(Response::new(PushTaskInsResponse { task_ids }))
    }

    async fn pull_task_res(
        &self,
        request: Request<PullTaskResRequest>,
    ) -> Result<Response<PullTaskResResponse>, Status> {
        let task_ids = request.into_inner().task_ids;
        let task_res_list = self.state.get_task_res(&task_ids).await;
        Ok(Response::new(PullTaskResResponse { task_res_list }))
    }
}
