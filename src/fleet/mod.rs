//! Worker-facing Fleet service
//!
//! `FleetService` is the downstream handler: it applies registration,
//! deregistration, and task-exchange calls to the shared state. It performs
//! no authentication of its own; wrap it in [`gate::AuthGate`] to enforce
//! client authentication.

pub mod gate;

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::protocol::fleet_server::Fleet;
use crate::protocol::{
    CreateNodeRequest, CreateNodeResponse, DeleteNodeRequest, DeleteNodeResponse, Node,
    PullTaskInsRequest, PullTaskInsResponse, PushTaskResRequest, PushTaskResResponse,
};
use crate::state::InMemoryState;

pub use gate::AuthGate;

/// Fleet handler over the shared in-memory state
pub struct FleetService {
    state: Arc<InMemoryState>,
}

impl FleetService {
    /// Create a Fleet handler backed by `state`
    pub fn new(state: Arc<InMemoryState>) -> Self {
        Self { state }
    }
}

#[tonic::async_trait]
impl Fleet for FleetService {
    async fn create_node(
        &self,
        request: Request<CreateNodeRequest>,
    ) -> Result<Response<CreateNodeResponse>, Status> {
        let ping_interval = request.into_inner().ping_interval;
        let node_id = self.state.create_node(ping_interval).await;
        Ok(Response::new(CreateNodeResponse {
            node: Some(Node {
                node_id,
                anonymous: false,
            }),
        }))
    }

    async fn delete_node(
        &self,
        request: Request<DeleteNodeRequest>,
    ) -> Result<Response<DeleteNodeResponse>, Status> {
        let node = request
            .into_inner()
            .node
            .ok_or_else(|| Status::invalid_argument("missing node"))?;
        self.state.delete_node(node.node_id).await?;
        Ok(Response::new(DeleteNodeResponse {}))
    }

    async fn pull_task_ins(
        &self,
        request: Request<PullTaskInsRequest>,
    ) -> Result<Response<PullTaskInsResponse>, Status> {
        let node = request
            .into_inner()
            .node
            .ok_or_else(|| Status::invalid_argument("missing node"))?;
        let task_ins_list = self.state.get_task_ins(node.node_id).await;
        debug!(
            "Node {} pulled {} task instruction(s)",
            node.node_id,
            task_ins_list.len()
        );
        Ok(Response::new(PullTaskInsResponse { task_ins_list }))
    }

    async fn push_task_res(
        &self,
        request: Request<PushTaskResRequest>,
    ) -> Result<Response<PushTaskResResponse>, Status> {
        let task_res_list = request.into_inner().task_res_list;
        debug!("Received {} task result(s)", task_res_list.len());
        for task_res in task_res_list {
            self.state.store_task_res(task_res).await;
        }
        Ok(Response::new(PushTaskResResponse {}))
    }
}
