//! Per-node client proxy
//!
//! Stand-in for a single remote worker: turns "send this task to node N"
//! into Driver API calls, scoped to the run established when the driver
//! connected.

use std::sync::Arc;

use crate::driver::GrpcDriver;
use crate::error::{FedError, Result};
use crate::protocol::{Node, Task, TaskIns, TaskRes};

/// Handle for dispatching tasks to one worker through the driver
pub struct DriverClientProxy {
    node_id: i64,
    driver: Arc<GrpcDriver>,
    run_id: i64,
}

impl DriverClientProxy {
    /// Create a proxy for `node_id` over a shared driver
    pub fn new(node_id: i64, driver: Arc<GrpcDriver>, run_id: i64) -> Self {
        Self {
            node_id,
            driver,
            run_id,
        }
    }

    /// Node id this proxy addresses
    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    /// Send a task to this node; returns the registry-assigned task id
    pub async fn send_task(&self, task_type: &str, payload: Vec<u8>) -> Result<String> {
        let task_ins = TaskIns {
            task_id: String::new(),
            group_id: String::new(),
            run_id: self.run_id,
            task: Some(Task {
                producer: None,
                consumer: Some(Node {
                    node_id: self.node_id,
                    anonymous: false,
                }),
                task_type: task_type.into(),
                payload,
            }),
        };
        let mut task_ids = self.driver.push_task_ins(vec![task_ins]).await?;
        task_ids.pop().ok_or(FedError::InvalidConfig {
            message: "registry returned no task id".into(),
        })
    }

    /// Collect any finished results for the given task ids
    pub async fn collect(&self, task_ids: Vec<String>) -> Result<Vec<TaskRes>> {
        self.driver.pull_task_res(self.node_id, task_ids).await
    }
}
