//! In-process coordination state
//!
//! Owns the trusted client public keys, the bidirectional public-key ↔
//! node-id binding, per-node liveness records, and the task queues backing
//! the fleet/driver pass-through RPCs. Pure data plus accessors; every
//! operation is safe under concurrent invocation, but multi-step sequences
//! (handshake-or-authenticate decisions) are serialized by the RPC gate's
//! own lock, not here.

use std::collections::{HashMap, HashSet};
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{FedError, Result};
use crate::protocol::{TaskIns, TaskRes};

/// Liveness record for a registered node
#[derive(Debug, Clone)]
struct NodeRecord {
    /// Lease duration in seconds negotiated at registration
    ping_interval: f64,
    /// False once the node is deleted or its lease lapses
    online: bool,
}

/// Shared in-memory state for the coordination plane
#[derive(Default)]
pub struct InMemoryState {
    /// Trusted client public keys, populated once at startup
    client_public_keys: RwLock<HashSet<Vec<u8>>>,
    /// public key -> node id
    key_to_node: RwLock<HashMap<Vec<u8>, i64>>,
    /// node id -> public key (inverse of `key_to_node`)
    node_to_key: RwLock<HashMap<i64, Vec<u8>>>,
    /// node id -> liveness record
    nodes: RwLock<HashMap<i64, NodeRecord>>,
    /// node id -> queued task instructions
    task_ins: RwLock<HashMap<i64, Vec<TaskIns>>>,
    /// task id -> submitted result
    task_res: RwLock<HashMap<String, TaskRes>>,
    /// run ids handed out to drivers
    runs: RwLock<HashSet<i64>>,
}

impl InMemoryState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Trusted key set ----

    /// Replace the trusted client key set; called once at startup
    pub async fn store_client_public_keys(&self, keys: HashSet<Vec<u8>>) {
        info!("Client authentication enabled with {} known public keys", keys.len());
        *self.client_public_keys.write().await = keys;
    }

    /// Whether `public_key` belongs to the trusted set
    pub async fn is_client_public_key_known(&self, public_key: &[u8]) -> bool {
        self.client_public_keys.read().await.contains(public_key)
    }

    /// Read-only snapshot of the trusted key set
    pub async fn get_client_public_keys(&self) -> HashSet<Vec<u8>> {
        self.client_public_keys.read().await.clone()
    }

    // ---- Key <-> node-id binding ----

    /// Current node id bound to `public_key`, if any
    pub async fn get_node_id(&self, public_key: &[u8]) -> Option<i64> {
        self.key_to_node.read().await.get(public_key).copied()
    }

    /// Establish or overwrite the binding between a key and a node id
    ///
    /// Both directions are updated together: a key rebinding to a new id
    /// releases its old id, and an id rebinding to a new key releases its
    /// old key, so each side maps to at most one counterpart.
    pub async fn store_node_id_client_public_key_pair(&self, public_key: Vec<u8>, node_id: i64) {
        let mut forward = self.key_to_node.write().await;
        let mut reverse = self.node_to_key.write().await;
        if let Some(old_id) = forward.insert(public_key.clone(), node_id) {
            if old_id != node_id {
                reverse.remove(&old_id);
            }
        }
        if let Some(old_key) = reverse.insert(node_id, public_key.clone()) {
            if old_key != public_key {
                forward.remove(&old_key);
            }
        }
    }

    // ---- Node lifecycle ----

    /// Register a new node and return its freshly minted id
    ///
    /// Ids are random positive integers, collision-checked under the write
    /// lock so they are never reused while the previous holder is alive.
    pub async fn create_node(&self, ping_interval: f64) -> i64 {
        let mut nodes = self.nodes.write().await;
        let mut rng = rand::thread_rng();
        let node_id = loop {
            let candidate: i64 = rng.gen_range(1..i64::MAX);
            if !nodes.contains_key(&candidate) {
                break candidate;
            }
        };
        nodes.insert(
            node_id,
            NodeRecord {
                ping_interval,
                online: true,
            },
        );
        info!("Registered node {}", node_id);
        node_id
    }

    /// Mark a previously known node live again with a refreshed lease
    pub async fn restore_node(&self, node_id: i64, ping_interval: f64) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        let record = nodes
            .get_mut(&node_id)
            .ok_or(FedError::NodeNotRegistered { node_id })?;
        record.online = true;
        record.ping_interval = ping_interval;
        debug!("Restored node {} with ping interval {}s", node_id, ping_interval);
        Ok(())
    }

    /// Remove a node and its key binding
    pub async fn delete_node(&self, node_id: i64) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        if nodes.remove(&node_id).is_none() {
            return Err(FedError::NodeNotRegistered { node_id });
        }
        drop(nodes);

        let mut forward = self.key_to_node.write().await;
        let mut reverse = self.node_to_key.write().await;
        if let Some(key) = reverse.remove(&node_id) {
            forward.remove(&key);
        }
        self.task_ins.write().await.remove(&node_id);
        info!("Deleted node {}", node_id);
        Ok(())
    }

    /// Ids of all currently live nodes
    pub async fn get_nodes(&self) -> Vec<i64> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|(_, record)| record.online)
            .map(|(id, _)| *id)
            .collect()
    }

    // ---- Task plumbing ----

    /// Queue an instruction for its consumer node; returns the task id
    pub async fn store_task_ins(&self, task: TaskIns) -> Result<String> {
        let consumer = task
            .task
            .as_ref()
            .and_then(|t| t.consumer.as_ref())
            .map(|n| n.node_id)
            .ok_or(FedError::InvalidConfig {
                message: "task instruction has no consumer node".into(),
            })?;
        let task_id = task.task_id.clone();
        self.task_ins
            .write()
            .await
            .entry(consumer)
            .or_default()
            .push(task);
        Ok(task_id)
    }

    /// Drain queued instructions for `node_id`
    pub async fn get_task_ins(&self, node_id: i64) -> Vec<TaskIns> {
        self.task_ins
            .write()
            .await
            .remove(&node_id)
            .unwrap_or_default()
    }

    /// Record a submitted result
    pub async fn store_task_res(&self, task: TaskRes) {
        self.task_res.write().await.insert(task.task_id.clone(), task);
    }

    /// Take results for the given task ids, leaving unfinished ones pending
    pub async fn get_task_res(&self, task_ids: &[String]) -> Vec<TaskRes> {
        let mut results = self.task_res.write().await;
        task_ids.iter().filter_map(|id| results.remove(id)).collect()
    }

    // ---- Runs ----

    /// Mint a new run id for a connecting driver
    pub async fn create_run(&self) -> i64 {
        let mut runs = self.runs.write().await;
        let mut rng = rand::thread_rng();
        let run_id = loop {
            let candidate: i64 = rng.gen_range(1..i64::MAX);
            if !runs.contains(&candidate) {
                break candidate;
            }
        };
        runs.insert(run_id);
        run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trusted_key_membership() {
        let state = InMemoryState::new();
        let keys: HashSet<Vec<u8>> = [vec![1u8, 2, 3]].into_iter().collect();
        state.store_client_public_keys(keys).await;

        assert!(state.is_client_public_key_known(&[1, 2, 3]).await);
        assert!(!state.is_client_public_key_known(&[9, 9, 9]).await);
    }

    #[tokio::test]
    async fn test_key_binding_is_bidirectionally_unique() {
        let state = InMemoryState::new();
        let key_a = vec![0xAu8];
        let key_b = vec![0xBu8];

        state.store_node_id_client_public_key_pair(key_a.clone(), 1).await;
        assert_eq!(state.get_node_id(&key_a).await, Some(1));

        // Rebinding the key to a new id releases the old id.
        state.store_node_id_client_public_key_pair(key_a.clone(), 2).await;
        assert_eq!(state.get_node_id(&key_a).await, Some(2));

        // Rebinding the id to a new key releases the old key.
        state.store_node_id_client_public_key_pair(key_b.clone(), 2).await;
        assert_eq!(state.get_node_id(&key_b).await, Some(2));
        assert_eq!(state.get_node_id(&key_a).await, None);
    }

    #[tokio::test]
    async fn test_node_lifecycle() {
        let state = InMemoryState::new();
        let node_id = state.create_node(30.0).await;
        assert!(state.get_nodes().await.contains(&node_id));

        state.restore_node(node_id, 60.0).await.unwrap();
        assert!(state.get_nodes().await.contains(&node_id));

        state.delete_node(node_id).await.unwrap();
        assert!(state.get_nodes().await.is_empty());
        assert!(matches!(
            state.delete_node(node_id).await,
            Err(FedError::NodeNotRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_restore_unknown_node_fails() {
        let state = InMemoryState::new();
        assert!(state.restore_node(404, 30.0).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_node_clears_binding() {
        let state = InMemoryState::new();
        let key = vec![0xCu8];
        let node_id = state.create_node(30.0).await;
        state.store_node_id_client_public_key_pair(key.clone(), node_id).await;

        state.delete_node(node_id).await.unwrap();
        assert_eq!(state.get_node_id(&key).await, None);
    }

    #[tokio::test]
    async fn test_task_queue_round_trip() {
        use crate::protocol::{Node, Task, TaskIns};

        let state = InMemoryState::new();
        let node_id = state.create_node(30.0).await;
        let ins = TaskIns {
            task_id: "t-1".into(),
            group_id: "g-1".into(),
            run_id: 7,
            task: Some(Task {
                producer: None,
                consumer: Some(Node { node_id, anonymous: false }),
                task_type: "train".into(),
                payload: vec![1, 2, 3],
            }),
        };

        let task_id = state.store_task_ins(ins).await.unwrap();
        assert_eq!(task_id, "t-1");

        let queued = state.get_task_ins(node_id).await;
        assert_eq!(queued.len(), 1);
        // Drained on read.
        assert!(state.get_task_ins(node_id).await.is_empty());
    }
}
