//! Authenticating RPC gate
//!
//! Wraps a [`Fleet`] implementation and enforces client authentication on
//! every call: first-contact registration exchanges public keys and restores
//! prior node identities, all later calls carry an HMAC token derived from
//! the ECDH shared secret. The whole per-call sequence runs under a single
//! lock so key↔id bindings stay linearizable across concurrent callers.

use std::collections::HashSet;
use std::sync::Arc;

use prost::Message;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::crypto;
use crate::error::FedError;
use crate::protocol::fleet_server::Fleet;
use crate::protocol::{
    CreateNodeRequest, CreateNodeResponse, DeleteNodeRequest, DeleteNodeResponse, Node,
    PullTaskInsRequest, PullTaskInsResponse, PushTaskResRequest, PushTaskResResponse,
};
use crate::state::InMemoryState;

/// Metadata header carrying the caller's (or server's) public key
pub const PUBLIC_KEY_HEADER: &str = "public-key";
/// Metadata header carrying the per-call HMAC token
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Authenticating wrapper around a Fleet handler
pub struct AuthGate<S> {
    inner: S,
    state: Arc<InMemoryState>,
    server_secret_key: p256::SecretKey,
    server_public_key_bytes: Vec<u8>,
    /// Serializes the full key-lookup → branch → mutation sequence per call.
    lock: tokio::sync::Mutex<()>,
}

impl<S: Fleet> AuthGate<S> {
    /// Create a gate around `inner`, seeding the trusted client key set
    pub async fn new(
        inner: S,
        state: Arc<InMemoryState>,
        client_public_keys: HashSet<Vec<u8>>,
        server_secret_key: p256::SecretKey,
        server_public_key: p256::PublicKey,
    ) -> Self {
        state.store_client_public_keys(client_public_keys).await;
        Self {
            inner,
            state,
            server_secret_key,
            server_public_key_bytes: crypto::public_key_to_bytes(&server_public_key),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Extract and decode a base64 metadata header
    fn metadata_bytes(metadata: &MetadataMap, header: &str) -> Result<Vec<u8>, Status> {
        let value = metadata
            .get(header)
            .ok_or_else(|| Status::from(FedError::Unauthenticated))?
            .to_str()
            .map_err(|_| Status::from(FedError::Unauthenticated))?;
        crypto::decode_base64(value).map_err(|_| Status::from(FedError::Unauthenticated))
    }

    /// Resolve the caller's public key and check it against the trusted set
    async fn authenticate(&self, metadata: &MetadataMap) -> Result<Vec<u8>, Status> {
        let public_key = Self::metadata_bytes(metadata, PUBLIC_KEY_HEADER)?;
        if !self.state.is_client_public_key_known(&public_key).await {
            debug!("Rejected call from unknown public key");
            return Err(Status::from(FedError::Unauthenticated));
        }
        Ok(public_key)
    }

    /// Attach the server's public key to response metadata
    fn attach_server_key(&self, metadata: &mut MetadataMap) -> Result<(), Status> {
        let encoded = crypto::encode_base64(&self.server_public_key_bytes);
        let value = MetadataValue::try_from(encoded.as_str())
            .map_err(|_| Status::internal("server public key not encodable as metadata"))?;
        metadata.insert(PUBLIC_KEY_HEADER, value);
        Ok(())
    }

    /// Validate a session-authenticated call
    ///
    /// Accepts when the HMAC over the serialized body verifies against the
    /// ECDH-derived secret, or when the request's node id matches the id
    /// currently bound to the caller's key; rejects only when both checks
    /// fail.
    async fn verify_session<M: Message>(
        &self,
        metadata: &MetadataMap,
        client_public_key: &[u8],
        body: &M,
        request_node_id: Option<i64>,
    ) -> Result<(), Status> {
        let token_valid = match Self::metadata_bytes(metadata, AUTH_TOKEN_HEADER) {
            Ok(token) => {
                let shared_key = crypto::public_key_from_bytes(client_public_key)
                    .and_then(|public_key| {
                        crypto::generate_shared_key(&self.server_secret_key, &public_key)
                    });
                match shared_key {
                    Ok(shared_key) => {
                        crypto::verify_hmac(&shared_key, &body.encode_to_vec(), &token)
                    }
                    Err(FedError::Crypto { message }) => {
                        debug!("Shared key derivation failed: {}", message);
                        false
                    }
                    Err(_) => false,
                }
            }
            Err(_) => false,
        };

        let bound_node_id = self.state.get_node_id(client_public_key).await;
        let id_matches = request_node_id.is_some() && bound_node_id == request_node_id;

        if !token_valid && !id_matches {
            debug!("Rejected session call: bad token and unbound node id");
            return Err(Status::from(FedError::Unauthenticated));
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl<S: Fleet> Fleet for AuthGate<S> {
    async fn create_node(
        &self,
        request: Request<CreateNodeRequest>,
    ) -> Result<Response<CreateNodeResponse>, Status> {
        let _guard = self.lock.lock().await;
        let client_public_key = self.authenticate(request.metadata()).await?;
        let message = request.into_inner();

        if let Some(node_id) = self.state.get_node_id(&client_public_key).await {
            // Reconnecting worker: refresh the lease and hand back the id it
            // held before, without touching the downstream handler.
            match self.state.restore_node(node_id, message.ping_interval).await {
                Ok(()) => {
                    self.state
                        .store_node_id_client_public_key_pair(client_public_key, node_id)
                        .await;
                    info!("Node {} reconnected", node_id);
                    let mut response = Response::new(CreateNodeResponse {
                        node: Some(Node {
                            node_id,
                            anonymous: false,
                        }),
                    });
                    self.attach_server_key(response.metadata_mut())?;
                    return Ok(response);
                }
                Err(FedError::NodeNotRegistered { .. }) => {
                    // Stale binding with no node record behind it; fall
                    // through and register from scratch.
                    debug!("Binding for node {} was stale; re-registering", node_id);
                }
                Err(other) => return Err(other.into()),
            }
        }

        let mut response = self.inner.create_node(Request::new(message)).await?;
        if let Some(node) = response.get_ref().node {
            self.state
                .store_node_id_client_public_key_pair(client_public_key, node.node_id)
                .await;
        }
        self.attach_server_key(response.metadata_mut())?;
        Ok(response)
    }

    async fn delete_node(
        &self,
        request: Request<DeleteNodeRequest>,
    ) -> Result<Response<DeleteNodeResponse>, Status> {
        let _guard = self.lock.lock().await;
        let client_public_key = self.authenticate(request.metadata()).await?;
        let request_node_id = request.get_ref().node.as_ref().map(|n| n.node_id);
        self.verify_session(
            request.metadata(),
            &client_public_key,
            request.get_ref(),
            request_node_id,
        )
        .await?;
        self.inner.delete_node(Request::new(request.into_inner())).await
    }

    async fn pull_task_ins(
        &self,
        request: Request<PullTaskInsRequest>,
    ) -> Result<Response<PullTaskInsResponse>, Status> {
        let _guard = self.lock.lock().await;
        let client_public_key = self.authenticate(request.metadata()).await?;
        let request_node_id = request.get_ref().node.as_ref().map(|n| n.node_id);
        self.verify_session(
            request.metadata(),
            &client_public_key,
            request.get_ref(),
            request_node_id,
        )
        .await?;
        self.inner
            .pull_task_ins(Request::new(request.into_inner()))
            .await
    }

    async fn push_task_res(
        &self,
        request: Request<PushTaskResRequest>,
    ) -> Result<Response<PushTaskResResponse>, Status> {
        let _guard = self.lock.lock().await;
        let client_public_key = self.authenticate(request.metadata()).await?;
        // The caller is identified by the first result's consumer reference.
        let request_node_id = request
            .get_ref()
            .task_res_list
            .first()
            .and_then(|res| res.task.as_ref())
            .and_then(|task| task.consumer.as_ref())
            .map(|node| node.node_id);
        self.verify_session(
            request.metadata(),
            &client_public_key,
            request.get_ref(),
            request_node_id,
        )
        .await?;
        self.inner
            .push_task_res(Request::new(request.into_inner()))
            .await
    }
}
