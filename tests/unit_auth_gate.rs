//! Unit tests for the authenticating RPC gate
//!
//! Exercises the handshake, reconnect-restores-identity, unknown-key
//! rejection, and the HMAC-or-bound-id session check, all against the gate
//! in-process.

use std::collections::HashSet;
use std::sync::Arc;

use prost::Message;
use tonic::{Code, Request};

use fedlink_core::crypto;
use fedlink_core::fleet::gate::{AUTH_TOKEN_HEADER, PUBLIC_KEY_HEADER};
use fedlink_core::fleet::{AuthGate, FleetService};
use fedlink_core::protocol::fleet_server::Fleet;
use fedlink_core::protocol::{
    CreateNodeRequest, DeleteNodeRequest, Node, PullTaskInsRequest, PushTaskResRequest, Task,
    TaskRes,
};
use fedlink_core::state::InMemoryState;

struct Harness {
    gate: AuthGate<FleetService>,
    state: Arc<InMemoryState>,
    client_secret: p256::SecretKey,
    client_public_b64: String,
    shared_key: [u8; 32],
}

async fn harness() -> Harness {
    let (server_secret, server_public) = crypto::generate_key_pair();
    let (client_secret, client_public) = crypto::generate_key_pair();
    let client_public_bytes = crypto::public_key_to_bytes(&client_public);

    let trusted: HashSet<Vec<u8>> = [client_public_bytes.clone()].into_iter().collect();
    let state = Arc::new(InMemoryState::new());
    let gate = AuthGate::new(
        FleetService::new(Arc::clone(&state)),
        Arc::clone(&state),
        trusted,
        server_secret,
        server_public,
    )
    .await;

    let shared_key = crypto::generate_shared_key(&client_secret, &server_public).unwrap();

    Harness {
        gate,
        state,
        client_secret,
        client_public_b64: crypto::encode_base64(&client_public_bytes),
        shared_key,
    }
}

fn with_public_key<M>(message: M, public_key_b64: &str) -> Request<M> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(PUBLIC_KEY_HEADER, public_key_b64.parse().unwrap());
    request
}

fn with_token<M: Message>(message: M, public_key_b64: &str, token: &[u8]) -> Request<M> {
    let mut request = with_public_key(message, public_key_b64);
    request
        .metadata_mut()
        .insert(AUTH_TOKEN_HEADER, crypto::encode_base64(token).parse().unwrap());
    request
}

fn sign<M: Message>(message: &M, shared_key: &[u8; 32]) -> Vec<u8> {
    crypto::compute_hmac(shared_key, &message.encode_to_vec())
}

fn push_request(consumer_node_id: i64) -> PushTaskResRequest {
    PushTaskResRequest {
        task_res_list: vec![TaskRes {
            task_id: "t-1".into(),
            group_id: String::new(),
            run_id: 1,
            task: Some(Task {
                producer: None,
                consumer: Some(Node {
                    node_id: consumer_node_id,
                    anonymous: false,
                }),
                task_type: "train".into(),
                payload: vec![],
            }),
        }],
    }
}

#[tokio::test]
async fn test_handshake_scenario() {
    let h = harness().await;

    // First contact: fresh node id, server key in response metadata,
    // binding persisted.
    let request = with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64);
    let response = h.gate.create_node(request).await.unwrap();

    let server_key_b64 = response
        .metadata()
        .get(PUBLIC_KEY_HEADER)
        .expect("server public key in response metadata")
        .to_str()
        .unwrap()
        .to_owned();
    let server_public =
        crypto::public_key_from_bytes(&crypto::decode_base64(&server_key_b64).unwrap()).unwrap();
    // The advertised key must yield the same shared secret the client
    // derived out of band.
    assert_eq!(
        crypto::generate_shared_key(&h.client_secret, &server_public).unwrap(),
        h.shared_key
    );

    let node_id = response.into_inner().node.unwrap().node_id;
    assert!(node_id > 0);

    let client_public = crypto::decode_base64(&h.client_public_b64).unwrap();
    assert_eq!(h.state.get_node_id(&client_public).await, Some(node_id));

    // Reconnect with the same key: same id, not a fresh one.
    let request = with_public_key(CreateNodeRequest { ping_interval: 45.0 }, &h.client_public_b64);
    let response = h.gate.create_node(request).await.unwrap();
    assert!(response.metadata().get(PUBLIC_KEY_HEADER).is_some());
    assert_eq!(response.into_inner().node.unwrap().node_id, node_id);

    // Still exactly one live node.
    assert_eq!(h.state.get_nodes().await, vec![node_id]);
}

#[tokio::test]
async fn test_reconnect_after_delete_mints_fresh_id() {
    let h = harness().await;

    let request = with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64);
    let first = h.gate.create_node(request).await.unwrap().into_inner().node.unwrap().node_id;

    h.state.delete_node(first).await.unwrap();

    let request = with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64);
    let second = h.gate.create_node(request).await.unwrap().into_inner().node.unwrap().node_id;
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_unknown_key_rejected_before_any_mutation() {
    let h = harness().await;
    let (_, intruder_public) = crypto::generate_key_pair();
    let intruder_b64 = crypto::encode_base64(&crypto::public_key_to_bytes(&intruder_public));

    let status = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &intruder_b64))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = h
        .gate
        .delete_node(with_public_key(
            DeleteNodeRequest {
                node: Some(Node { node_id: 1, anonymous: false }),
            },
            &intruder_b64,
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = h
        .gate
        .pull_task_ins(with_public_key(
            PullTaskInsRequest {
                node: Some(Node { node_id: 1, anonymous: false }),
                task_ids: vec![],
            },
            &intruder_b64,
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = h
        .gate
        .push_task_res(with_public_key(push_request(1), &intruder_b64))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    // No state mutation happened on any of the rejected calls.
    assert!(h.state.get_nodes().await.is_empty());
    let intruder_bytes = crypto::decode_base64(&intruder_b64).unwrap();
    assert_eq!(h.state.get_node_id(&intruder_bytes).await, None);
}

#[tokio::test]
async fn test_missing_public_key_header_rejected() {
    let h = harness().await;
    let status = h
        .gate
        .create_node(Request::new(CreateNodeRequest { ping_interval: 30.0 }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn test_session_call_with_valid_token_accepted_despite_id_mismatch() {
    let h = harness().await;

    let node_id = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64))
        .await
        .unwrap()
        .into_inner()
        .node
        .unwrap()
        .node_id;

    // Request names a node id other than the bound one, but the token is
    // genuine; either check passing is sufficient.
    let message = PullTaskInsRequest {
        node: Some(Node { node_id: node_id ^ 1, anonymous: false }),
        task_ids: vec![],
    };
    let token = sign(&message, &h.shared_key);
    let response = h
        .gate
        .pull_task_ins(with_token(message, &h.client_public_b64, &token))
        .await;
    assert!(response.is_ok());
}

#[tokio::test]
async fn test_session_call_with_bad_token_and_id_mismatch_rejected() {
    let h = harness().await;

    let node_id = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64))
        .await
        .unwrap()
        .into_inner()
        .node
        .unwrap()
        .node_id;

    let message = PullTaskInsRequest {
        node: Some(Node { node_id: node_id ^ 1, anonymous: false }),
        task_ids: vec![],
    };
    let status = h
        .gate
        .pull_task_ins(with_token(message, &h.client_public_b64, b"not-a-real-token"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn test_session_call_with_bad_token_but_matching_id_accepted() {
    let h = harness().await;

    let node_id = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64))
        .await
        .unwrap()
        .into_inner()
        .node
        .unwrap()
        .node_id;

    let message = PullTaskInsRequest {
        node: Some(Node { node_id, anonymous: false }),
        task_ids: vec![],
    };
    let response = h
        .gate
        .pull_task_ins(with_token(message, &h.client_public_b64, b"not-a-real-token"))
        .await;
    assert!(response.is_ok());
}

#[tokio::test]
async fn test_push_task_res_identifies_caller_by_consumer_reference() {
    let h = harness().await;

    let node_id = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64))
        .await
        .unwrap()
        .into_inner()
        .node
        .unwrap()
        .node_id;

    // Bad token, but the first result's consumer matches the bound id.
    let message = push_request(node_id);
    let response = h
        .gate
        .push_task_res(with_token(message, &h.client_public_b64, b"bogus"))
        .await;
    assert!(response.is_ok());

    // Bad token and a consumer reference for someone else: rejected.
    let message = push_request(node_id ^ 1);
    let status = h
        .gate
        .push_task_res(with_token(message, &h.client_public_b64, b"bogus"))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn test_delete_node_with_valid_token() {
    let h = harness().await;

    let node_id = h
        .gate
        .create_node(with_public_key(CreateNodeRequest { ping_interval: 30.0 }, &h.client_public_b64))
        .await
        .unwrap()
        .into_inner()
        .node
        .unwrap()
        .node_id;

    let message = DeleteNodeRequest {
        node: Some(Node { node_id, anonymous: false }),
    };
    let token = sign(&message, &h.shared_key);
    h.gate
        .delete_node(with_token(message, &h.client_public_b64, &token))
        .await
        .unwrap();

    assert!(h.state.get_nodes().await.is_empty());
}
