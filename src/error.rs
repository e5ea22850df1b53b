//! Error types for the coordination plane
//!
//! Covers authentication, node coordination, transport, and configuration
//! failures.

use thiserror::Error;

/// Primary error type for all coordination-plane operations
#[derive(Debug, Error)]
pub enum FedError {
    // ========== Authentication Errors ==========

    /// Caller could not be authenticated. The message is deliberately
    /// uniform: it never distinguishes an unknown key from a bad token.
    #[error("Access denied")]
    Unauthenticated,

    /// Crypto primitive failed (key parsing, secret derivation)
    #[error("Crypto operation failed: {message}")]
    Crypto { message: String },

    // ========== Coordination Errors ==========

    /// A proxy for this node id is already registered
    #[error("Node {node_id} already registered")]
    DuplicateNode { node_id: i64 },

    /// Node id has no record in the registry
    #[error("Node {node_id} not registered")]
    NodeNotRegistered { node_id: i64 },

    /// Unexpected internal failure (task panic, broken invariant)
    #[error("Internal error: {message}")]
    Internal { message: String },

    // ========== Transport Errors ==========

    /// Connection to a remote service failed
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Client method called before `connect()`
    #[error("Driver not connected; call connect() first")]
    NotConnected,

    /// Remote call returned an error status
    #[error("RPC failed: {status}")]
    Rpc { status: tonic::Status },

    // ========== Configuration Errors ==========

    /// Address or other startup configuration could not be parsed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl From<tonic::Status> for FedError {
    fn from(status: tonic::Status) -> Self {
        FedError::Rpc { status }
    }
}

impl From<FedError> for tonic::Status {
    fn from(err: FedError) -> Self {
        match err {
            FedError::Unauthenticated => tonic::Status::unauthenticated("Access denied"),
            FedError::NodeNotRegistered { .. } => tonic::Status::not_found(err.to_string()),
            FedError::Rpc { status } => status,
            other => tonic::Status::internal(other.to_string()),
        }
    }
}

/// Result type alias for coordination-plane operations
pub type Result<T> = std::result::Result<T, FedError>;
