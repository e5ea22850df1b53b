//! Superlink service binary
//!
//! Serves the registry-facing Driver API and the worker-facing Fleet API
//! over one listener. Client authentication is enabled by pointing
//! CLIENT_KEYS_FILE at a file of base64 URL-safe public keys, one per line.

use std::collections::HashSet;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::{info, warn};

use fedlink_core::crypto;
use fedlink_core::driver::DriverService;
use fedlink_core::fleet::{AuthGate, FleetService};
use fedlink_core::protocol::driver_server::DriverServer;
use fedlink_core::protocol::fleet_server::FleetServer;
use fedlink_core::state::InMemoryState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting superlink");

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9092".into());
    let addr = bind_addr.parse()?;

    let state = Arc::new(InMemoryState::new());
    let driver_service = DriverServer::new(DriverService::new(Arc::clone(&state)));
    let fleet_service = FleetService::new(Arc::clone(&state));

    info!("Superlink listening on {}", addr);

    match std::env::var("CLIENT_KEYS_FILE") {
        Ok(path) => {
            let client_keys = load_trusted_keys(&path)?;
            let (secret_key, public_key) = crypto::generate_key_pair();
            let gate = AuthGate::new(
                fleet_service,
                Arc::clone(&state),
                client_keys,
                secret_key,
                public_key,
            )
            .await;

            Server::builder()
                .add_service(driver_service)
                .add_service(FleetServer::new(gate))
                .serve(addr)
                .await?;
        }
        Err(_) => {
            warn!("CLIENT_KEYS_FILE not set; client authentication is disabled");
            Server::builder()
                .add_service(driver_service)
                .add_service(FleetServer::new(fleet_service))
                .serve(addr)
                .await?;
        }
    }

    Ok(())
}

/// Load the trusted client key set from a file of base64 lines
fn load_trusted_keys(path: &str) -> Result<HashSet<Vec<u8>>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let mut keys = HashSet::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        keys.insert(crypto::decode_base64(line)?);
    }
    if keys.is_empty() {
        return Err(format!("no trusted keys found in {path}").into());
    }
    info!("Loaded {} trusted client key(s)", keys.len());
    Ok(keys)
}
