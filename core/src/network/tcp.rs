//! # Connectivity Prober
//!
//! A plain TCP connect against the SSH port. The stream (or the pending
//! connect) is dropped on every path, which closes the socket.

use std::net::SocketAddr;
use std::time::Duration;

use fleetr_common::Result;
use fleetr_common::network::address::Address;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Probes `address:port`, validating the address first.
///
/// Returns `Err(InvalidAddress)` for a malformed address and `Ok(false)` for
/// a host that does not accept the connection in time.
pub async fn probe(address: &str, port: u16, connect_timeout: Option<Duration>) -> Result<bool> {
    let address: Address = address.parse()?;
    Ok(probe_address(address, port, connect_timeout).await)
}

/// Probes an already validated address.
///
/// Without `connect_timeout` the platform's TCP connect timeout applies.
pub async fn probe_address(address: Address, port: u16, connect_timeout: Option<Duration>) -> bool {
    let socket_addr: SocketAddr = SocketAddr::new(address.ip(), port);
    let connect = TcpStream::connect(socket_addr);

    let outcome = match connect_timeout {
        Some(limit) => match timeout(limit, connect).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                debug!("Probe to {socket_addr} timed out after {limit:?}");
                return false;
            }
        },
        None => connect.await,
    };

    match outcome {
        Ok(_stream) => true,
        Err(e) => {
            debug!("Probe to {socket_addr} failed: {e}");
            false
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
