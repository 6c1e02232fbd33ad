//! TCP reachability probe for domain controllers.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::net::TcpStream;

use super::ReachabilityProbe;
use crate::error::ProbeFailure;

/// Probes a controller by opening a TCP connection to a directory port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl ReachabilityProbe for TcpProbe {
    async fn is_reachable(&self, controller: &str) -> Result<bool, ProbeFailure> {
        let address = format!("{controller}:{}", self.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(_stream)) => Ok(true),
            Err(_elapsed) => Ok(false),
            Ok(Err(e)) => match e.kind() {
                ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut => Ok(false),
                _ => Err(ProbeFailure {
                    controller: controller.to_string(),
                    source: e,
                }),
            },
        }
    }
}
