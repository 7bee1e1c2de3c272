// Simulated device hub transport
use crate::application::command_transport::CommandTransport;
use crate::domain::control::Command;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stand-in for the cloud message hub. Accepts every command; the network
/// delay is modelled by the dispatcher, not here.
#[derive(Debug)]
pub struct SimulatedHubTransport {
    protocol: String,
    location: String,
    delivered: AtomicU64,
}

impl SimulatedHubTransport {
    pub fn new(protocol: String, location: String) -> Self {
        Self {
            protocol,
            location,
            delivered: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl CommandTransport for SimulatedHubTransport {
    async fn send(&self, command: Command) -> Result<()> {
        let seq = self.delivered.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            "[{}] delivered {} to solar manager on {} (message #{})",
            self.protocol,
            command,
            self.location,
            seq
        );
        Ok(())
    }
}
