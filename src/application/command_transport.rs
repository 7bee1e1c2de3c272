// Transport trait for delivering commands to the device hub
use crate::domain::control::Command;
use async_trait::async_trait;

#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Deliver a command to the solar manager. An `Err` means the hub did
    /// not accept it.
    async fn send(&self, command: Command) -> anyhow::Result<()>;
}
