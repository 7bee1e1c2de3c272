// Control service - Dispatches commands to the solar manager and tracks its status
use crate::application::command_transport::CommandTransport;
use crate::domain::control::{Command, CommandRejection, ConnectionStatus, ControlState, SystemStatus};
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct DispatchTimings {
    /// Simulated network round trip before a command is acknowledged
    pub latency: Duration,
    /// Time a restart spends in `Restarting` before reporting `Running`
    pub restart_delay: Duration,
}

impl Default for DispatchTimings {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1500),
            restart_delay: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] CommandRejection),
    #[error("another command is still in flight")]
    Busy,
    #[error("failed to send {command} to the device hub: {reason}")]
    Transport { command: Command, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub command: Command,
    pub status: SystemStatus,
    pub acknowledged_at: DateTime<Local>,
}

impl Acknowledgement {
    pub fn message(&self) -> &'static str {
        match self.command {
            Command::Restart => "Restart command sent successfully",
            Command::Pause => "Solar management paused",
            Command::Resume => "Solar management resumed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlSnapshot {
    pub state: ControlState,
    pub busy: bool,
    pub available: Vec<Command>,
}

/// Sends one command at a time through a `CommandTransport` and applies the
/// resulting status transition once the hub acknowledges it.
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn CommandTransport>,
    state: Arc<RwLock<ControlState>>,
    busy: Arc<AtomicBool>,
    timings: DispatchTimings,
}

/// Holds the busy flag for the lifetime of one dispatch, including when the
/// dispatch future is dropped half way.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CommandDispatcher {
    pub fn new(
        transport: Arc<dyn CommandTransport>,
        connection: ConnectionStatus,
        timings: DispatchTimings,
    ) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(ControlState::new(connection))),
            busy: Arc::new(AtomicBool::new(false)),
            timings,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> ControlSnapshot {
        let state = self.state.read().await.clone();
        let busy = self.is_busy();
        let available = if busy {
            Vec::new()
        } else {
            state.available_commands()
        };
        ControlSnapshot {
            state,
            busy,
            available,
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<Acknowledgement, DispatchError> {
        let _busy = BusyGuard::acquire(&self.busy).ok_or_else(|| {
            tracing::warn!("Rejecting {}: another command is pending", command);
            DispatchError::Busy
        })?;

        {
            let mut state = self.state.write().await;
            if let Err(rejection) = state.check(command) {
                tracing::warn!("Rejecting {}: {}", command, rejection);
                return Err(rejection.into());
            }
            *state = state.clone().record(command, Local::now());
        }

        tracing::info!("Sending {} to device hub", command);
        tokio::time::sleep(self.timings.latency).await;

        if let Err(e) = self.transport.send(command).await {
            tracing::warn!("Device hub rejected {}: {:#}", command, e);
            return Err(DispatchError::Transport {
                command,
                reason: format!("{:#}", e),
            });
        }

        let (status, epoch) = {
            let mut state = self.state.write().await;
            *state = state.clone().apply(command);
            (state.system, state.restart_epoch)
        };

        if command == Command::Restart {
            self.schedule_restart_completion(epoch);
        }

        tracing::info!("Device hub acknowledged {}, system is {}", command, status);
        Ok(Acknowledgement {
            command,
            status,
            acknowledged_at: Local::now(),
        })
    }

    fn schedule_restart_completion(&self, epoch: u64) {
        let state = self.state.clone();
        let deadline = tokio::time::Instant::now() + self.timings.restart_delay;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut state = state.write().await;
            *state = state.clone().complete_restart(epoch);
            tracing::info!("Restart {} finished, system is {}", epoch, state.system);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Command>>,
    }

    #[async_trait]
    impl CommandTransport for RecordingTransport {
        async fn send(&self, command: Command) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(command);
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl CommandTransport for FailingTransport {
        async fn send(&self, _command: Command) -> anyhow::Result<()> {
            anyhow::bail!("hub unreachable")
        }
    }

    fn dispatcher(transport: Arc<dyn CommandTransport>) -> CommandDispatcher {
        CommandDispatcher::new(transport, ConnectionStatus::Connected, DispatchTimings::default())
    }

    async fn advance(by: Duration) {
        tokio::time::advance(by).await;
        tokio::task::yield_now().await;
    }

    async fn status(dispatcher: &CommandDispatcher) -> SystemStatus {
        dispatcher.snapshot().await.state.system
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(transport.clone());

        let ack = dispatcher.dispatch(Command::Pause).await.unwrap();
        assert_eq!(ack.status, SystemStatus::Paused);
        assert_eq!(ack.message(), "Solar management paused");
        assert_eq!(status(&dispatcher).await, SystemStatus::Paused);

        let ack = dispatcher.dispatch(Command::Resume).await.unwrap();
        assert_eq!(ack.status, SystemStatus::Running);
        assert_eq!(
            *transport.sent.lock().unwrap(),
            vec![Command::Pause, Command::Resume]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_before_acknowledgement() {
        let dispatcher = dispatcher(Arc::new(RecordingTransport::default()));
        let started = tokio::time::Instant::now();
        dispatcher.dispatch(Command::Pause).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_is_two_phase() {
        let dispatcher = dispatcher(Arc::new(RecordingTransport::default()));

        let ack = dispatcher.dispatch(Command::Restart).await.unwrap();
        assert_eq!(ack.status, SystemStatus::Restarting);
        assert_eq!(status(&dispatcher).await, SystemStatus::Restarting);

        advance(Duration::from_millis(2999)).await;
        assert_eq!(status(&dispatcher).await, SystemStatus::Restarting);

        advance(Duration::from_millis(1)).await;
        assert_eq!(status(&dispatcher).await, SystemStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_during_restart_window_survives() {
        let dispatcher = CommandDispatcher::new(
            Arc::new(RecordingTransport::default()),
            ConnectionStatus::Connected,
            DispatchTimings {
                latency: Duration::from_millis(100),
                restart_delay: Duration::from_secs(3),
            },
        );

        dispatcher.dispatch(Command::Restart).await.unwrap();
        dispatcher.dispatch(Command::Pause).await.unwrap();
        advance(Duration::from_secs(5)).await;
        assert_eq!(status(&dispatcher).await, SystemStatus::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_during_window_rearms_completion() {
        let dispatcher = dispatcher(Arc::new(RecordingTransport::default()));

        dispatcher.dispatch(Command::Restart).await.unwrap();
        advance(Duration::from_secs(1)).await;
        // acknowledged 1.5s later, 2.5s into the first window
        let ack = dispatcher.dispatch(Command::Restart).await.unwrap();
        assert_eq!(ack.status, SystemStatus::Restarting);

        // the first window has closed but belongs to a stale restart
        advance(Duration::from_secs(1)).await;
        assert_eq!(status(&dispatcher).await, SystemStatus::Restarting);

        advance(Duration::from_secs(2)).await;
        assert_eq!(status(&dispatcher).await, SystemStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_dispatch_while_pending_is_busy() {
        let dispatcher = dispatcher(Arc::new(RecordingTransport::default()));

        let pending = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch(Command::Pause).await })
        };
        tokio::task::yield_now().await;
        assert!(dispatcher.is_busy());
        assert!(dispatcher.snapshot().await.available.is_empty());

        let second = dispatcher.dispatch(Command::Restart).await;
        assert!(matches!(second, Err(DispatchError::Busy)));

        pending.await.unwrap().unwrap();
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_leaves_status() {
        let dispatcher = dispatcher(Arc::new(FailingTransport));

        let result = dispatcher.dispatch(Command::Pause).await;
        match result {
            Err(DispatchError::Transport { command, reason }) => {
                assert_eq!(command, Command::Pause);
                assert!(reason.contains("hub unreachable"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(status(&dispatcher).await, SystemStatus::Running);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher(transport.clone());
        let result = dispatcher.dispatch(Command::Resume).await;
        assert!(matches!(
            result,
            Err(DispatchError::Rejected(CommandRejection::NoOp { .. }))
        ));

        let offline = CommandDispatcher::new(
            transport.clone(),
            ConnectionStatus::Disconnected,
            DispatchTimings::default(),
        );
        let result = offline.dispatch(Command::Pause).await;
        assert!(matches!(
            result,
            Err(DispatchError::Rejected(CommandRejection::NotConnected(
                ConnectionStatus::Disconnected
            )))
        ));
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(!offline.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_dispatch_releases_busy() {
        let dispatcher = dispatcher(Arc::new(RecordingTransport::default()));
        let pending = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch(Command::Pause).await })
        };
        tokio::task::yield_now().await;
        assert!(dispatcher.is_busy());

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        assert!(!dispatcher.is_busy());
        assert_eq!(status(&dispatcher).await, SystemStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_command_is_recorded() {
        let dispatcher = dispatcher(Arc::new(FailingTransport));
        let _ = dispatcher.dispatch(Command::Restart).await;
        let snapshot = dispatcher.snapshot().await;
        assert_eq!(
            snapshot.state.last_command.map(|r| r.command),
            Some(Command::Restart)
        );
    }
}
