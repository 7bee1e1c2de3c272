// Control panel domain model - statuses, commands and their transition table
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    Running,
    Paused,
    Restarting,
    Offline,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Running => "running",
            SystemStatus::Paused => "paused",
            SystemStatus::Restarting => "restarting",
            SystemStatus::Offline => "offline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SystemStatus::Running => "Running",
            SystemStatus::Paused => "Paused",
            SystemStatus::Restarting => "Restarting...",
            SystemStatus::Offline => "Offline",
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Connecting,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Restart,
    Pause,
    Resume,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Restart, Command::Pause, Command::Resume];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Pause => "pause",
            Command::Resume => "resume",
        }
    }

    /// Status the device is in once the command is acknowledged
    pub fn target_status(&self) -> SystemStatus {
        match self {
            Command::Restart => SystemStatus::Restarting,
            Command::Pause => SystemStatus::Paused,
            Command::Resume => SystemStatus::Running,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restart" => Ok(Command::Restart),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandRejection {
    #[error("device hub is {0}, commands require a connection")]
    NotConnected(ConnectionStatus),
    #[error("{command} has no effect while the system is {status}")]
    NoOp {
        command: Command,
        status: SystemStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: Command,
    pub issued_at: DateTime<Local>,
}

/// Control-side state owned by one dispatcher.
///
/// Transitions are pure: each one consumes the state and returns the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub system: SystemStatus,
    pub connection: ConnectionStatus,
    pub last_command: Option<CommandRecord>,
    /// Bumped on every acknowledged restart so stale completions are ignored.
    pub restart_epoch: u64,
}

impl ControlState {
    pub fn new(connection: ConnectionStatus) -> Self {
        Self {
            system: SystemStatus::Running,
            connection,
            last_command: None,
            restart_epoch: 0,
        }
    }

    /// Whether `command` may be dispatched from this state. A restart is
    /// always allowed while connected; issuing one while restarting re-arms
    /// the restart window.
    pub fn check(&self, command: Command) -> Result<(), CommandRejection> {
        if self.connection != ConnectionStatus::Connected {
            return Err(CommandRejection::NotConnected(self.connection));
        }
        if command != Command::Restart && self.system == command.target_status() {
            return Err(CommandRejection::NoOp {
                command,
                status: self.system,
            });
        }
        Ok(())
    }

    pub fn available_commands(&self) -> Vec<Command> {
        Command::ALL
            .into_iter()
            .filter(|c| self.check(*c).is_ok())
            .collect()
    }

    pub fn record(self, command: Command, issued_at: DateTime<Local>) -> Self {
        Self {
            last_command: Some(CommandRecord { command, issued_at }),
            ..self
        }
    }

    /// First (and for pause/resume, only) phase of an acknowledged command.
    pub fn apply(self, command: Command) -> Self {
        let restart_epoch = match command {
            Command::Restart => self.restart_epoch + 1,
            _ => self.restart_epoch,
        };
        Self {
            system: command.target_status(),
            restart_epoch,
            ..self
        }
    }

    /// Second phase of a restart. Only the restart identified by `epoch`
    /// may complete, and only while the system is still restarting.
    pub fn complete_restart(self, epoch: u64) -> Self {
        if self.system == SystemStatus::Restarting && self.restart_epoch == epoch {
            Self {
                system: SystemStatus::Running,
                ..self
            }
        } else {
            self
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(ConnectionStatus::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!("restart".parse::<Command>(), Ok(Command::Restart));
        assert_eq!("Pause".parse::<Command>(), Ok(Command::Pause));
        assert_eq!(
            "reboot".parse::<Command>(),
            Err(UnknownCommand("reboot".to_string()))
        );
    }

    #[test]
    fn test_transition_table() {
        let state = ControlState::default();
        assert_eq!(state.system, SystemStatus::Running);

        let paused = state.clone().apply(Command::Pause);
        assert_eq!(paused.system, SystemStatus::Paused);

        let resumed = paused.apply(Command::Resume);
        assert_eq!(resumed.system, SystemStatus::Running);

        let restarting = resumed.apply(Command::Restart);
        assert_eq!(restarting.system, SystemStatus::Restarting);
        assert_eq!(restarting.restart_epoch, 1);

        let running = restarting.complete_restart(1);
        assert_eq!(running.system, SystemStatus::Running);
    }

    #[test]
    fn test_no_op_commands_are_rejected() {
        let running = ControlState::default();
        assert_eq!(
            running.check(Command::Resume),
            Err(CommandRejection::NoOp {
                command: Command::Resume,
                status: SystemStatus::Running
            })
        );
        assert!(running.check(Command::Pause).is_ok());
        assert!(running.check(Command::Restart).is_ok());

        let paused = running.apply(Command::Pause);
        assert!(paused.check(Command::Pause).is_err());
        assert!(paused.check(Command::Resume).is_ok());

        let restarting = paused.apply(Command::Restart);
        assert!(restarting.check(Command::Restart).is_ok());
        assert_eq!(restarting.available_commands(), Command::ALL.to_vec());
    }

    #[test]
    fn test_commands_require_connection() {
        for connection in [ConnectionStatus::Connecting, ConnectionStatus::Disconnected] {
            let state = ControlState::new(connection);
            assert_eq!(
                state.check(Command::Pause),
                Err(CommandRejection::NotConnected(connection))
            );
            assert!(state.available_commands().is_empty());
        }
    }

    #[test]
    fn test_available_commands() {
        let state = ControlState::default();
        assert_eq!(
            state.available_commands(),
            vec![Command::Restart, Command::Pause]
        );

        let offline = ControlState {
            system: SystemStatus::Offline,
            ..ControlState::default()
        };
        assert_eq!(offline.available_commands(), Command::ALL.to_vec());
    }

    #[test]
    fn test_stale_restart_completion_is_ignored() {
        let state = ControlState::default().apply(Command::Restart);
        let first_epoch = state.restart_epoch;

        // paused and restarted again before the first restart finished
        let state = state
            .apply(Command::Pause)
            .apply(Command::Restart);
        let state = state.complete_restart(first_epoch);
        assert_eq!(state.system, SystemStatus::Restarting);

        let paused = ControlState::default()
            .apply(Command::Restart)
            .apply(Command::Pause);
        assert_eq!(paused.complete_restart(1).system, SystemStatus::Paused);
    }

    #[test]
    fn test_record_keeps_status() {
        let now = Local::now();
        let state = ControlState::default().record(Command::Pause, now);
        assert_eq!(state.system, SystemStatus::Running);
        assert_eq!(
            state.last_command,
            Some(CommandRecord {
                command: Command::Pause,
                issued_at: now
            })
        );
    }
}
