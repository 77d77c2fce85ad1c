//! # Execution Reports
//!
//! Outcomes of running commands, from a single command up to a whole run.

use crate::config::ExecutionMode;
use crate::error::Error;
use crate::network::host::HostTarget;

/// Outcome of one command on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    /// The host could not be reached while opening the session.
    ConnectivityFailure,
    /// The command ran and exited non-zero.
    CommandFailure {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The transport failed (authentication, protocol, I/O, timeout).
    TransportException { cause: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// The error this outcome escalates to under a strict policy.
    pub fn to_error(&self, target: &HostTarget, command: &str) -> Option<Error> {
        let host = target.to_string();
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::ConnectivityFailure => Some(Error::HostUnreachable { host }),
            ExecutionResult::CommandFailure { exit_code, .. } => Some(Error::CommandFailure {
                host,
                command: command.to_string(),
                exit_code: *exit_code,
            }),
            ExecutionResult::TransportException { cause } => Some(Error::Transport {
                host,
                command: command.to_string(),
                cause: cause.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: String,
    pub result: ExecutionResult,
}

/// Everything that happened on one host, in command order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostReport {
    pub target: HostTarget,
    /// Set when the connectivity pre-check failed under a lenient policy.
    pub skipped: bool,
    pub records: Vec<CommandRecord>,
}

impl HostReport {
    pub fn new(target: HostTarget) -> Self {
        Self {
            target,
            skipped: false,
            records: Vec::new(),
        }
    }

    pub fn skipped(target: HostTarget) -> Self {
        Self {
            target,
            skipped: true,
            records: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.skipped && self.records.iter().all(|record| record.result.is_success())
    }
}

/// Aggregate of a run, in inventory order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: ExecutionMode,
    pub hosts: Vec<HostReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.hosts.iter().filter(|host| host.succeeded()).count()
    }

    pub fn skipped(&self) -> usize {
        self.hosts.iter().filter(|host| host.skipped).count()
    }

    pub fn failed(&self) -> usize {
        self.hosts.len() - self.succeeded() - self.skipped()
    }

    pub fn is_clean(&self) -> bool {
        self.succeeded() == self.hosts.len()
    }
}

/// Result of probing one host's SSH port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub target: HostTarget,
    pub reachable: bool,
}
