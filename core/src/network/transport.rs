//! # SSH Transport
//!
//! The capability the executor uses to run a command on a remote host.
//! [`OpenSshTransport`] drives the system `ssh` client; tests substitute their
//! own [`Transport`].

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use fleetr_common::config::{Config, DEFAULT_SSH_PORT};
use fleetr_common::network::address::Address;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// ssh reserves this exit status for its own failures.
const SSH_ERROR_EXIT: i32 = 255;

const CONNECT_FAILURE_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection timed out",
    "no route to host",
    "network is unreachable",
    "host is unreachable",
    "temporary failure in name resolution",
    "could not resolve hostname",
    "connection closed by remote host",
];

/// Where and as whom to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: Address,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub connect_timeout: Option<Duration>,
}

impl Session {
    pub fn new(address: Address, config: &Config) -> Self {
        Self {
            address,
            port: config.port,
            user: config.user.clone(),
            password: config.password.clone(),
            connect_timeout: config.connect_timeout,
        }
    }
}

/// What a finished command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The session could not be established because the host was not reachable.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Authentication, protocol or other session-level failure.
    #[error("session failed: {0}")]
    Session(String),
}

/// Runs one command per call. Implementations are shared between concurrently
/// running hosts, so each call must open its own session.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exec(
        &self,
        session: &Session,
        command: &str,
        exec_timeout: Option<Duration>,
    ) -> Result<CommandOutput, TransportError>;
}

/// Shells out to the OpenSSH client.
///
/// Password authentication goes through `sshpass -e`, with the password handed
/// over in the environment rather than on the command line.
#[derive(Debug, Clone)]
pub struct OpenSshTransport {
    program: String,
}

impl Default for OpenSshTransport {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
        }
    }
}

impl OpenSshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different ssh binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_ssh_args(&self, session: &Session, command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if session.port != DEFAULT_SSH_PORT {
            args.push("-p".to_string());
            args.push(session.port.to_string());
        }

        // Never stop at an interactive prompt unless a password is expected.
        if session.password.is_none() {
            args.extend(["-o".to_string(), "BatchMode=yes".to_string()]);
        }

        if let Some(limit) = session.connect_timeout {
            let secs = limit.as_secs().max(1);
            args.extend(["-o".to_string(), format!("ConnectTimeout={secs}")]);
        }

        args.extend([
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]);

        match &session.user {
            Some(user) => args.push(format!("{}@{}", user, session.address)),
            None => args.push(session.address.to_string()),
        }

        args.push(command.to_string());
        args
    }

    fn build_command(&self, session: &Session, command: &str) -> (String, Command) {
        let args = self.build_ssh_args(session, command);

        let (program, mut cmd) = match &session.password {
            Some(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.arg("-e").arg(&self.program).env("SSHPASS", password);
                ("sshpass".to_string(), cmd)
            }
            None => (self.program.clone(), Command::new(&self.program)),
        };

        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        (program, cmd)
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn exec(
        &self,
        session: &Session,
        command: &str,
        exec_timeout: Option<Duration>,
    ) -> Result<CommandOutput, TransportError> {
        let (program, mut cmd) = self.build_command(session, command);
        let running = cmd.output();

        // Dropping `running` on timeout kills the child.
        let output = match exec_timeout {
            Some(limit) => timeout(limit, running)
                .await
                .map_err(|_elapsed| TransportError::Timeout(limit))?,
            None => running.await,
        }
        .map_err(|source| TransportError::Spawn { program, source })?;

        classify(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Separates ssh's own failures from the remote command's exit status.
pub fn classify(output: CommandOutput) -> Result<CommandOutput, TransportError> {
    if output.exit_code != SSH_ERROR_EXIT {
        return Ok(output);
    }

    let diagnostic = output.stderr.trim().to_string();
    if is_connect_failure(&diagnostic) {
        Err(TransportError::Connect(diagnostic))
    } else {
        Err(TransportError::Session(diagnostic))
    }
}

fn is_connect_failure(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    CONNECT_FAILURE_PATTERNS
        .iter()
        .any(|pattern| stderr.contains(pattern))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
