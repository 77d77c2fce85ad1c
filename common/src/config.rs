use std::time::Duration;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// How failures affect the rest of the work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failure aborts the remaining commands of that host and is
    /// surfaced to the caller.
    Strict,
    /// Failures are logged and execution continues.
    #[default]
    Lenient,
}

impl FailurePolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Lenient
        }
    }

    pub fn is_strict(self) -> bool {
        self == FailurePolicy::Strict
    }
}

/// How hosts are dispatched. Commands on a single host always run in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One host at a time, in inventory order.
    #[default]
    Sequential,
    /// Every host at once, bounded by [`Config::max_parallel`] when set.
    Concurrent,
}

/// Options for a run, applied identically to every host.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote user. `None` defers to the ssh client's defaults.
    pub user: Option<String>,

    /// Password authentication. `None` relies on the agent or default identity.
    pub password: Option<String>,

    pub port: u16,

    /// Bounds the connectivity probe and the SSH handshake.
    /// `None` leaves it to the platform's TCP connect timeout.
    pub connect_timeout: Option<Duration>,

    /// Bounds a single command's execution.
    pub exec_timeout: Option<Duration>,

    /// Probe the SSH port before running any command on a host.
    pub check_connectivity: bool,

    pub policy: FailurePolicy,

    /// Echo captured stdout/stderr of every command to the log.
    pub log_to_console: bool,

    /// Upper bound on hosts in flight in concurrent mode. `None` is unbounded.
    pub max_parallel: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            port: DEFAULT_SSH_PORT,
            connect_timeout: None,
            exec_timeout: None,
            check_connectivity: false,
            policy: FailurePolicy::default(),
            log_to_console: false,
            max_parallel: None,
        }
    }
}
