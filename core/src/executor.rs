//! # Remote Command Executor
//!
//! Runs the command list on one host, applying the failure policy to that
//! host only.

use fleetr_common::command::CommandSet;
use fleetr_common::config::Config;
use fleetr_common::network::host::HostTarget;
use fleetr_common::report::{CommandRecord, ExecutionResult, HostReport};
use fleetr_common::{Error, Result, success};
use tracing::{error, info, warn};

use crate::network::tcp;
use crate::network::transport::{Session, Transport, TransportError};

/// What one host produced, plus the failure that ended it under a strict policy.
#[derive(Debug)]
pub struct HostOutcome {
    pub report: HostReport,
    pub failure: Option<Error>,
}

/// Runs `commands` on `target` in order.
///
/// Under a strict policy the first failure stops the host and is returned as
/// an error; under a lenient one it is recorded and the next command runs.
/// A failed connectivity pre-check either aborts (strict) or skips the host
/// (lenient).
pub async fn run_on_host(
    target: &HostTarget,
    commands: &CommandSet,
    config: &Config,
    transport: &dyn Transport,
) -> Result<HostReport> {
    let outcome = settle_host(target, commands, config, transport).await;
    match outcome.failure {
        Some(err) => Err(err),
        None => Ok(outcome.report),
    }
}

/// Same as [`run_on_host`], but keeps the records gathered before a strict
/// failure.
pub async fn settle_host(
    target: &HostTarget,
    commands: &CommandSet,
    config: &Config,
    transport: &dyn Transport,
) -> HostOutcome {
    if config.check_connectivity
        && !tcp::probe_address(target.address, config.port, config.connect_timeout).await
    {
        let report = HostReport::skipped(target.clone());
        if config.policy.is_strict() {
            error!("Cannot connect to {target}");
            return HostOutcome {
                report,
                failure: Some(Error::HostUnreachable {
                    host: target.to_string(),
                }),
            };
        }
        warn!("Cannot connect to {target}, skipping...");
        return HostOutcome {
            report,
            failure: None,
        };
    }

    let session = Session::new(target.address, config);
    let mut report = HostReport::new(target.clone());

    for command in commands.iter() {
        info!("Executing `{command}` on {target}");
        let result = execute(transport, &session, command, config).await;
        log_result(target, command, &result, config.log_to_console);

        let failure = result.to_error(target, command);
        report.records.push(CommandRecord {
            command: command.to_string(),
            result,
        });

        if let Some(err) = failure
            && config.policy.is_strict()
        {
            return HostOutcome {
                report,
                failure: Some(err),
            };
        }
    }

    HostOutcome {
        report,
        failure: None,
    }
}

async fn execute(
    transport: &dyn Transport,
    session: &Session,
    command: &str,
    config: &Config,
) -> ExecutionResult {
    match transport.exec(session, command, config.exec_timeout).await {
        Ok(output) if output.exit_code == 0 => ExecutionResult::Success {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
        },
        Ok(output) => ExecutionResult::CommandFailure {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        },
        Err(TransportError::Connect(_)) => ExecutionResult::ConnectivityFailure,
        Err(e) => ExecutionResult::TransportException {
            cause: e.to_string(),
        },
    }
}

fn log_result(target: &HostTarget, command: &str, result: &ExecutionResult, log_to_console: bool) {
    match result {
        ExecutionResult::Success { stdout, stderr, .. } => {
            success!("Command success for {target}: `{command}`");
            if log_to_console {
                log_streams(stdout, stderr);
            }
        }
        ExecutionResult::CommandFailure {
            exit_code,
            stdout,
            stderr,
        } => {
            error!("`{command}` exited with {exit_code} on {target}");
            log_streams(stdout, stderr);
        }
        ExecutionResult::ConnectivityFailure => {
            error!("Lost connection to {target} while running `{command}`");
        }
        ExecutionResult::TransportException { cause } => {
            error!("Exception for {target} while running `{command}`: {cause}");
        }
    }
}

fn log_streams(stdout: &str, stderr: &str) {
    for line in stdout.lines() {
        info!("  {line}");
    }
    for line in stderr.lines() {
        warn!("  {line}");
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
