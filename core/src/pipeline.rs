//! # Orchestration Pipeline
//!
//! Fans a [`CommandSet`] out over every host of a [`HostSet`] and aggregates
//! the per-host reports.
//!
//! Both execution modes share the same contract:
//! * hosts are never re-dispatched within a run,
//! * commands on one host always run in declared order,
//! * the report lists hosts in inventory order regardless of completion order,
//! * a strict failure is returned as an error. Sequential runs stop at the
//!   failing host; concurrent runs let every host settle first.

use std::collections::HashMap;
use std::sync::Arc;

use fleetr_common::command::CommandSet;
use fleetr_common::config::{Config, ExecutionMode};
use fleetr_common::network::host::{HostSet, HostTarget};
use fleetr_common::report::{CommandRecord, ExecutionResult, HostReport, RunReport};
use fleetr_common::{Error, Result, success};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error};

use crate::executor::{self, HostOutcome};
use crate::network::transport::Transport;

type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Pending,
    Dispatching,
    Aggregating,
    Done,
}

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
    phase: RunPhase,
    transitions: Vec<RunPhase>,
    on_host_settled: Option<ProgressCallback>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>, config: Config) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            phase: RunPhase::Pending,
            transitions: Vec::new(),
            on_host_settled: None,
        }
    }

    /// Registers a callback receiving the number of hosts settled so far.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_host_settled = Some(Arc::new(callback));
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Every phase entered so far, in order.
    pub fn transitions(&self) -> &[RunPhase] {
        &self.transitions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(
        &mut self,
        hosts: &HostSet,
        commands: &CommandSet,
        mode: ExecutionMode,
    ) -> Result<RunReport> {
        let targets: Vec<HostTarget> = hosts.targets();
        debug!(
            "Dispatching {} command(s) to {} host(s) ({mode:?})",
            commands.len(),
            targets.len()
        );

        self.set_phase(RunPhase::Dispatching);
        let outcomes = match mode {
            ExecutionMode::Sequential => self.run_sequential(targets, commands).await,
            ExecutionMode::Concurrent => self.run_concurrent(targets, commands).await,
        };

        self.set_phase(RunPhase::Aggregating);
        let outcome = aggregate(mode, outcomes);
        self.set_phase(RunPhase::Done);

        let report = outcome?;
        success!("Finished {} host(s)", report.hosts.len());
        Ok(report)
    }

    async fn run_sequential(
        &mut self,
        targets: Vec<HostTarget>,
        commands: &CommandSet,
    ) -> Vec<HostOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for (settled, target) in targets.iter().enumerate() {
            let outcome =
                executor::settle_host(target, commands, &self.config, self.transport.as_ref())
                    .await;
            let failed = outcome.failure.is_some();
            outcomes.push(outcome);
            self.report_progress(settled + 1);

            if failed {
                break;
            }
        }

        outcomes
    }

    async fn run_concurrent(
        &mut self,
        targets: Vec<HostTarget>,
        commands: &CommandSet,
    ) -> Vec<HostOutcome> {
        let total = targets.len();
        let commands = Arc::new(commands.clone());
        let limiter: Option<Arc<Semaphore>> = self
            .config
            .max_parallel
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        // Dropping the set aborts every unit still in flight.
        let mut units: JoinSet<(usize, HostOutcome)> = JoinSet::new();
        let mut unit_ids: HashMap<Id, usize> = HashMap::with_capacity(total);
        for (index, target) in targets.iter().cloned().enumerate() {
            let transport = Arc::clone(&self.transport);
            let config = Arc::clone(&self.config);
            let commands = Arc::clone(&commands);
            let limiter = limiter.clone();

            let handle = units.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome =
                    executor::settle_host(&target, &commands, &config, transport.as_ref()).await;
                (index, outcome)
            });
            unit_ids.insert(handle.id(), index);
        }

        let mut settled: Vec<Option<HostOutcome>> = (0..total).map(|_| None).collect();
        let mut count: usize = 0;

        while let Some(joined) = units.join_next_with_id().await {
            let (index, outcome) = match joined {
                Ok((_, unit)) => unit,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    let Some(&index) = unit_ids.get(&err.id()) else {
                        error!("Lost track of a cancelled host unit: {err}");
                        continue;
                    };
                    error!("Host unit for {} was cancelled: {err}", targets[index]);
                    (
                        index,
                        cancelled(&targets[index], &commands, &self.config, &err),
                    )
                }
            };
            settled[index] = Some(outcome);
            count += 1;
            self.report_progress(count);
        }

        settled.into_iter().flatten().collect()
    }

    fn set_phase(&mut self, phase: RunPhase) {
        debug!("Pipeline {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.transitions.push(phase);
    }

    fn report_progress(&self, settled: usize) {
        if let Some(callback) = &self.on_host_settled {
            callback(settled);
        }
    }
}

/// Builds the run report and, when a host failed under a strict policy, wraps
/// the first failure in inventory order around it.
fn aggregate(mode: ExecutionMode, outcomes: Vec<HostOutcome>) -> Result<RunReport> {
    let mut hosts = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        hosts.push(outcome.report);
        failures.extend(outcome.failure);
    }

    let report = RunReport { mode, hosts };
    if failures.is_empty() {
        return Ok(report);
    }

    if failures.len() > 1 {
        error!("{} hosts failed under the strict policy", failures.len());
    }
    Err(Error::Aborted {
        cause: Box::new(failures.remove(0)),
        report: Box::new(report),
    })
}

/// A unit that never finished counts as a transport failure on its first command.
fn cancelled(
    target: &HostTarget,
    commands: &CommandSet,
    config: &Config,
    err: &JoinError,
) -> HostOutcome {
    let command = commands.iter().next().unwrap_or_default().to_string();
    let result = ExecutionResult::TransportException {
        cause: format!("host unit cancelled: {err}"),
    };
    let failure = if config.policy.is_strict() {
        result.to_error(target, &command)
    } else {
        None
    };

    let mut report = HostReport::new(target.clone());
    report.records.push(CommandRecord { command, result });
    HostOutcome { report, failure }
}


// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
