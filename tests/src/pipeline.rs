use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleetr_common::command::CommandSet;
use fleetr_common::config::{Config, ExecutionMode, FailurePolicy};
use fleetr_common::network::host::HostSet;
use fleetr_common::network::inventory::{resolve, InventoryInput, RawMapping};
use fleetr_common::report::{ExecutionResult, RunReport};
use fleetr_common::Error;
use fleetr_core::pipeline::{Pipeline, RunPhase};

use crate::util::{addr, closed_port, lenient, Reply, ScriptedTransport};

fn two_web_hosts() -> HostSet {
    let input = InventoryInput::Mapping(RawMapping::from([
        ("web1".to_string(), "10.0.0.5".to_string()),
        ("web2".to_string(), "10.0.0.6".to_string()),
    ]));
    resolve(&input).unwrap()
}

fn commands(list: &[&str]) -> CommandSet {
    CommandSet::new(list.iter().copied()).unwrap()
}

async fn run(
    transport: Arc<ScriptedTransport>,
    config: Config,
    hosts: &HostSet,
    list: &[&str],
    mode: ExecutionMode,
) -> fleetr_common::Result<RunReport> {
    Pipeline::new(transport, config)
        .run(hosts, &commands(list), mode)
        .await
}

#[tokio::test]
async fn lenient_run_reports_every_host_even_when_one_fails() {
    let transport = Arc::new(
        ScriptedTransport::default().reply("10.0.0.6", "pwd", Reply::Broken("auth failed")),
    );

    let report = run(
        transport,
        lenient(),
        &two_web_hosts(),
        &["pwd"],
        ExecutionMode::Sequential,
    )
    .await
    .unwrap();

    assert_eq!(report.hosts.len(), 2);
    assert_eq!(report.hosts[0].target.name.as_deref(), Some("web1"));
    assert!(report.hosts[0].records[0].result.is_success());
    assert!(matches!(
        report.hosts[1].records[0].result,
        ExecutionResult::TransportException { .. }
    ));
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn strict_unreachable_host_runs_nothing() {
    let transport = Arc::new(ScriptedTransport::default());
    let config = Config {
        check_connectivity: true,
        policy: FailurePolicy::Strict,
        port: closed_port().await,
        connect_timeout: Some(Duration::from_secs(2)),
        ..Config::default()
    };
    let hosts = HostSet::Single(addr("127.0.0.1"));

    let outcome = run(
        transport.clone(),
        config,
        &hosts,
        &["ls", "pwd"],
        ExecutionMode::Sequential,
    )
    .await;

    let err = outcome.unwrap_err();
    assert!(matches!(err.root(), Error::HostUnreachable { .. }));
    assert!(transport.calls().is_empty());

    let report = err.partial_report().unwrap();
    assert_eq!(report.skipped(), 1);
    assert!(report.hosts[0].records.is_empty());
}

#[tokio::test]
async fn lenient_unreachable_host_is_skipped() {
    let transport = Arc::new(ScriptedTransport::default());
    let config = Config {
        check_connectivity: true,
        port: closed_port().await,
        connect_timeout: Some(Duration::from_secs(2)),
        ..Config::default()
    };
    let hosts = HostSet::Single(addr("127.0.0.1"));

    let report = run(
        transport.clone(),
        config,
        &hosts,
        &["uptime"],
        ExecutionMode::Concurrent,
    )
    .await
    .unwrap();

    assert_eq!(report.skipped(), 1);
    assert!(report.hosts[0].records.is_empty());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn both_modes_agree_under_a_lenient_policy() {
    let hosts = HostSet::List(vec![addr("10.0.0.1"), addr("10.0.0.2"), addr("10.0.0.3")]);
    let script = || {
        Arc::new(
            ScriptedTransport::default()
                .reply("10.0.0.2", "ls", Reply::Exit(2))
                .reply("10.0.0.3", "pwd", Reply::Refused)
                .delay("10.0.0.1", Duration::from_millis(30)),
        )
    };

    let sequential = run(script(), lenient(), &hosts, &["ls", "pwd"], ExecutionMode::Sequential)
        .await
        .unwrap();
    let concurrent = run(script(), lenient(), &hosts, &["ls", "pwd"], ExecutionMode::Concurrent)
        .await
        .unwrap();

    assert_eq!(sequential.hosts, concurrent.hosts);
    assert_eq!(
        concurrent.hosts[2].records[1].result,
        ExecutionResult::ConnectivityFailure
    );
    assert_eq!(concurrent.mode, ExecutionMode::Concurrent);
}

#[tokio::test]
async fn strict_concurrent_failure_lets_other_hosts_settle() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply("10.0.0.5", "ls", Reply::Exit(1))
            .delay("10.0.0.6", Duration::from_millis(50)),
    );
    let config = Config {
        policy: FailurePolicy::Strict,
        ..Config::default()
    };

    let outcome = run(
        transport.clone(),
        config,
        &two_web_hosts(),
        &["ls", "pwd"],
        ExecutionMode::Concurrent,
    )
    .await;

    let err = outcome.unwrap_err();
    match err.root() {
        Error::CommandFailure { host, command, exit_code } => {
            assert_eq!(host, "10.0.0.5 (web1)");
            assert_eq!(command, "ls");
            assert_eq!(*exit_code, 1);
        }
        other => panic!("expected a command failure, got {other:?}"),
    }

    let report = err.partial_report().unwrap();
    assert_eq!(report.hosts.len(), 2);
    assert_eq!(report.hosts[0].records.len(), 1);
    assert!(report.hosts[1].succeeded());
    assert_eq!(report.hosts[1].records.len(), 2);

    assert_eq!(transport.commands_on("10.0.0.5"), vec!["ls"]);
    assert_eq!(transport.commands_on("10.0.0.6"), vec!["ls", "pwd"]);
}

#[tokio::test]
async fn strict_sequential_failure_stops_the_run() {
    let transport = Arc::new(ScriptedTransport::default().reply("10.0.0.5", "ls", Reply::Exit(1)));
    let config = Config {
        policy: FailurePolicy::Strict,
        ..Config::default()
    };

    let outcome = run(
        transport.clone(),
        config,
        &two_web_hosts(),
        &["ls", "pwd"],
        ExecutionMode::Sequential,
    )
    .await;

    let err = outcome.unwrap_err();
    assert!(matches!(err.root(), Error::CommandFailure { .. }));
    assert!(transport.commands_on("10.0.0.6").is_empty());
    assert_eq!(err.partial_report().unwrap().hosts.len(), 1);
}

#[tokio::test]
async fn progress_reaches_the_host_count() {
    let settled = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&settled);
    let hosts = HostSet::List(vec![addr("10.0.0.1"), addr("10.0.0.2"), addr("10.0.0.3")]);

    let mut pipeline = Pipeline::new(Arc::new(ScriptedTransport::default()), lenient())
        .with_progress(move |count| {
            seen.fetch_max(count, Ordering::SeqCst);
        });
    assert_eq!(pipeline.phase(), RunPhase::Pending);

    pipeline
        .run(&hosts, &commands(&["true"]), ExecutionMode::Concurrent)
        .await
        .unwrap();

    assert_eq!(settled.load(Ordering::SeqCst), 3);
    assert_eq!(pipeline.phase(), RunPhase::Done);
}

#[tokio::test]
async fn timed_out_command_is_a_per_command_failure() {
    let transport = Arc::new(
        ScriptedTransport::default().reply("10.0.0.5", "sleep 60", Reply::TimedOut),
    );

    let report = run(
        transport,
        lenient(),
        &two_web_hosts(),
        &["sleep 60", "pwd"],
        ExecutionMode::Concurrent,
    )
    .await
    .unwrap();

    match &report.hosts[0].records[0].result {
        ExecutionResult::TransportException { cause } => assert!(cause.contains("timed out")),
        other => panic!("expected a transport failure, got {other:?}"),
    }
    assert!(report.hosts[0].records[1].result.is_success());
    assert!(report.hosts[1].succeeded());
}

#[tokio::test]
async fn timed_out_command_aborts_a_strict_host() {
    let transport = Arc::new(
        ScriptedTransport::default().reply("10.0.0.6", "sleep 60", Reply::TimedOut),
    );
    let config = Config {
        policy: FailurePolicy::Strict,
        ..Config::default()
    };

    let err = run(
        transport.clone(),
        config,
        &two_web_hosts(),
        &["sleep 60", "pwd"],
        ExecutionMode::Concurrent,
    )
    .await
    .unwrap_err();

    assert!(matches!(err.root(), Error::Transport { .. }));
    assert_eq!(transport.commands_on("10.0.0.6"), vec!["sleep 60"]);
    assert!(err.partial_report().unwrap().hosts[0].succeeded());
}
