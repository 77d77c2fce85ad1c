//! Fleet-wide connectivity check: probes every host's SSH port without
//! running anything.

use std::collections::HashMap;
use std::time::Duration;

use fleetr_common::network::host::{HostSet, HostTarget};
use fleetr_common::report::ProbeReport;
use tokio::task::{Id, JoinSet};
use tracing::error;

use crate::network::tcp;

/// Probes every target at once and returns the reports in inventory order.
pub async fn check_hosts(
    hosts: &HostSet,
    port: u16,
    connect_timeout: Option<Duration>,
) -> Vec<ProbeReport> {
    let targets: Vec<HostTarget> = hosts.targets();
    let total = targets.len();

    let mut probes: JoinSet<(usize, ProbeReport)> = JoinSet::new();
    let mut probe_ids: HashMap<Id, usize> = HashMap::with_capacity(total);
    for (index, target) in targets.iter().cloned().enumerate() {
        let handle = probes.spawn(async move {
            let reachable = tcp::probe_address(target.address, port, connect_timeout).await;
            (index, ProbeReport { target, reachable })
        });
        probe_ids.insert(handle.id(), index);
    }

    let mut settled: Vec<Option<ProbeReport>> = (0..total).map(|_| None).collect();
    while let Some(joined) = probes.join_next_with_id().await {
        let (index, report) = match joined {
            Ok((_, probe)) => probe,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                let Some(&index) = probe_ids.get(&err.id()) else {
                    error!("Lost track of a cancelled probe: {err}");
                    continue;
                };
                error!("Probe of {} was cancelled: {err}", targets[index]);
                let target = targets[index].clone();
                (
                    index,
                    ProbeReport {
                        target,
                        reachable: false,
                    },
                )
            }
        };
        settled[index] = Some(report);
    }

    settled.into_iter().flatten().collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
