use std::time::Duration;

use anyhow::{Context, bail};
use colored::*;
use fleetr_common::network::host::HostSet;
use fleetr_common::network::inventory;
use fleetr_common::report::ProbeReport;
use fleetr_common::success;
use fleetr_core::check::check_hosts;
use tracing::{error, warn};

use super::CheckArgs;
use crate::terminal::{colors, format, print};

pub async fn check(args: CheckArgs, quiet: bool) -> anyhow::Result<()> {
    let hosts: HostSet = inventory::resolve(&args.inventory)
        .context("could not resolve the inventory")?;

    if hosts.is_empty() {
        warn!("The inventory resolved to zero hosts");
        print::no_hosts();
        return Ok(());
    }

    let timeout = Some(Duration::from_secs(args.connect_timeout));
    let reports: Vec<ProbeReport> = check_hosts(&hosts, args.port, timeout).await;
    let unreachable = reports.iter().filter(|report| !report.reachable).count();

    if !quiet {
        print_probes(&reports, args.only_errors);
    }

    if unreachable == 0 {
        success!("All ssh connections are ok.");
        return Ok(());
    }

    for report in reports.iter().filter(|report| !report.reachable) {
        error!("Cannot connect to {} on port {}", report.target, args.port);
    }
    if args.strict {
        bail!("{unreachable} of {} host(s) are unreachable", reports.len());
    }
    Ok(())
}

fn print_probes(reports: &[ProbeReport], only_errors: bool) {
    let details: Vec<format::Detail> = reports
        .iter()
        .filter(|report| !only_errors || !report.reachable)
        .map(|report| {
            let status = if report.reachable {
                "reachable".color(colors::SUCCESS)
            } else {
                "unreachable".color(colors::FAILURE)
            };
            (report.target.to_string(), status)
        })
        .collect();

    if !details.is_empty() {
        print::tree_head(0, "SSH port");
        print::as_tree_one_level(details);
    }
}
