use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use fleetr_common::command::CommandSet;
use fleetr_common::config::ExecutionMode;
use fleetr_common::network::host::HostSet;
use fleetr_common::network::inventory;
use fleetr_common::report::RunReport;
use fleetr_common::success;
use fleetr_core::network::transport::OpenSshTransport;
use fleetr_core::pipeline::Pipeline;
use tracing::{error, warn};

use super::RunArgs;
use crate::fprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn run(args: RunArgs, quiet: bool) -> anyhow::Result<()> {
    let hosts: HostSet = inventory::resolve(&args.inventory)
        .context("could not resolve the inventory")?;
    let commands: CommandSet = CommandSet::new(args.commands.iter())?;

    if hosts.is_empty() {
        warn!("The inventory resolved to zero hosts");
        print::no_hosts();
        return Ok(());
    }

    let mode = if args.concurrent {
        ExecutionMode::Concurrent
    } else {
        ExecutionMode::Sequential
    };

    let total = hosts.len();
    spinner::start(total);

    let start_time: Instant = Instant::now();
    let mut pipeline = Pipeline::new(Arc::new(OpenSshTransport::new()), args.to_config())
        .with_progress(move |settled| spinner::report_progress(settled, total));
    let outcome = pipeline.run(&hosts, &commands, mode).await;

    spinner::finish();

    let report: RunReport = match outcome {
        Ok(report) => report,
        Err(err) => {
            if let Some(partial) = err.partial_report() {
                print_report(partial, start_time.elapsed(), quiet);
                error!("Run aborted under the strict policy");
            }
            return Err(err.into());
        }
    };
    print_report(&report, start_time.elapsed(), quiet);

    if !report.is_clean() {
        warn!(
            "{} host(s) failed and {} were skipped",
            report.failed(),
            report.skipped()
        );
    }
    Ok(())
}

fn print_report(report: &RunReport, total_time: Duration, quiet: bool) {
    if !quiet {
        fprint!();
        print::header("Results", quiet);
        for (idx, host) in report.hosts.iter().enumerate() {
            let name = host.target.name.as_deref().unwrap_or("unnamed host");
            print::tree_head(idx, name);
            print::as_tree_one_level(format::host_to_details(host));
            if idx + 1 != report.hosts.len() {
                fprint!();
            }
        }
    }

    let succeeded: ColoredString = format!("{} succeeded", report.succeeded()).bold().green();
    let failed: ColoredString = format!("{} failed", report.failed()).bold().red();
    let skipped: ColoredString = format!("{} skipped", report.skipped()).bold().yellow();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output = format!("Run Complete: {succeeded}, {failed}, {skipped} in {total_time}")
        .color(colors::TEXT_DEFAULT);

    if quiet {
        success!("{}", output);
    } else {
        print::fat_separator();
        print::centerln(&output.to_string());
    }
}
