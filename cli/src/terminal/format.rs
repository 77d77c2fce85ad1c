use colored::*;
use fleetr_common::network::address::Address;
use fleetr_common::report::{ExecutionResult, HostReport};

use crate::terminal::colors;

const COMMAND_WIDTH: usize = 24;

pub type Detail = (String, ColoredString);

pub fn address_to_detail(address: &Address) -> Detail {
    let (key, color) = if address.is_ipv6() {
        ("IPv6", colors::IPV6_ADDR)
    } else {
        ("IPv4", colors::IPV4_ADDR)
    };
    (key.to_string(), address.to_string().color(color))
}

pub fn result_to_status(result: &ExecutionResult) -> ColoredString {
    match result {
        ExecutionResult::Success { .. } => "ok".color(colors::SUCCESS),
        ExecutionResult::ConnectivityFailure => "unreachable".color(colors::FAILURE),
        ExecutionResult::CommandFailure { exit_code, .. } => {
            format!("exit {exit_code}").color(colors::FAILURE)
        }
        ExecutionResult::TransportException { cause } => {
            format!("transport error: {cause}").color(colors::FAILURE)
        }
    }
}

/// One line per command, keyed by the (shortened) command text.
pub fn host_to_details(report: &HostReport) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![address_to_detail(&report.target.address)];

    if report.skipped {
        details.push(("Status".to_string(), "skipped".color(colors::SKIPPED)));
        return details;
    }

    details.extend(
        report
            .records
            .iter()
            .map(|record| (shorten(&record.command), result_to_status(&record.result))),
    );
    details
}

fn shorten(command: &str) -> String {
    if command.chars().count() <= COMMAND_WIDTH {
        return command.to_string();
    }
    let head: String = command.chars().take(COMMAND_WIDTH - 1).collect();
    format!("{head}…")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
