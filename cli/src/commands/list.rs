use anyhow::Context;
use fleetr_common::network::host::HostSet;
use fleetr_common::network::inventory;

use super::ListArgs;
use crate::terminal::{format, print};

pub fn list(args: ListArgs) -> anyhow::Result<()> {
    let hosts: HostSet = inventory::resolve(&args.inventory)
        .context("could not resolve the inventory")?;

    if hosts.is_empty() {
        print::no_hosts();
        return Ok(());
    }

    print::print_status(format!("{} host(s) as {}", hosts.len(), hosts.shape()));
    for (idx, target) in hosts.targets().iter().enumerate() {
        print::tree_head(idx, target.name.as_deref().unwrap_or("unnamed host"));
        print::as_tree_one_level(vec![format::address_to_detail(&target.address)]);
    }
    Ok(())
}
