//! # Host Model
//!
//! The canonical, validated form of an inventory.

use std::collections::BTreeMap;
use std::fmt;

use super::address::Address;

/// Resolved inventory. The shape mirrors what the caller supplied and is
/// preserved through execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSet {
    /// A single address.
    Single(Address),
    /// Unlabelled addresses, in the order given.
    List(Vec<Address>),
    /// Name to address. Names are unique, addresses need not be.
    Named(BTreeMap<String, Address>),
}

impl HostSet {
    /// Every dispatch target in iteration order.
    pub fn targets(&self) -> Vec<HostTarget> {
        match self {
            HostSet::Single(address) => vec![HostTarget::unnamed(*address)],
            HostSet::List(addresses) => addresses.iter().copied().map(HostTarget::unnamed).collect(),
            HostSet::Named(hosts) => hosts
                .iter()
                .map(|(name, address)| HostTarget::named(name.clone(), *address))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HostSet::Single(_) => 1,
            HostSet::List(addresses) => addresses.len(),
            HostSet::Named(hosts) => hosts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &'static str {
        match self {
            HostSet::Single(_) => "single host",
            HostSet::List(_) => "address list",
            HostSet::Named(_) => "named hosts",
        }
    }
}

/// One unit of dispatch. The name only ever labels output; the address is dialed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    pub name: Option<String>,
    pub address: Address,
}

impl HostTarget {
    pub fn unnamed(address: Address) -> Self {
        Self { name: None, address }
    }

    pub fn named(name: String, address: Address) -> Self {
        Self {
            name: Some(name),
            address,
        }
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => write!(f, "{}", self.address),
        }
    }
}
