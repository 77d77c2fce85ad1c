//! # Inventory Resolution
//!
//! Turns whatever the caller described into a [`HostSet`].
//!
//! An inventory can be:
//! * A single address (`10.0.0.5`) or a single YAML source (`hosts.yaml`).
//! * A list of addresses, a list of YAML sources, or a list of mappings.
//! * A mapping of `name -> address`, or the same mapping written inverted.
//!
//! Mappings are oriented by checking which side holds valid addresses. This is
//! best effort: when both sides validate the mapping is taken as written.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::address::{self, Address};
use super::host::HostSet;
use super::source::{self, SourceLoader, YamlFileLoader};

/// A mapping as supplied, before its direction is known.
pub type RawMapping = BTreeMap<String, String>;

/// Raw inventory description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryInput {
    /// An address or a source identifier.
    Scalar(String),
    /// Addresses, source identifiers or mappings. Must be uniform.
    Sequence(Vec<InventoryItem>),
    /// A mapping in either direction.
    Mapping(RawMapping),
}

/// One element of an [`InventoryInput::Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryItem {
    Text(String),
    Hosts(RawMapping),
}

impl FromStr for InventoryInput {
    type Err = String;

    /// Parses the command-line form of an inventory.
    ///
    /// * `10.0.0.5` or `hosts.yaml` is a scalar.
    /// * `10.0.0.5,10.0.0.6` or `a.yaml,b.yaml` is a sequence.
    /// * `web1=10.0.0.5,web2=10.0.0.6` is a mapping.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let items: Vec<InventoryItem> = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_item)
            .collect::<std::result::Result<_, _>>()?;

        match items.as_slice() {
            [] => Err(format!("invalid inventory: '{s}'")),
            [InventoryItem::Text(single)] => Ok(InventoryInput::Scalar(single.clone())),
            _ if items.iter().all(|item| matches!(item, InventoryItem::Hosts(_))) => {
                Ok(InventoryInput::Mapping(merge_mappings(items.iter().filter_map(
                    |item| match item {
                        InventoryItem::Hosts(hosts) => Some(hosts),
                        InventoryItem::Text(_) => None,
                    },
                ))))
            }
            _ => Ok(InventoryInput::Sequence(items)),
        }
    }
}

fn parse_item(part: &str) -> std::result::Result<InventoryItem, String> {
    let Some((name, address)) = part.split_once('=') else {
        return Ok(InventoryItem::Text(part.to_string()));
    };

    let (name, address) = (name.trim(), address.trim());
    if name.is_empty() || address.is_empty() {
        return Err(format!("invalid host pair '{part}', expected name=address"));
    }

    Ok(InventoryItem::Hosts(RawMapping::from([(
        name.to_string(),
        address.to_string(),
    )])))
}

impl From<HostSet> for InventoryInput {
    fn from(hosts: HostSet) -> Self {
        match hosts {
            HostSet::Single(address) => InventoryInput::Scalar(address.to_string()),
            HostSet::List(addresses) => InventoryInput::Sequence(
                addresses
                    .iter()
                    .map(|address| InventoryItem::Text(address.to_string()))
                    .collect(),
            ),
            HostSet::Named(hosts) => InventoryInput::Mapping(
                hosts
                    .into_iter()
                    .map(|(name, address)| (name, address.to_string()))
                    .collect(),
            ),
        }
    }
}

/// Resolves an inventory, reading YAML sources from the filesystem.
pub fn resolve(input: &InventoryInput) -> Result<HostSet> {
    resolve_with(input, &YamlFileLoader)
}

/// Resolves an inventory with a caller-provided source loader.
pub fn resolve_with(input: &InventoryInput, loader: &dyn SourceLoader) -> Result<HostSet> {
    let hosts = match input {
        InventoryInput::Scalar(s) => resolve_scalar(s, loader)?,
        InventoryInput::Sequence(items) => resolve_sequence(items, loader)?,
        InventoryInput::Mapping(mapping) => HostSet::Named(resolve_direction(mapping)?),
    };

    debug!("Resolved inventory into {} with {} host(s)", hosts.shape(), hosts.len());
    Ok(hosts)
}

fn resolve_scalar(s: &str, loader: &dyn SourceLoader) -> Result<HostSet> {
    if source::is_yaml_source(s) {
        let merged = loader.load_hosts(s)?;
        return Ok(HostSet::Named(resolve_direction(&merged)?));
    }

    if let Ok(address) = s.parse::<Address>() {
        return Ok(HostSet::Single(address));
    }

    Err(Error::UnresolvableInventory(format!(
        "'{s}' is neither an address nor a YAML source"
    )))
}

fn resolve_sequence(items: &[InventoryItem], loader: &dyn SourceLoader) -> Result<HostSet> {
    if items.is_empty() {
        return Err(Error::UnresolvableInventory("inventory is empty".to_string()));
    }

    let texts: Option<Vec<&str>> = items
        .iter()
        .map(|item| match item {
            InventoryItem::Text(s) => Some(s.as_str()),
            InventoryItem::Hosts(_) => None,
        })
        .collect();

    if let Some(texts) = texts {
        // Each file is oriented on its own, so files may disagree on direction.
        if texts.iter().all(|s| source::is_yaml_source(s)) {
            let mut merged: BTreeMap<String, Address> = BTreeMap::new();
            for path in texts {
                merged.extend(resolve_direction(&loader.load_hosts(path)?)?);
            }
            return Ok(HostSet::Named(merged));
        }

        if address::all_valid(&texts) {
            let addresses = texts
                .iter()
                .map(|s| s.parse::<Address>())
                .collect::<Result<Vec<_>>>()?;
            return Ok(HostSet::List(addresses));
        }

        return Err(Error::UnresolvableInventory(
            "a list must hold only addresses or only YAML sources".to_string(),
        ));
    }

    let mappings: Option<Vec<&RawMapping>> = items
        .iter()
        .map(|item| match item {
            InventoryItem::Hosts(hosts) => Some(hosts),
            InventoryItem::Text(_) => None,
        })
        .collect();

    match mappings {
        Some(mappings) => Ok(HostSet::Named(resolve_direction(&merge_mappings(mappings))?)),
        None => Err(Error::UnresolvableInventory(
            "a list cannot mix mappings with addresses or sources".to_string(),
        )),
    }
}

/// Merges mappings in order; later entries overwrite earlier ones.
fn merge_mappings<'a, I>(mappings: I) -> RawMapping
where
    I: IntoIterator<Item = &'a RawMapping>,
{
    let mut merged = RawMapping::new();
    for mapping in mappings {
        merged.extend(mapping.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Orients a mapping so that addresses end up on the value side.
///
/// Returns the mapping as written when all of its values are addresses,
/// otherwise its transpose when all of its keys are.
pub fn resolve_direction(mapping: &RawMapping) -> Result<BTreeMap<String, Address>> {
    if address::all_valid(mapping.values()) {
        return to_named(mapping);
    }

    let transposed = transpose(mapping);
    if address::all_valid(transposed.values()) {
        debug!("Host mapping is written address -> name, transposing");
        return to_named(&transposed);
    }

    Err(Error::InvalidHostMapping)
}

/// Swaps keys and values. On duplicate values the last key wins and the
/// overwritten entries are logged.
pub fn transpose(mapping: &RawMapping) -> RawMapping {
    let mut transposed = RawMapping::new();
    for (key, value) in mapping {
        if let Some(previous) = transposed.insert(value.clone(), key.clone()) {
            warn!("'{value}' is listed under both '{previous}' and '{key}', keeping '{key}'");
        }
    }
    transposed
}

fn to_named(mapping: &RawMapping) -> Result<BTreeMap<String, Address>> {
    mapping
        .iter()
        .map(|(name, address)| address.parse::<Address>().map(|parsed| (name.clone(), parsed)))
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
