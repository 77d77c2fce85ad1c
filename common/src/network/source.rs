//! # Inventory Sources
//!
//! Loads host groups from YAML inventory files. A source is a mapping of group
//! names, each group carrying a `hosts` mapping of `name: address` (or the
//! inverted `address: name`). Direction is not decided here; the resolver does
//! that once all sources are merged.
//!
//! ```yaml
//! web:
//!   hosts:
//!     web1: 10.0.0.5
//!     web2: 10.0.0.6
//! db:
//!   hosts:
//!     db1: 10.0.1.5
//! ```

use std::fs;

use serde_yaml::Value;
use thiserror::Error;

use super::inventory::RawMapping;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("'{0}' is not a YAML source (expected a .yml or .yaml file)")]
    NotYaml(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0}: top level must be a mapping of host groups")]
    NotAMapping(String),

    #[error("{path}: group '{group}' has no `hosts` mapping")]
    MissingHosts { path: String, group: String },

    #[error("{path}: host entries must be scalars, found {entry}")]
    NonScalarEntry { path: String, entry: String },
}

/// Whether a string names a YAML-bearing source.
pub fn is_yaml_source(s: &str) -> bool {
    s.ends_with(".yml") || s.ends_with(".yaml")
}

/// Turns a source identifier into the merged `hosts` entries of all its groups.
pub trait SourceLoader {
    fn load_hosts(&self, source: &str) -> Result<RawMapping, SourceError>;
}

/// Reads sources from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFileLoader;

impl SourceLoader for YamlFileLoader {
    fn load_hosts(&self, source: &str) -> Result<RawMapping, SourceError> {
        if !is_yaml_source(source) {
            return Err(SourceError::NotYaml(source.to_string()));
        }

        let text = fs::read_to_string(source).map_err(|source_err| SourceError::Io {
            path: source.to_string(),
            source: source_err,
        })?;

        hosts_from_yaml(source, &text)
    }
}

/// Extracts and merges every group's `hosts` entries from a YAML document.
///
/// Groups are merged in document order, so a name defined twice keeps the last value.
pub fn hosts_from_yaml(origin: &str, text: &str) -> Result<RawMapping, SourceError> {
    let document: Value = serde_yaml::from_str(text).map_err(|source| SourceError::Yaml {
        path: origin.to_string(),
        source,
    })?;

    let Value::Mapping(groups) = document else {
        return Err(SourceError::NotAMapping(origin.to_string()));
    };

    let mut hosts = RawMapping::new();
    for (group, body) in &groups {
        let Some(Value::Mapping(entries)) = body.get("hosts") else {
            return Err(SourceError::MissingHosts {
                path: origin.to_string(),
                group: scalar_to_string(group).unwrap_or_else(|| format!("{group:?}")),
            });
        };

        for (key, value) in entries {
            let (Some(key), Some(value)) = (scalar_to_string(key), scalar_to_string(value)) else {
                return Err(SourceError::NonScalarEntry {
                    path: origin.to_string(),
                    entry: format!("{key:?}: {value:?}"),
                });
            };
            hosts.insert(key, value);
        }
    }

    Ok(hosts)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
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
