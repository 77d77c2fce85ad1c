//! Error taxonomy for inventory resolution and remote execution.

use thiserror::Error;

use crate::network::source::SourceError;
use crate::report::RunReport;

#[derive(Debug, Error)]
pub enum Error {
    /// A string failed address validation where an address was required.
    #[error("'{0}' is not a valid IPv4/IPv6 address")]
    InvalidAddress(String),

    /// The inventory did not match any recognised shape, or a source could not be loaded.
    #[error("unresolvable inventory: {0}")]
    UnresolvableInventory(String),

    /// Neither the mapping nor its transpose has only valid addresses on the value side.
    #[error(
        "invalid host mapping: mapping must resolve to name -> address with valid addresses on the address side"
    )]
    InvalidHostMapping,

    /// The command list was empty.
    #[error("at least one command is required")]
    EmptyCommandSet,

    #[error("cannot connect to {host}")]
    HostUnreachable { host: String },

    #[error("command `{command}` failed on {host} with exit code {exit_code}")]
    CommandFailure {
        host: String,
        command: String,
        exit_code: i32,
    },

    #[error("transport error on {host} while running `{command}`: {cause}")]
    Transport {
        host: String,
        command: String,
        cause: String,
    },

    /// A strict failure, together with every host report gathered before the
    /// run ended.
    #[error("{cause}")]
    Aborted {
        cause: Box<Error>,
        report: Box<RunReport>,
    },
}

impl Error {
    /// Resolution-time errors are fatal to the whole invocation: there is no
    /// host set to dispatch against yet.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_)
                | Error::UnresolvableInventory(_)
                | Error::InvalidHostMapping
                | Error::EmptyCommandSet
        )
    }

    /// The failure that ended the run, without the partial report around it.
    pub fn root(&self) -> &Error {
        match self {
            Error::Aborted { cause, .. } => cause.root(),
            other => other,
        }
    }

    /// Host reports gathered before a strict run was aborted.
    pub fn partial_report(&self) -> Option<&RunReport> {
        match self {
            Error::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::UnresolvableInventory(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
