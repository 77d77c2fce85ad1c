pub mod command;
pub mod config;
pub mod error;
pub mod log;
pub mod network;
pub mod report;

pub use error::{Error, Result};
