pub mod check;
pub mod list;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use fleetr_common::config::{Config, DEFAULT_SSH_PORT, FailurePolicy};
use fleetr_common::network::inventory::InventoryInput;

const DEFAULT_LOG_FILE: &str = "fleetr.log";

#[derive(Parser)]
#[command(name = "fleetr")]
#[command(version)]
#[command(about = "Run shell commands across a fleet of hosts over SSH.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only show warnings, errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write the log to a file
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_LOG_FILE
    )]
    pub log_to_file: Option<PathBuf>,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run commands on every host of an inventory
    #[command(alias = "r")]
    Run(RunArgs),
    /// Check that every host accepts connections on its SSH port
    #[command(alias = "c", alias = "ssh-check")]
    Check(CheckArgs),
    /// Print the resolved inventory without contacting any host
    #[command(alias = "l")]
    List(ListArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Address, YAML file(s), address list or name=address pairs, comma separated
    #[arg(short, long)]
    pub inventory: InventoryInput,

    /// Commands to execute on every host, in order
    #[arg(short = 'c', long = "cmd", alias = "cmd-list", num_args = 1.., required = true)]
    pub commands: Vec<String>,

    /// User to connect as
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password to authenticate with (requires sshpass)
    #[arg(short, long, env = "FLEETR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// SSH port
    #[arg(short = 'P', long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Abort a host on its first failure and fail the run
    #[arg(short, long)]
    pub strict: bool,

    /// Probe the SSH port before running commands on a host
    #[arg(short = 'k', long, alias = "check-ssh-conn")]
    pub check_connectivity: bool,

    /// Timeout in seconds for connecting to a host
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// Timeout in seconds for a single command
    #[arg(long, value_name = "SECONDS")]
    pub exec_timeout: Option<u64>,

    /// Print the output of every command
    #[arg(long)]
    pub log_to_console: bool,

    /// Run all hosts at once instead of one after another
    #[arg(short = 'a', long, alias = "async")]
    pub concurrent: bool,

    /// Upper bound on hosts running at the same time
    #[arg(long, value_name = "N", requires = "concurrent")]
    pub max_parallel: Option<usize>,
}

impl RunArgs {
    pub fn to_config(&self) -> Config {
        Config {
            user: self.user.clone(),
            password: self.password.clone(),
            port: self.port,
            connect_timeout: self.connect_timeout.map(Duration::from_secs),
            exec_timeout: self.exec_timeout.map(Duration::from_secs),
            check_connectivity: self.check_connectivity,
            policy: FailurePolicy::from_strict_flag(self.strict),
            log_to_console: self.log_to_console,
            max_parallel: self.max_parallel,
        }
    }
}

#[derive(Args)]
pub struct CheckArgs {
    /// Address, YAML file(s), address list or name=address pairs, comma separated
    #[arg(short, long)]
    pub inventory: InventoryInput,

    /// SSH port
    #[arg(short = 'P', long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Fail if any host is unreachable
    #[arg(short, long)]
    pub strict: bool,

    /// Timeout in seconds for each connection attempt
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    pub connect_timeout: u64,

    /// Only print unreachable hosts
    #[arg(long)]
    pub only_errors: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Address, YAML file(s), address list or name=address pairs, comma separated
    #[arg(short, long)]
    pub inventory: InventoryInput,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
