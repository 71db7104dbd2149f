//! One module per administrative subcommand: a `clap::Parser` struct and
//! a `run` function taking that struct plus the parsed [`crate::cli::Cli`].

mod get_version;
mod reload_policy;
mod set_mode;
mod set_report_rate;
mod set_watch_paths;
mod watch;

pub use get_version::GetVersionCmd;
pub use reload_policy::ReloadPolicyCmd;
pub use set_mode::SetModeCmd;
pub use set_report_rate::SetReportRateCmd;
pub use set_watch_paths::SetWatchPathsCmd;
pub use watch::WatchCmd;

use std::error::Error;

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Commands::GetVersion(cmd) => get_version::run(cmd, cli),
        Commands::ReloadPolicy(cmd) => reload_policy::run(cmd, cli),
        Commands::SetMode(cmd) => set_mode::run(cmd, cli),
        Commands::SetWatchPaths(cmd) => set_watch_paths::run(cmd, cli),
        Commands::SetReportRate(cmd) => set_report_rate::run(cmd, cli),
        Commands::Watch(cmd) => watch::run(cmd, cli),
    }
}
