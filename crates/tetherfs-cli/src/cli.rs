use clap::{Parser, Subcommand};

use crate::commands::{
    GetVersionCmd, ReloadPolicyCmd, SetModeCmd, SetReportRateCmd, SetWatchPathsCmd, WatchCmd,
};

/// Administrative front-end for the helper channel (§4.5, §6): every
/// subcommand opens its own connection, issues one command (or, for
/// `watch`, a pair of them), and exits — the channel accepts only one
/// client at a time, so nothing here holds a connection open longer
/// than the subcommand needs.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The helper channel's well-known name (§6 "one well-known channel
    /// name"). Defaults to the name `tetherfs-core` listens on.
    #[arg(long, default_value = "tetherfs-helper")]
    pub channel: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queries the running core's protocol version.
    GetVersion(GetVersionCmd),
    /// Tells the core to re-read policy from its configuration store.
    ReloadPolicy(ReloadPolicyCmd),
    /// Sets the operation mode bitset (disabled / fetch / watch).
    SetMode(SetModeCmd),
    /// Replaces the configured watch-path prefix set.
    SetWatchPaths(SetWatchPathsCmd),
    /// Sets the sampled-access report rate (0-10000).
    SetReportRate(SetReportRateCmd),
    /// Arms watching for a path prefix and report rate, then blocks until
    /// interrupted.
    Watch(WatchCmd),
}
