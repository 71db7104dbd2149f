use std::error::Error;

use clap::Parser;
use tetherfs_wire::{CommandType, Envelope};

use crate::cli::Cli;

/// `ReloadPolicy` (§4.5 Commands, §6): tells the core to re-read
/// `OperationMode`/`ReportRate`/`WatchPaths` from its configuration
/// store (§4.6 `reload_from_config`).
#[derive(Parser, Debug)]
pub struct ReloadPolicyCmd;

pub fn run(_cmd: &ReloadPolicyCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut session = tetherfs_transport::connect(&cli.channel)?;
    session.send(&Envelope::new(CommandType::ReloadPolicy as u32, Vec::new()))?;
    session.recv()?;
    println!("policy reloaded");
    Ok(())
}
