use std::error::Error;

use clap::Parser;
use tetherfs_wire::{CommandType, Envelope, SetWatchPathsPayload};

use crate::cli::Cli;

/// `SetWatchPaths` (§4.5 Commands, §6): replaces the core's entire
/// configured watch-path prefix set (§4.6 `clear_watch_paths` then
/// repeated `add_watch_path`). Each path must end in a path separator.
#[derive(Parser, Debug)]
pub struct SetWatchPathsCmd {
    #[arg(required = true)]
    pub paths: Vec<String>,
}

pub fn run(cmd: &SetWatchPathsCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut session = tetherfs_transport::connect(&cli.channel)?;
    session.send(&Envelope::new(
        CommandType::SetWatchPaths as u32,
        SetWatchPathsPayload {
            paths: cmd.paths.clone(),
        }
        .encode(),
    ))?;
    session.recv()?;
    println!("watch paths set ({} entries)", cmd.paths.len());
    Ok(())
}
