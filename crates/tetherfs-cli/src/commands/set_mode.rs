use std::error::Error;

use clap::{Parser, ValueEnum};
use tetherfs_core::OperationMode;
use tetherfs_wire::{CommandType, Envelope, SetOperationModePayload};

use crate::cli::Cli;

/// `SetOperationMode` (§4.5 Commands, §4.6): sets the process-wide mode
/// bitset.
#[derive(Parser, Debug)]
pub struct SetModeCmd {
    pub mode: ModeArg,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
pub enum ModeArg {
    Disabled,
    Fetch,
    Watch,
    FetchWatch,
}

impl From<ModeArg> for OperationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Disabled => OperationMode::DISABLED,
            ModeArg::Fetch => OperationMode::FETCH_ENABLED,
            ModeArg::Watch => OperationMode::WATCH_ENABLED,
            ModeArg::FetchWatch => OperationMode::FETCH_ENABLED | OperationMode::WATCH_ENABLED,
        }
    }
}

pub fn run(cmd: &SetModeCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mode: OperationMode = cmd.mode.into();
    let mut session = tetherfs_transport::connect(&cli.channel)?;
    session.send(&Envelope::new(
        CommandType::SetOperationMode as u32,
        SetOperationModePayload { mode: mode.bits() }.encode(),
    ))?;
    session.recv()?;
    println!("operation mode set to {:?}", cmd.mode);
    Ok(())
}
