use std::error::Error;

use clap::Parser;
use tetherfs_wire::{CommandType, Envelope, SetReportRatePayload};

use crate::cli::Cli;

/// `SetReportRate` (§4.5 Commands, §4.6): the sampled-access report rate,
/// clamped by the core to `[0, 10000]`.
#[derive(Parser, Debug)]
pub struct SetReportRateCmd {
    pub rate: u32,
}

pub fn run(cmd: &SetReportRateCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut session = tetherfs_transport::connect(&cli.channel)?;
    session.send(&Envelope::new(
        CommandType::SetReportRate as u32,
        SetReportRatePayload {
            report_rate: cmd.rate,
        }
        .encode(),
    ))?;
    session.recv()?;
    println!("report rate set to {}", cmd.rate.min(10_000));
    Ok(())
}
