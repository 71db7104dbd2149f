use std::error::Error;

use clap::Parser;
use tetherfs_wire::{CommandType, Envelope, VersionReply};

use crate::cli::Cli;

/// `GetVersion` (§4.5 Commands, §6): queries the protocol version the
/// running core speaks.
#[derive(Parser, Debug)]
pub struct GetVersionCmd;

pub fn run(_cmd: &GetVersionCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut session = tetherfs_transport::connect(&cli.channel)?;
    session.send(&Envelope::new(CommandType::GetVersion as u32, Vec::new()))?;
    let reply = session.recv()?;
    let version = VersionReply::decode(&reply.body)?;
    println!("tetherfs-core protocol version {}.{}", version.major, version.minor);
    Ok(())
}
