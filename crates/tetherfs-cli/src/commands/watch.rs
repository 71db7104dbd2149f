use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tetherfs_wire::{CommandType, Envelope, SetReportRatePayload, SetWatchPathsPayload};

use crate::cli::Cli;

/// Arms watching for one path prefix at a given report rate, then blocks
/// until interrupted. The sampled access events themselves (§4.1.5) are
/// emitted through the host's own event/telemetry channel — telemetry
/// emission is an external collaborator per §1, out of this channel's
/// wire format (§6) — so this subcommand's job stops at configuring the
/// sampling, not at ferrying events back over the administrative
/// connection.
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Directory-prefix path to watch; must end in a path separator.
    pub path: String,

    /// Sampled-access report rate to apply for the duration of the watch.
    #[arg(short, long, default_value_t = 10_000)]
    pub rate: u32,
}

pub fn run(cmd: &WatchCmd, cli: &Cli) -> Result<(), Box<dyn Error>> {
    {
        let mut session = tetherfs_transport::connect(&cli.channel)?;
        session.send(&Envelope::new(
            CommandType::SetWatchPaths as u32,
            SetWatchPathsPayload {
                paths: vec![cmd.path.clone()],
            }
            .encode(),
        ))?;
        session.recv()?;
        session.send(&Envelope::new(
            CommandType::SetReportRate as u32,
            SetReportRatePayload {
                report_rate: cmd.rate,
            }
            .encode(),
        ))?;
        session.recv()?;
    }

    println!(
        "watching {} at rate {} (ctrl-c to stop)",
        cmd.path,
        cmd.rate.min(10_000)
    );

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(250));
    }
    println!("stopped watching {}", cmd.path);
    Ok(())
}
