mod cli;
mod commands;

use clap::Parser;

use cli::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = commands::dispatch(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
