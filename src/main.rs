use std::process::ExitCode;

use blurpad::cli::{self, CliArgs};
use blurpad::logger;
use clap::Parser;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    match &args.log_file {
        Some(path) => logger::init_at(path),
        None => logger::init(),
    }

    cli::run(args)
}
