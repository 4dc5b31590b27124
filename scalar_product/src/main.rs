use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use mpc_controller::ControllerConfiguration;

mod cli;
mod demo;
mod logging;

use cli::Args;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // configuration problems are reported on stderr before any log file exists
    let config = ControllerConfiguration::load(&args.conf)
        .context("failed to load controller configuration")?;
    logging::init(Path::new(logging::LOG_FILE))?;

    Ok(demo::run(&config))
}
