//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ScalarProduct",
    about = "Privately computes the scalar product of two vectors on MPC computation servers"
)]
pub(crate) struct Args {
    /// Set the configuration file.
    #[arg(short, long, default_value = "client.cfg")]
    pub conf: PathBuf,
}
