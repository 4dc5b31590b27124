//! Log backend writing every record to the console and the run's log file.

use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target, WriteStyle};

/// Log file created in the working directory, overwritten on every run.
pub(crate) const LOG_FILE: &str = "ScalarProduct.log";

/// Duplicates each formatted record to stdout and a file.
///
/// The file is unbuffered and stdout flushes per line, so a record has reached
/// both sinks once `write` returns.
struct Tee {
    file: File,
}

impl Write for Tee {
    // a closed stdout must not cost the log file its record
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let console = io::stdout().write_all(buf);
        let file = self.file.write_all(buf);
        console.and(file).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let console = io::stdout().flush();
        let file = self.file.flush();
        console.and(file)
    }
}

/// Install the global logger. Defaults to `info`, `RUST_LOG` overrides it.
pub(crate) fn init(log_path: &Path) -> Result<()> {
    let file = File::create(log_path)
        .with_context(|| format!("failed to create log file '{}'", log_path.display()))?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(Tee { file })))
        .write_style(WriteStyle::Never)
        .try_init()
        .context("failed to install logger")?;
    Ok(())
}
