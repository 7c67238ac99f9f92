use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::Env;

/// Log to stderr, `info` and up unless `RUST_LOG` says otherwise.
pub fn init_stderr() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Log to `path`, appending. The board owns the terminal, so without a log
/// file nothing is logged at all.
pub fn init_file(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .init();
    Ok(())
}
