//! Diagnostic logging for the binary. Library code only emits `tracing`
//! events; this installs the subscriber that prints them.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV_VAR: &str = "RELICARD_LOG";

/// Filter directive for a `-v` count when `RELICARD_LOG` is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "relicard=info",
        1 => "relicard=debug",
        _ => "relicard=trace",
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(default_directive(verbosity)),
    }
}

/// Open `path` for appending, creating it if needed, and check it is writable.
pub fn open_log_file(path: &Path) -> Result<File, Box<dyn std::error::Error>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.flush()?;
    Ok(file)
}

/// Install the global subscriber: stderr with colours, or `log_file`
/// without them.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(verbosity));
    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|err| -> Box<dyn std::error::Error> { err })
}
