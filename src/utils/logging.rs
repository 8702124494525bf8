//! Diagnostic output for the binary.
//!
//! Library code only emits `tracing` events; this installs the subscriber
//! that prints them to stderr, so stdout stays clean for command output.

use tracing_subscriber::EnvFilter;

/// Filter used for a given number of `-v` flags when `RUST_LOG` is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "chatshelf=debug,warn",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbosity` unless
/// at least one `-v` was given. Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let filter = match (verbosity, EnvFilter::try_from_default_env()) {
        (0, Ok(from_env)) => from_env,
        _ => EnvFilter::new(default_directive(verbosity)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .try_init();
}
