//! Tracing subscriber setup.

use std::fs::File;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Log file written when `PILOT_LOG` is set.
pub const LOG_FILE: &str = "pilot.log";

/// Install the global subscriber.
///
/// `PILOT_LOG` sends `pilot=debug` to [`LOG_FILE`]. Otherwise `RUST_LOG` is
/// honored on stderr, but only when `one_shot`: the chat screen owns the
/// terminal and must never be written over.
pub fn init_logging(one_shot: bool) {
    if std::env::var("PILOT_LOG").is_ok() {
        match File::create(LOG_FILE) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false);
                let filter = EnvFilter::new("pilot=debug");
                let _ = tracing_subscriber::registry()
                    .with(file_layer.with_filter(filter))
                    .try_init();
            }
            Err(err) => {
                eprintln!("Failed to create log file: {err}");
            }
        }
    } else if one_shot && std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }
}
