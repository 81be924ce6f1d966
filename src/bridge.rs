//! Drives asynchronous agent calls from the synchronous render loop.

use std::future::Future;
use std::io;
use tokio::runtime::{Builder, Runtime};

/// Owns a current-thread runtime and blocks on one future at a time.
///
/// `run` takes `&mut self`, so overlapping calls cannot be expressed.
pub struct AsyncBridge {
    runtime: Runtime,
}

impl AsyncBridge {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime })
    }

    /// Run `future` to completion and hand back its output unchanged.
    pub fn run<F: Future>(&mut self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
