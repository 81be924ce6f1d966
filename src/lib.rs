#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod agent;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod tui;
