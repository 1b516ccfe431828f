#![forbid(unsafe_code)]
//! proflens-core library.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types where appropriate.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod snapshot;
