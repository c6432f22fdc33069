//! huddle-core library.
//!
//! Domain model, storage and ingestion for team voice-communication
//! analytics. The metric engine itself lives in `huddle-network` and only
//! talks to this crate through the [`store`] traits.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` at storage boundaries, `thiserror` types
//!   for domain parse failures, each mapped to an [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod lock;
pub mod model;
pub mod store;
