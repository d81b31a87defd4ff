//! # Core Logic - Shared Utilities for the Relay Toolkit
//!
//! This crate provides the pieces shared by the messaging load tester
//! and the stream-relay supervisor.
//!
//! ## Modules
//!
//! - [`config`] - Pacing configuration for the dispatch loop
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Send/latency metrics collection
//! - [`traits`] - Worker trait shared by both services
//! - [`utils`] - Pacer, retry, logger and worker runner

pub mod config;
pub mod error;
pub mod metrics;
pub mod traits;
pub(crate) mod utils;

pub use config::PacingConfig;
pub use error::{ConfigError, CoreError, NetworkError, ProcessError};
pub use metrics::{MetricsCollector, MetricsSnapshot, SendRecord};
pub use traits::{Worker, WorkerStats};

pub use utils::{
    run_paced, setup_logger, setup_logger_with_file, with_retry, CallOutcome, DispatchStats,
    RetryConfig, WorkerRunner,
};
