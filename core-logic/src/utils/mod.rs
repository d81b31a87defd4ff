//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

// Internal modules - not part of public API
pub(crate) mod logger;
pub(crate) mod pacer;
pub(crate) mod retry;
pub(crate) mod runner;

// Selective exports - only public utilities
pub use logger::{setup_logger, setup_logger_with_file};
pub use pacer::{run_paced, CallOutcome, DispatchStats};
pub use retry::{with_retry, RetryConfig};
pub use runner::WorkerRunner;
