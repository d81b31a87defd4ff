use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Aggregate counts reported by a worker when its loop finishes.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    pub succeeded: u64,
    pub failed: u64,
}

/// A long-running loop that the runner spawns and shuts down via token.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Short name used in logs and worker spans.
    fn name(&self) -> &str;

    /// Run until done or until the token is cancelled.
    ///
    /// Implementations must observe cancellation at their own loop
    /// boundaries and must not abandon in-flight work silently.
    async fn start(&self, cancellation_token: CancellationToken) -> Result<WorkerStats>;
}
