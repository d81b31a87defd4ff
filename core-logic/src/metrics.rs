use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub sends: SendMetrics,
    pub api: ApiMetrics,
    pub uptime_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMetrics {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub throttled: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMetrics {
    pub total_calls: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

/// Lock-free counters shared by all send paths.
#[derive(Debug)]
pub struct MetricsCollector {
    sends_attempted: AtomicU64,
    sends_succeeded: AtomicU64,
    sends_failed: AtomicU64,
    sends_throttled: AtomicU64,
    api_calls: AtomicU64,
    api_latency_sum_ms: AtomicU64,
    api_min_latency_ms: AtomicU64,
    api_max_latency_ms: AtomicU64,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            sends_attempted: AtomicU64::new(0),
            sends_succeeded: AtomicU64::new(0),
            sends_failed: AtomicU64::new(0),
            sends_throttled: AtomicU64::new(0),
            api_calls: AtomicU64::new(0),
            api_latency_sum_ms: AtomicU64::new(0),
            api_min_latency_ms: AtomicU64::new(u64::MAX),
            api_max_latency_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    pub fn global() -> &'static Self {
        static INSTANCE: std::sync::OnceLock<MetricsCollector> = std::sync::OnceLock::new();
        INSTANCE.get_or_init(MetricsCollector::default)
    }

    pub fn record_send(&self, latency: Duration, outcome: SendRecord) {
        self.sends_attempted.fetch_add(1, Ordering::SeqCst);
        match outcome {
            SendRecord::Succeeded => {
                self.sends_succeeded.fetch_add(1, Ordering::SeqCst);
            }
            SendRecord::Failed => {
                self.sends_failed.fetch_add(1, Ordering::SeqCst);
            }
            SendRecord::Throttled => {
                self.sends_throttled.fetch_add(1, Ordering::SeqCst);
            }
        }

        let latency_ms = latency.as_millis() as u64;
        self.api_calls.fetch_add(1, Ordering::SeqCst);
        self.api_latency_sum_ms.fetch_add(latency_ms, Ordering::SeqCst);
        self.api_min_latency_ms.fetch_min(latency_ms, Ordering::SeqCst);
        self.api_max_latency_ms.fetch_max(latency_ms, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempted = self.sends_attempted.load(Ordering::SeqCst);
        let succeeded = self.sends_succeeded.load(Ordering::SeqCst);
        let failed = self.sends_failed.load(Ordering::SeqCst);
        let throttled = self.sends_throttled.load(Ordering::SeqCst);

        let calls = self.api_calls.load(Ordering::SeqCst);
        let latency_sum = self.api_latency_sum_ms.load(Ordering::SeqCst);
        let min_latency = self.api_min_latency_ms.load(Ordering::SeqCst);
        let max_latency = self.api_max_latency_ms.load(Ordering::SeqCst);

        MetricsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            sends: SendMetrics {
                attempted,
                succeeded,
                failed,
                throttled,
                success_rate: if attempted > 0 {
                    (succeeded as f64 / attempted as f64) * 100.0
                } else {
                    0.0
                },
            },
            api: ApiMetrics {
                total_calls: calls,
                avg_latency_ms: if calls > 0 {
                    latency_sum as f64 / calls as f64
                } else {
                    0.0
                },
                min_latency_ms: if min_latency == u64::MAX { 0 } else { min_latency },
                max_latency_ms: max_latency,
            },
            uptime_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}

/// How a single send resolved, for metrics purposes.
#[derive(Debug, Clone, Copy)]
pub enum SendRecord {
    Succeeded,
    Failed,
    Throttled,
}
