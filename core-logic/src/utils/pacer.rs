//! # Paced Batch Dispatch
//!
//! Generic tick loop for delivering a fixed budget of outbound calls
//! without exceeding a per-tick ceiling. One tick per second in
//! production; calls inside a tick run concurrently and the loop only
//! decides anything after the whole batch has resolved.

use crate::config::PacingConfig;
use anyhow::Result;
use futures::future::join_all;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a single outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The receiving service acknowledged the call.
    Ack,
    /// The receiving service asked the caller to slow down.
    Throttled { retry_after: Duration },
}

/// Counters accumulated across the whole dispatch run.
#[derive(Debug, Default, Clone)]
pub struct DispatchStats {
    /// Budget consumed. Never exceeds `PacingConfig::total_calls`.
    pub accepted: u64,
    /// Calls that came back `Ack`.
    pub succeeded: u64,
    /// Calls that errored or returned a malformed response.
    pub failed: u64,
    /// Ticks whose count was discarded because of a throttle signal.
    pub throttle_pauses: u64,
    /// Batches issued, including retried ones.
    pub ticks: u64,
}

/// Drive `call` until the budget is spent.
///
/// Each tick dispatches `min(remaining, max_per_tick)` calls
/// concurrently and awaits all of them. A throttle signal anywhere in
/// the batch discards that tick's count: the loop sleeps for the
/// largest `retry_after` reported and retries the same tick size.
/// Otherwise the budget advances by the batch size and the loop sleeps
/// out the remainder of the tick.
///
/// Transport errors on individual calls are logged and counted as
/// failed; they never stop the loop. Cancellation is observed at tick
/// boundaries only, so in-flight calls always resolve and get logged.
pub async fn run_paced<F, Fut>(
    config: &PacingConfig,
    token: &CancellationToken,
    call: F,
) -> Result<DispatchStats>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<CallOutcome>>,
{
    config.validate()?;

    let tick = config.tick();
    let mut stats = DispatchStats::default();
    // Attempt numbering keeps advancing across throttle retries.
    let mut next_index: u64 = 1;

    while stats.accepted < config.total_calls {
        if token.is_cancelled() {
            info!("Dispatch cancelled at tick boundary");
            break;
        }

        let tick_start = Instant::now();
        let size = (config.total_calls - stats.accepted).min(config.max_per_tick as u64);

        let batch: Vec<_> = (0..size).map(|k| call(next_index + k)).collect();
        next_index += size;
        let outcomes = join_all(batch).await;
        stats.ticks += 1;

        let mut ok: u64 = 0;
        let mut bad: u64 = 0;
        let mut pause: Option<Duration> = None;

        for (k, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(CallOutcome::Ack) => ok += 1,
                Ok(CallOutcome::Throttled { retry_after }) => {
                    debug!(
                        "Call #{} throttled, retry_after={:?}",
                        next_index - size + k as u64,
                        retry_after
                    );
                    pause = Some(match pause {
                        Some(p) => p.max(retry_after),
                        None => retry_after,
                    });
                }
                Err(e) => {
                    bad += 1;
                    warn!("Call #{} failed: {:#}", next_index - size + k as u64, e);
                }
            }
        }

        stats.succeeded += ok;
        stats.failed += bad;

        if let Some(wait) = pause {
            // Discard this tick's count and retry the same size after the
            // longest wait reported across the batch.
            stats.throttle_pauses += 1;
            info!(
                target: "dispatch_result",
                "Throttled: pausing {:.1}s, will retry a tick of {}",
                wait.as_secs_f64(),
                size
            );
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Dispatch cancelled during throttle pause");
                    break;
                }
                _ = sleep(wait) => {}
            }
            continue;
        }

        stats.accepted += size;
        info!(
            target: "dispatch_result",
            "Tick {}: dispatched {} ({} ok, {} failed) | progress {}/{}",
            stats.ticks,
            size,
            ok,
            bad,
            stats.accepted,
            config.total_calls
        );

        if stats.accepted >= config.total_calls {
            break;
        }

        let remainder = tick.saturating_sub(tick_start.elapsed());
        if !remainder.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Dispatch cancelled during tick sleep");
                    break;
                }
                _ = sleep(remainder) => {}
            }
        }
    }

    info!(
        target: "dispatch_result",
        "Dispatch finished: {}/{} accepted, {} ok, {} failed, {} throttle pauses, {} ticks",
        stats.accepted,
        config.total_calls,
        stats.succeeded,
        stats.failed,
        stats.throttle_pauses,
        stats.ticks
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_call() {
        let config = PacingConfig::new(0, 30);
        let token = CancellationToken::new();
        let result = run_paced(&config, &token, |_| async { Ok(CallOutcome::Ack) }).await;
        assert!(result.is_err());
    }
}
