use core_logic::{run_paced, CallOutcome, PacingConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

fn fast_config(total: u64, per_tick: u32) -> PacingConfig {
    PacingConfig::new(total, per_tick).with_tick(Duration::from_millis(40))
}

#[tokio::test]
async fn budget_below_ceiling_is_a_single_tick() {
    let calls = Arc::new(AtomicU64::new(0));
    let token = CancellationToken::new();
    let config = fast_config(7, 30);

    let stats = run_paced(&config, &token, |_| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallOutcome::Ack)
        }
    })
    .await
    .unwrap();

    assert_eq!(stats.ticks, 1);
    assert_eq!(stats.accepted, 7);
    assert_eq!(stats.succeeded, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn budget_splits_into_ceiling_sized_ticks() {
    // total=100, ceiling=30 -> ticks of 30,30,30,10
    let calls = Arc::new(AtomicU64::new(0));
    let token = CancellationToken::new();
    let config = fast_config(100, 30);

    let stats = run_paced(&config, &token, |_| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallOutcome::Ack)
        }
    })
    .await
    .unwrap();

    assert_eq!(stats.ticks, 4);
    assert_eq!(stats.accepted, 100);
    assert_eq!(stats.succeeded, 100);
    assert_eq!(stats.throttle_pauses, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 100);
}

#[tokio::test]
async fn throttle_sleeps_for_the_longest_wait_and_retries_the_tick() {
    // First tick reports two throttle signals (50ms and 80ms); the loop must
    // sleep at least 80ms, keep the sent-count unchanged and retry the tick.
    let calls = Arc::new(AtomicU64::new(0));
    let token = CancellationToken::new();
    let config = fast_config(10, 10);

    let start = tokio::time::Instant::now();
    let stats = run_paced(&config, &token, |index| {
        let calls = calls.clone();
        async move {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= 10 {
                // First batch: two distinct throttle waits among the acks.
                if index == 3 {
                    return Ok(CallOutcome::Throttled {
                        retry_after: Duration::from_millis(50),
                    });
                }
                if index == 7 {
                    return Ok(CallOutcome::Throttled {
                        retry_after: Duration::from_millis(80),
                    });
                }
            }
            Ok(CallOutcome::Ack)
        }
    })
    .await
    .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(80));
    assert_eq!(stats.throttle_pauses, 1);
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.accepted, 10);
    // Retried tick re-issues the full size.
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn transport_errors_do_not_stop_the_loop() {
    let calls = Arc::new(AtomicU64::new(0));
    let token = CancellationToken::new();
    let config = fast_config(20, 10);

    let stats = run_paced(&config, &token, |index| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            if index % 5 == 0 {
                anyhow::bail!("connection refused");
            }
            Ok(CallOutcome::Ack)
        }
    })
    .await
    .unwrap();

    assert_eq!(stats.accepted, 20);
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.succeeded, 16);
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn instant_ticks_still_pace_at_the_tick_length() {
    // Two ticks of instant calls must be separated by the tick interval.
    let token = CancellationToken::new();
    let config = PacingConfig::new(20, 10).with_tick(Duration::from_millis(80));

    let start = tokio::time::Instant::now();
    let stats = run_paced(&config, &token, |_| async { Ok(CallOutcome::Ack) })
        .await
        .unwrap();

    // One pacing sleep between the two ticks, none after the last.
    assert!(start.elapsed() >= Duration::from_millis(80));
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.accepted, 20);
}

#[tokio::test]
async fn cancellation_is_observed_at_tick_boundaries() {
    let calls = Arc::new(AtomicU64::new(0));
    let token = CancellationToken::new();
    let config = PacingConfig::new(1000, 5).with_tick(Duration::from_millis(50));

    let cancel = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(120)).await;
        cancel.cancel();
    });

    let stats = run_paced(&config, &token, |_| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallOutcome::Ack)
        }
    })
    .await
    .unwrap();

    // Stopped well short of the budget, but every issued call resolved.
    assert!(stats.accepted < 1000);
    assert_eq!(stats.accepted, calls.load(Ordering::SeqCst));
    assert_eq!(stats.succeeded, stats.accepted);
}
