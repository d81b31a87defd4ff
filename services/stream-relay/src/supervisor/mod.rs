//! "Never give up" supervisor for the restream process: launch, wait
//! for any exit, cool down, relaunch. No backoff growth and no retry
//! ceiling; the cooldown is the only damper.

use anyhow::Result;
use async_trait::async_trait;
use core_logic::{ProcessError, Worker, WorkerStats};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Immutable launch template, built once from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Mutable side of the supervision loop.
#[derive(Debug, Default)]
struct SupervisionState {
    completed_runs: u64,
    spawn_failures: u64,
    last_exit: Option<Instant>,
}

pub struct StreamSupervisor {
    command: CommandSpec,
    cooldown: Duration,
}

impl StreamSupervisor {
    pub fn new(command: CommandSpec, cooldown: Duration) -> Self {
        Self { command, cooldown }
    }
}

#[async_trait]
impl Worker for StreamSupervisor {
    fn name(&self) -> &str {
        "stream-relay"
    }

    async fn start(&self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let mut state = SupervisionState::default();

        loop {
            if cancellation_token.is_cancelled() {
                break;
            }

            if let Some(previous_exit) = state.last_exit {
                debug!(
                    "Previous run ended {:.1}s ago",
                    previous_exit.elapsed().as_secs_f64()
                );
            }

            info!(
                target: "dispatch_result",
                "Starting stream process: {} {}",
                self.command.program,
                self.command.args.join(" ")
            );

            match Command::new(&self.command.program)
                .args(&self.command.args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(mut child) => {
                    tokio::select! {
                        status = child.wait() => {
                            // Any exit looks the same to us: crash, network
                            // drop or clean stop all trigger a relaunch.
                            match status {
                                Ok(s) => info!(
                                    target: "dispatch_result",
                                    "Stream process exited ({})", s
                                ),
                                Err(e) => warn!("Failed to wait on stream process: {}", e),
                            }
                            state.completed_runs += 1;
                            state.last_exit = Some(Instant::now());
                        }
                        _ = cancellation_token.cancelled() => {
                            info!("Stopping stream process...");
                            if let Err(e) = child.kill().await {
                                warn!(
                                    "{}",
                                    ProcessError::KillFailed {
                                        program: self.command.program.clone(),
                                        msg: e.to_string(),
                                    }
                                );
                            }
                            break;
                        }
                    }
                }
                Err(e) => {
                    // Missing binary or exec failure: same treatment as an
                    // exit, so a transient PATH problem self-heals.
                    warn!(
                        "{}",
                        ProcessError::SpawnFailed {
                            program: self.command.program.clone(),
                            msg: e.to_string(),
                        }
                    );
                    state.spawn_failures += 1;
                    state.last_exit = Some(Instant::now());
                }
            }

            info!(
                "Reconnecting in {}s (run #{})",
                self.cooldown.as_secs(),
                state.completed_runs + state.spawn_failures + 1
            );
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = sleep(self.cooldown) => {}
            }
        }

        info!(
            target: "dispatch_result",
            "Supervisor stopped after {} run(s), {} spawn failure(s)",
            state.completed_runs,
            state.spawn_failures
        );

        Ok(WorkerStats {
            succeeded: state.completed_runs,
            failed: state.spawn_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relaunches_an_immediately_exiting_command() {
        let supervisor = StreamSupervisor::new(
            CommandSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "exit 0".to_string()],
            },
            Duration::from_millis(10),
        );

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        });

        let stats = supervisor.start(token).await.unwrap();
        // Plenty of time for several cooldown cycles.
        assert!(stats.succeeded >= 2, "expected >= 2 runs, got {}", stats.succeeded);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn nonzero_exits_are_relaunched_too() {
        let supervisor = StreamSupervisor::new(
            CommandSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "exit 7".to_string()],
            },
            Duration::from_millis(10),
        );

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let stats = supervisor.start(token).await.unwrap();
        assert!(stats.succeeded >= 2);
    }

    #[tokio::test]
    async fn spawn_failure_is_treated_like_an_exit() {
        let supervisor = StreamSupervisor::new(
            CommandSpec {
                program: "definitely-not-a-real-binary-7f3a".to_string(),
                args: vec![],
            },
            Duration::from_millis(10),
        );

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(80)).await;
            cancel.cancel();
        });

        let stats = supervisor.start(token).await.unwrap();
        assert!(stats.failed >= 2, "expected repeated spawn retries");
    }

    #[tokio::test]
    async fn long_running_child_is_killed_on_cancel() {
        let supervisor = StreamSupervisor::new(
            CommandSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "sleep 30".to_string()],
            },
            Duration::from_millis(10),
        );

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let start = Instant::now();
        let stats = supervisor.start(token).await.unwrap();
        // The 30s sleep must not hold up shutdown.
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(stats.succeeded, 0);
    }
}
