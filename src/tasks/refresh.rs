//! Refresh Task
//!
//! Background task that periodically reloads resident entries from the
//! backing store.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument, Span};

use crate::cache::{CacheCore, CacheKey, CacheValue};

/// Handle to a running refresh task.
///
/// Shutdown is cooperative: cancelling prevents further cycles but never
/// interrupts one already in progress.
#[derive(Debug)]
pub struct RefreshHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stops scheduling future refresh cycles.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the task has exited its loop.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns the refresh loop for `core` on `runtime`.
///
/// The first cycle runs one full `period` after spawning. Cycles execute on the
/// blocking pool since backing store calls are synchronous; a panicking cycle
/// is logged and the schedule carries on.
pub(crate) fn spawn_refresh_task<K: CacheKey, V: CacheValue>(
    runtime: &Handle,
    core: Arc<CacheCore<K, V>>,
    period: Duration,
) -> RefreshHandle {
    let token = CancellationToken::new();
    let cancelled = token.clone();
    let span = core.span().clone();

    let handle = runtime.spawn(
        async move {
            info!(
                "Starting refresh task with interval of {} seconds",
                period.as_secs()
            );

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let cycle_core = core.clone();
                let cycle_span = Span::current();
                let cycle = tokio::task::spawn_blocking(move || {
                    let _enter = cycle_span.enter();
                    cycle_core.refresh_cycle()
                });
                match cycle.await {
                    Ok(report) if report.failed > 0 => info!(
                        refreshed = report.refreshed,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Refresh cycle finished with failures"
                    ),
                    Ok(report) => debug!(
                        refreshed = report.refreshed,
                        skipped = report.skipped,
                        "Refresh cycle finished"
                    ),
                    Err(e) => error!(error = %e, "Refresh cycle aborted"),
                }
            }

            info!("Refresh task stopped");
        }
        .instrument(span),
    );

    RefreshHandle { token, handle }
}
