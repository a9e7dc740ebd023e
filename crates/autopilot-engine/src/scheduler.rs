//! Background polling scheduler.
//!
//! A single tokio task wakes every [`POLL_INTERVAL`], evaluates every
//! enabled workflow's trigger against the current local time, and runs the
//! due ones sequentially through the shared [`Runner`].  A failing tick is
//! logged and backs the loop off for [`ERROR_BACKOFF`] to avoid tight
//! error loops.  Voice and manual workflows are never fired here.
//!
//! Shutdown is cooperative: [`Scheduler::stop`] clears the running flag,
//! wakes the loop, and waits a bounded grace period.  There is no
//! preemptive cancellation — a run in progress finishes first and the loop
//! exits at its next flag check, even if `stop` has already returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::Runner;
use crate::error::Result;

/// How often the loop evaluates triggers.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Sleep applied after a failing tick.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// How long `stop` waits for the loop before detaching from it.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Background scheduler driving trigger evaluation.
pub struct Scheduler {
    runner: Runner,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub(crate) fn new(runner: Runner) -> Self {
        Self {
            runner,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Start the polling loop; a no-op when already running.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler already running");
            return;
        }

        let runner = self.runner.clone();
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = tokio::spawn(async move {
            info!("scheduler started");
            poll_loop(runner, running, shutdown).await;
            info!("scheduler stopped");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Stop the polling loop, waiting up to the grace period for it to
    /// finish.  A loop still mid-run is left to wind down on its own; it
    /// observes the cleared flag after the current workflow completes.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("stop called but scheduler is not running");
            return;
        }

        self.shutdown.notify_waiters();

        if let Some(mut handle) = self.handle.lock().await.take() {
            match tokio::time::timeout(STOP_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "scheduler task panicked during shutdown"),
                Err(_) => {
                    warn!("scheduler still finishing its current run; detaching");
                }
            }
        }
    }

    /// Whether the polling loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The polling loop body.  Runs until the flag clears or the shutdown
/// notification fires.
async fn poll_loop(runner: Runner, running: Arc<AtomicBool>, shutdown: Arc<Notify>) {
    while running.load(Ordering::SeqCst) {
        let sleep_for = match tick(&runner).await {
            Ok(fired) => {
                if fired > 0 {
                    debug!(fired, "poll tick complete");
                }
                POLL_INTERVAL
            }
            Err(e) => {
                error!(error = %e, "automation loop error; backing off");
                ERROR_BACKOFF
            }
        };

        // A stop issued mid-tick consumes no notification; re-check the flag
        // before sleeping so shutdown is not delayed a full interval.
        if !running.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(sleep_for) => {}
        }
    }
}

/// One poll pass: evaluate every enabled workflow and run the due ones
/// sequentially.  An infrastructure error aborts the remaining due
/// workflows for this tick and triggers the backoff; action-level failures
/// are already absorbed by the executor.
async fn tick(runner: &Runner) -> Result<usize> {
    let now = Local::now();

    let due: Vec<Uuid> = {
        let list = runner.workflows.read().await;
        list.iter()
            .filter(|w| w.enabled && w.trigger.should_fire(now))
            .map(|w| w.id)
            .collect()
    };

    let mut fired = 0;
    for id in due {
        let outcome = runner.run(id).await?;
        fired += 1;
        debug!(
            workflow_id = %id,
            succeeded = outcome.success_count,
            total = outcome.total_actions,
            "workflow fired"
        );
    }

    Ok(fired)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
