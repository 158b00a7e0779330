//! Periodic refresh loop with retry-on-failure.
//!
//! A [`RefreshTask`] runs its unit of work immediately, then once per fixed
//! interval until cancelled. A failed cycle is logged and the next one is
//! scheduled as usual; the loop only ends through cancellation.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Lifecycle of a refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Executing,
    Waiting,
    Cancelling,
    Terminated,
}

pub struct RefreshTask {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
    state: Arc<watch::Sender<RefreshState>>,
    attempts: Arc<AtomicU64>,
    _guard: DropGuard,
}

impl RefreshTask {
    /// Spawn a loop under `parent`; cancelling the parent stops it too.
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        interval: Duration,
        parent: &CancellationToken,
        work: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let token = parent.child_token();
        let (state_tx, _state_rx) = watch::channel(RefreshState::Idle);
        let state = Arc::new(state_tx);
        let attempts = Arc::new(AtomicU64::new(0));

        info!(
            event = "refresh.started",
            task = %name,
            interval_ms = interval.as_millis() as u64
        );

        let handle = tokio::spawn(run_loop(
            name.clone(),
            interval,
            token.clone(),
            state.clone(),
            attempts.clone(),
            work,
        ));

        Self {
            name,
            _guard: token.clone().drop_guard(),
            token,
            handle,
            state,
            attempts,
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<RefreshState> {
        self.state.subscribe()
    }

    /// Number of executions started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request cancellation without waiting for the loop to exit.
    ///
    /// The state reads `Cancelling` until an in-flight cycle has finished.
    pub fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if *state == RefreshState::Terminated {
                false
            } else {
                *state = RefreshState::Cancelling;
                true
            }
        });
        self.token.cancel();
    }

    /// Cancel and wait until the current cycle (if any) has completed and
    /// the loop has exited. After this returns the task writes nothing more.
    pub async fn cancel_and_join(self) {
        self.cancel();
        let RefreshTask { name, handle, .. } = self;
        if let Err(e) = handle.await {
            warn!(event = "refresh.join_failed", task = %name, error = %e);
        }
    }
}

/// Move to `next` unless a cancellation has already been published.
fn advance(state: &watch::Sender<RefreshState>, next: RefreshState) {
    state.send_if_modified(|current| {
        if *current == RefreshState::Cancelling {
            false
        } else {
            *current = next;
            true
        }
    });
}

async fn run_loop<F, Fut>(
    name: String,
    interval: Duration,
    token: CancellationToken,
    state: Arc<watch::Sender<RefreshState>>,
    attempts: Arc<AtomicU64>,
    mut work: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    loop {
        if token.is_cancelled() {
            break;
        }

        advance(&state, RefreshState::Executing);
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match work().await {
            Ok(()) => {
                debug!(event = "refresh.cycle_completed", task = %name, attempt = attempt);
            }
            Err(e) => {
                warn!(
                    event = "refresh.cycle_failed",
                    task = %name,
                    attempt = attempt,
                    error = %format!("{:#}", e)
                );
            }
        }

        advance(&state, RefreshState::Waiting);
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(event = "refresh.cancelled", task = %name);
    state.send_replace(RefreshState::Terminated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn counting_task(
        parent: &CancellationToken,
        fail: bool,
    ) -> (RefreshTask, Arc<AtomicU64>) {
        let runs = Arc::new(AtomicU64::new(0));
        let counter = runs.clone();
        let task = RefreshTask::spawn("test", INTERVAL, parent, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if fail {
                    anyhow::bail!("upstream unavailable");
                }
                Ok(())
            }
        });
        (task, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_on_interval() {
        let root = CancellationToken::new();
        let (task, runs) = counting_task(&root, false);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);

        task.cancel_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_loop() {
        let root = CancellationToken::new();
        let (task, runs) = counting_task(&root, true);

        // Five failing cycles, then still scheduled for a sixth.
        tokio::time::sleep(INTERVAL * 4 + Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 5);
        assert_eq!(task.attempts(), 5);
        assert!(!task.is_finished());
        assert_eq!(task.state(), RefreshState::Waiting);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(runs.load(Ordering::SeqCst), 6);

        task.cancel_and_join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_stops_executions() {
        let root = CancellationToken::new();
        let (task, runs) = counting_task(&root, false);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(task.state(), RefreshState::Waiting);

        let state = task.state_watch();
        task.cancel_and_join().await;
        assert_eq!(*state.borrow(), RefreshState::Terminated);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_child() {
        let root = CancellationToken::new();
        let (task, runs) = counting_task(&root, false);

        tokio::time::sleep(Duration::from_millis(1)).await;
        root.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(task.is_finished());
        assert_eq!(task.state(), RefreshState::Terminated);
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_waits_for_in_flight_cycle() {
        let root = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let task = RefreshTask::spawn("slow", INTERVAL, &root, move || {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(task.state(), RefreshState::Executing);

        task.cancel_and_join().await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_cycle_reports_cancelling() {
        let root = CancellationToken::new();
        let task = RefreshTask::spawn("slow", INTERVAL, &root, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(task.state(), RefreshState::Executing);

        task.cancel();
        assert_eq!(task.state(), RefreshState::Cancelling);

        // The in-flight cycle must not flip the state back to Waiting.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(task.state(), RefreshState::Cancelling);

        let state = task.state_watch();
        task.cancel_and_join().await;
        assert_eq!(*state.borrow(), RefreshState::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let root = CancellationToken::new();
        let (task, runs) = counting_task(&root, false);
        tokio::time::sleep(Duration::from_millis(1)).await;

        drop(task);
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!root.is_cancelled());
    }
}
