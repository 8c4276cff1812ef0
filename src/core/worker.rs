//! # Run a single admitted task inside the executor pool.
//!
//! ```text
//! execute()
//!   ├─► wait for a worker permit (cancellable)   ── cancelled ─► Err(Canceled), elapsed 0
//!   ├─► run_once()
//!   │     ├─ unit.call(token)          ── Ok / Err(..)
//!   │     ├─ panic caught              ── Err(Fatal("task panicked: .."))
//!   │     ├─ timeout elapsed           ── Err(Timeout)
//!   │     └─ token cancelled           ── Err(Canceled), future dropped
//!   └─► release permit (or forget it to pay down a shrink)
//! ```
//!
//! ## Rules
//! - Exactly one outcome per job; the pool turns it into one `Completion`.
//! - Cancellation wins over a result that becomes ready in the same poll.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::pool::ExecutorPool;
use crate::error::TaskError;
use crate::subscribers::panic_message;
use crate::tasks::{QueueTask, QueueTaskRef};

/// Waits for a worker slot, runs `unit` once and returns its outcome with the run time.
pub(super) async fn execute<T, R>(
    pool: &Arc<ExecutorPool<R>>,
    unit: QueueTaskRef<T, R>,
    token: CancellationToken,
) -> (Result<R, TaskError>, Duration)
where
    T: 'static,
    R: Send + 'static,
{
    let permit = tokio::select! {
        biased;
        _ = token.cancelled() => return (Err(TaskError::Canceled), Duration::ZERO),
        res = Arc::clone(&pool.permits).acquire_owned() => match res {
            Ok(permit) => permit,
            Err(_closed) => return (Err(TaskError::Canceled), Duration::ZERO),
        },
    };

    let started = Instant::now();
    let outcome = run_once(unit.as_ref(), &token, pool.task_timeout).await;
    pool.release(permit);
    (outcome, started.elapsed())
}

/// Executes one call of `unit` with panic isolation, optional timeout and cancellation.
async fn run_once<T, R>(
    unit: &dyn QueueTask<T, R>,
    token: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<R, TaskError>
where
    T: 'static,
    R: Send + 'static,
{
    let guarded = async {
        match AssertUnwindSafe(unit.call(token.clone())).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => Err(TaskError::Fatal {
                error: format!("task panicked: {}", panic_message(&*payload)),
            }),
        }
    };

    let bounded = async {
        match timeout {
            Some(dur) => match time::timeout(dur, guarded).await {
                Ok(res) => res,
                Err(_elapsed) => Err(TaskError::Timeout { timeout: dur }),
            },
            None => guarded.await,
        }
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TaskError::Canceled),
        res = bounded => res,
    }
}
