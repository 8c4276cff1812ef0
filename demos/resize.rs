//! # Example: Resizing the pool at runtime
//!
//! Starts with two connections, grows to six while work is queued, then shrinks
//! back to one. Running tasks are never interrupted; only promotions change.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use queuevisor::{
    Completed, ManagerConfig, QueueHooks, QueueManager, QueueTaskFn, Restriction, TaskError,
};

struct Flat;

impl QueueHooks<u32, u32> for Flat {
    fn restriction_for_task(&self, n: &u32) -> Restriction {
        Restriction::unrestricted(format!("shard-{}", n % 4))
    }

    fn removed_task_from_queue(&self, _n: u32, _execute_failure: bool) {}

    fn completed_task(&self, done: Completed<u32, u32>) {
        println!("[done] #{} -> {:?}", done.task(), done.outcome());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = ManagerConfig {
        max_connection_count: 2,
        max_connection_count_per_host: 2,
        ..ManagerConfig::default()
    };

    let work = QueueTaskFn::arc(|n: u32, _ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok::<u32, TaskError>(n * n)
    });

    let mgr = QueueManager::<u32, u32>::builder(cfg, work, Arc::new(Flat)).build();
    mgr.init();
    mgr.add_tasks_to_queue(0..24);

    for (at, limit) in [(300, 6), (900, 1)] {
        tokio::time::sleep(Duration::from_millis(at)).await;
        println!("[resize] max_connection_count={limit} (executing {})", mgr.task_count());
        mgr.set_max_connection_count(limit);
    }

    while mgr.queue_size() > 0 || mgr.is_executing_tasks() {
        println!("[tick] queued={} executing={}", mgr.queue_size(), mgr.task_count());
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    mgr.stop().await;
    println!("[stopped] running={}", mgr.is_running());
    Ok(())
}
