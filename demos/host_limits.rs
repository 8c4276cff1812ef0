//! # Example: Per-host download limits
//!
//! Eight fake downloads across three hosts with `max_connection_count = 3` and one
//! connection per host by default. `slow.example` declares its own ceiling of 2.
//! Events go through the built-in `LogWriter` into `tracing`.
//!
//! Run with:
//! ```text
//! RUST_LOG=queuevisor=debug cargo run --example host_limits --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use queuevisor::{
    Completed, LogWriter, ManagerConfig, QueueHooks, QueueManager, QueueTaskFn, Restriction,
    Subscribe, TaskError,
};

#[derive(Clone, Debug, PartialEq)]
struct Download {
    host: &'static str,
    path: &'static str,
}

struct Hosts;

impl QueueHooks<Download, u64> for Hosts {
    fn restriction_for_task(&self, d: &Download) -> Restriction {
        match d.host {
            "slow.example" => Restriction::new(d.host, 2),
            host => Restriction::unrestricted(host),
        }
    }

    fn removed_task_from_queue(&self, d: Download, execute_failure: bool) {
        println!("[removed] {}{} (execute_failure={execute_failure})", d.host, d.path);
    }

    fn completed_task(&self, done: Completed<Download, u64>) {
        let d = done.task();
        match done.outcome() {
            Ok(bytes) => println!("[done] {}{} {bytes}B in {:?}", d.host, d.path, done.elapsed()),
            Err(err) => println!("[fail] {}{}: {err}", d.host, d.path),
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = ManagerConfig {
        max_connection_count: 3,
        max_connection_count_per_host: 1,
        stop_grace: Duration::from_secs(2),
        ..ManagerConfig::default()
    };

    let fetch = QueueTaskFn::arc(|d: Download, _ctx: CancellationToken| async move {
        let ms = if d.host == "slow.example" { 300 } else { 100 };
        tokio::time::sleep(Duration::from_millis(ms)).await;
        if d.path.ends_with(".missing") {
            return Err(TaskError::fail("404 not found"));
        }
        Ok::<u64, TaskError>(ms * 1024)
    });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mgr = QueueManager::<Download, u64>::builder(cfg, fetch, Arc::new(Hosts))
        .with_subscribers(subs)
        .build();
    mgr.init();

    let jobs = [
        ("a.example", "/1"),
        ("a.example", "/2"),
        ("a.example", "/3.missing"),
        ("b.example", "/1"),
        ("b.example", "/2"),
        ("slow.example", "/1"),
        ("slow.example", "/2"),
        ("slow.example", "/3"),
    ];
    let added = mgr.add_tasks_to_queue(jobs.iter().map(|&(host, path)| Download { host, path }));
    println!("[queued] {added}");

    while mgr.queue_size() > 0 || mgr.is_executing_tasks() {
        let s = mgr.stats();
        println!(
            "[stats] queued={} executing={} open={} per_key={:?}",
            s.queued, s.executing, s.open_slots, s.per_key
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    mgr.stop().await;
    Ok(())
}
