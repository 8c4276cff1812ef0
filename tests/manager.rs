use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use queuevisor::{
    Completed, Event, EventKind, ManagerConfig, QueueHooks, QueueManager, QueueTaskFactory,
    QueueTaskFn, Restriction, Subscribe, TaskError,
};

#[derive(Clone, Debug, PartialEq)]
struct Job {
    id: u32,
    host: &'static str,
    limit: usize,
}

fn job(id: u32, host: &'static str) -> Job {
    Job { id, host, limit: 0 }
}

#[derive(Default)]
struct Hooks {
    removed: Mutex<Vec<(u32, bool)>>,
    completed: Mutex<Vec<(u32, Result<u32, TaskError>)>>,
}

impl Hooks {
    fn removed(&self) -> Vec<(u32, bool)> {
        self.removed.lock().unwrap().clone()
    }

    fn completed(&self) -> Vec<(u32, Result<u32, TaskError>)> {
        self.completed.lock().unwrap().clone()
    }
}

impl QueueHooks<Job, u32> for Hooks {
    fn restriction_for_task(&self, job: &Job) -> Restriction {
        if job.host == "boom" {
            panic!("no restriction for boom");
        }
        Restriction::new(job.host, job.limit)
    }

    fn removed_task_from_queue(&self, job: Job, execute_failure: bool) {
        self.removed.lock().unwrap().push((job.id, execute_failure));
    }

    fn completed_task(&self, done: Completed<Job, u32>) {
        let (job, outcome) = done.into_parts();
        self.completed.lock().unwrap().push((job.id, outcome));
    }
}

/// Jobs report when they start and then wait until the test opens their gate.
struct Gates {
    started: mpsc::UnboundedSender<u32>,
    open: Mutex<HashMap<u32, oneshot::Sender<()>>>,
}

struct Harness {
    mgr: Arc<QueueManager<Job, u32>>,
    hooks: Arc<Hooks>,
    gates: Arc<Gates>,
    started: mpsc::UnboundedReceiver<u32>,
}

impl Harness {
    fn new(cfg: ManagerConfig) -> Self {
        let (tx, started) = mpsc::unbounded_channel();
        let gates = Arc::new(Gates {
            started: tx,
            open: Mutex::new(HashMap::new()),
        });
        let g = Arc::clone(&gates);
        let factory = QueueTaskFn::arc(move |job: Job, _ctx: CancellationToken| {
            let g = Arc::clone(&g);
            async move {
                let (tx, rx) = oneshot::channel();
                g.open.lock().unwrap().insert(job.id, tx);
                let _ = g.started.send(job.id);
                let _ = rx.await;
                Ok::<u32, TaskError>(job.id * 10)
            }
        });
        let hooks = Arc::new(Hooks::default());
        let mgr = QueueManager::<Job, u32>::builder(cfg, factory, hooks.clone()).build();
        Self {
            mgr,
            hooks,
            gates,
            started,
        }
    }

    fn release(&self, id: u32) {
        let gate = self.gates.open.lock().unwrap().remove(&id);
        gate.expect("job has not started").send(()).expect("job is gone");
    }

    async fn next_started(&mut self) -> u32 {
        timeout(Duration::from_secs(5), self.started.recv())
            .await
            .expect("no job started in time")
            .expect("gates dropped")
    }

    async fn started_set(&mut self, n: usize) -> Vec<u32> {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            ids.push(self.next_started().await);
        }
        ids.sort_unstable();
        ids
    }

    async fn assert_quiet(&mut self) {
        let got = timeout(Duration::from_millis(150), self.started.recv()).await;
        assert!(got.is_err(), "unexpected start: {got:?}");
    }
}

fn limits(max: usize, per_host: usize) -> ManagerConfig {
    ManagerConfig {
        max_connection_count: max,
        max_connection_count_per_host: per_host,
        stop_grace: Duration::from_secs(5),
        ..ManagerConfig::default()
    }
}

async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

fn drain_kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
    }
    kinds
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_is_not_enqueued() {
    let mut h = Harness::new(limits(1, 1));

    assert!(h.mgr.add_task_to_queue(job(1, "a")));
    assert!(!h.mgr.add_task_to_queue(job(1, "a")));
    assert_eq!(h.mgr.queue_size(), 1);

    h.mgr.init();
    assert_eq!(h.next_started().await, 1);

    // executing counts as present too
    assert!(!h.mgr.add_task_to_queue(job(1, "a")));
    assert_eq!(h.mgr.queue_size(), 0);
    assert_eq!(h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a"), job(2, "a")]), 1);
    assert!(h.mgr.is_queued(&job(2, "a")));

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn global_ceiling_is_respected() {
    let mut h = Harness::new(limits(2, 10));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![
        job(1, "a"),
        job(2, "b"),
        job(3, "c"),
        job(4, "d"),
        job(5, "e"),
    ]);

    assert_eq!(h.started_set(2).await, vec![1, 2]);
    h.assert_quiet().await;
    assert_eq!(h.mgr.task_count(), 2);
    assert_eq!(h.mgr.queue_size(), 3);
    assert_eq!(h.mgr.open_slots(), 0);

    h.release(1);
    assert_eq!(h.next_started().await, 3);
    h.assert_quiet().await;
    assert_eq!(h.mgr.task_count(), 2);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn per_key_ceiling_is_respected() {
    let mut h = Harness::new(limits(4, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a"), job(3, "a")]);

    assert_eq!(h.next_started().await, 1);
    h.assert_quiet().await;
    assert_eq!(h.mgr.restriction_count("a"), 1);
    assert_eq!(h.mgr.queue_size(), 2);
    assert_eq!(h.mgr.open_slots(), 3);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn explicit_restriction_overrides_default() {
    let mut h = Harness::new(limits(4, 1));
    h.mgr.init();
    let wide = |id| Job {
        id,
        host: "mirror",
        limit: 2,
    };
    h.mgr.add_tasks_to_queue(vec![wide(1), wide(2), wide(3)]);

    assert_eq!(h.started_set(2).await, vec![1, 2]);
    h.assert_quiet().await;
    assert_eq!(h.mgr.restriction_count("mirror"), 2);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocked_key_is_overtaken() {
    let mut h = Harness::new(limits(2, 1));
    h.mgr.init();
    h.mgr.add_task_to_queue(job(1, "h1"));
    assert_eq!(h.next_started().await, 1);

    h.mgr.add_tasks_to_queue(vec![job(2, "h1"), job(3, "h2")]);
    assert_eq!(h.next_started().await, 3);
    h.assert_quiet().await;
    assert!(h.mgr.is_queued(&job(2, "h1")));
    assert_eq!(h.mgr.task_count(), 2);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completion_releases_counter_and_reports_once() {
    let mut h = Harness::new(limits(3, 1));
    h.mgr.init();
    h.mgr.add_task_to_queue(job(7, "a"));
    assert_eq!(h.next_started().await, 7);
    assert_eq!(h.mgr.restriction_count("a"), 1);
    assert_eq!(h.mgr.open_slots(), 2);

    h.release(7);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| !hooks.completed().is_empty()).await;

    assert_eq!(h.hooks.completed(), vec![(7, Ok(70))]);
    assert_eq!(h.mgr.restriction_count("a"), 0);
    assert_eq!(h.mgr.task_count(), 0);
    assert_eq!(h.mgr.open_slots(), 3);
    assert!(!h.mgr.is_executing_tasks());

    h.mgr.stop().await;
    assert_eq!(h.hooks.completed().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_queued_leaves_executing_alone() {
    let mut h = Harness::new(limits(1, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "b"), job(3, "c")]);
    assert_eq!(h.next_started().await, 1);

    h.mgr.cancel_tasks(false);
    assert_eq!(h.hooks.removed(), vec![(2, false), (3, false)]);
    assert_eq!(h.mgr.queue_size(), 0);
    assert_eq!(h.mgr.task_count(), 1);
    assert!(h.mgr.is_running());

    h.release(1);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| !hooks.completed().is_empty()).await;
    assert_eq!(h.hooks.completed(), vec![(1, Ok(10))]);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_executing_reports_canceled() {
    let mut h = Harness::new(limits(1, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "b")]);
    assert_eq!(h.next_started().await, 1);

    h.mgr.cancel_tasks(true);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| !hooks.completed().is_empty()).await;

    assert_eq!(h.hooks.removed(), vec![(2, false)]);
    assert_eq!(h.hooks.completed(), vec![(1, Err(TaskError::Canceled))]);
    assert_eq!(h.mgr.task_count(), 0);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn remove_single_task() {
    let h = Harness::new(limits(1, 1));
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a")]);

    assert!(h.mgr.remove_task_from_queue(&job(2, "a")));
    assert!(!h.mgr.remove_task_from_queue(&job(2, "a")));
    assert_eq!(h.hooks.removed(), vec![(2, false)]);
    assert_eq!(h.mgr.queue_size(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_drains_and_reinit_resumes_queue() {
    let mut h = Harness::new(limits(1, 1));
    let mut events = h.mgr.subscribe();

    h.mgr.stop().await;
    assert!(drain_kinds(&mut events).is_empty(), "stop before init is a no-op");

    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "b")]);
    assert_eq!(h.next_started().await, 1);

    h.mgr.stop().await;
    assert!(!h.mgr.is_running());
    assert_eq!(h.mgr.task_count(), 0);
    assert_eq!(h.mgr.restriction_count("a"), 0);
    assert_eq!(h.hooks.completed(), vec![(1, Err(TaskError::Canceled))]);
    assert_eq!(h.mgr.queue_size(), 1);

    let kinds = drain_kinds(&mut events);
    assert!(kinds.contains(&EventKind::StopRequested));
    assert!(kinds.contains(&EventKind::AllStoppedWithin));
    assert_eq!(kinds.last(), Some(&EventKind::ManagerStopped));

    h.mgr.init();
    assert!(h.mgr.is_running());
    assert_eq!(h.next_started().await, 2);
    h.release(2);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| hooks.completed().len() == 2).await;
    assert_eq!(h.hooks.completed()[1], (2, Ok(20)));

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn init_twice_is_a_noop() {
    let mut h = Harness::new(limits(1, 1));
    let mut events = h.mgr.subscribe();
    h.mgr.init();
    h.mgr.init();

    h.mgr.add_task_to_queue(job(1, "a"));
    assert_eq!(h.next_started().await, 1);
    let started = drain_kinds(&mut events)
        .into_iter()
        .filter(|k| *k == EventKind::ManagerStarted)
        .count();
    assert_eq!(started, 1);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resize_caps_promotions_without_killing_running() {
    let mut h = Harness::new(limits(2, 10));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "b"), job(3, "c"), job(4, "d")]);
    assert_eq!(h.started_set(2).await, vec![1, 2]);

    h.mgr.set_max_connection_count(1);
    assert_eq!(h.mgr.task_count(), 2);
    assert_eq!(h.mgr.open_slots(), 0);

    h.release(1);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| hooks.completed().len() == 1).await;
    h.assert_quiet().await;
    assert_eq!(h.mgr.task_count(), 1);

    h.release(2);
    assert_eq!(h.next_started().await, 3);
    h.assert_quiet().await;

    h.mgr.set_max_connection_count(3);
    assert_eq!(h.next_started().await, 4);
    assert_eq!(h.mgr.task_count(), 2);
    assert_eq!(h.mgr.open_slots(), 1);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unlimited_global_ceiling_is_accepted() {
    let mut h = Harness::new(limits(usize::MAX, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "b")]);
    assert_eq!(h.started_set(2).await, vec![1, 2]);

    h.mgr.set_max_connection_count(1);
    h.mgr.set_max_connection_count(usize::MAX);
    h.mgr.add_task_to_queue(job(3, "c"));
    assert_eq!(h.next_started().await, 3);
    assert_eq!(h.mgr.max_connection_count(), usize::MAX);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn raising_per_host_default_wakes_scheduler() {
    let mut h = Harness::new(limits(4, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a")]);
    assert_eq!(h.next_started().await, 1);
    h.assert_quiet().await;

    h.mgr.set_max_connection_count_per_host(2);
    assert_eq!(h.next_started().await, 2);
    assert_eq!(h.mgr.max_connection_count_per_host(), 2);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_host_waits_for_completion() {
    let mut h = Harness::new(limits(2, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a"), job(3, "b")]);

    assert_eq!(h.started_set(2).await, vec![1, 3]);
    assert!(h.mgr.is_queued(&job(2, "a")));

    h.release(1);
    assert_eq!(h.next_started().await, 2);
    assert_eq!(h.mgr.queue_size(), 0);

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn long_blocked_queue_reports_blocking_once() {
    let mut h = Harness::new(limits(2, 1));
    let mut events = h.mgr.subscribe();
    h.mgr.init();
    h.mgr.add_tasks_to_queue((1..=200).map(|id| job(id, "a")));

    for id in 1..=3 {
        assert_eq!(h.next_started().await, id);
        h.release(id);
    }
    assert_eq!(h.next_started().await, 4);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| hooks.completed().len() == 3).await;

    let kinds = drain_kinds(&mut events);
    let blocked = kinds.iter().filter(|k| **k == EventKind::TaskBlocked).count();
    assert_eq!(blocked, 1);
    assert_eq!(
        kinds.iter().filter(|k| **k == EventKind::TaskCompleted).count(),
        3
    );

    h.mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_lookup_rejects_task() {
    let mut h = Harness::new(limits(2, 1));
    let mut events = h.mgr.subscribe();
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "boom"), job(2, "a")]);

    assert_eq!(h.next_started().await, 2);
    let hooks = Arc::clone(&h.hooks);
    eventually(|| !hooks.removed().is_empty()).await;
    assert_eq!(h.hooks.removed(), vec![(1, true)]);
    assert_eq!(h.mgr.queue_size(), 0);

    h.mgr.stop().await;
    let kinds = drain_kinds(&mut events);
    assert!(kinds.contains(&EventKind::HookPanicked));
    assert!(kinds.contains(&EventKind::TaskRejected));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stats_and_session_counters() {
    let mut h = Harness::new(limits(3, 1));
    h.mgr.init();
    h.mgr.add_tasks_to_queue(vec![job(1, "a"), job(2, "a")]);
    assert_eq!(h.next_started().await, 1);

    h.mgr.increase_session_files();
    h.mgr.increase_session_files();
    h.mgr.increase_session_bytes(1024);

    let stats = h.mgr.stats();
    assert_eq!(stats.queued, 1);
    assert_eq!(stats.executing, 1);
    assert_eq!(stats.open_slots, 2);
    assert_eq!(stats.max_connection_count, 3);
    assert_eq!(stats.per_key, vec![("a".to_string(), 1)]);
    assert_eq!(stats.session_files, 2);
    assert_eq!(stats.session_bytes, 1024);

    h.mgr.reset_session();
    assert_eq!(h.mgr.session_files(), 0);
    assert_eq!(h.mgr.session_bytes(), 0);

    h.mgr.stop().await;
}

fn build_with(
    cfg: ManagerConfig,
    factory: Arc<dyn QueueTaskFactory<Job, u32>>,
) -> (Arc<QueueManager<Job, u32>>, Arc<Hooks>) {
    let hooks = Arc::new(Hooks::default());
    let mgr = QueueManager::<Job, u32>::builder(cfg, factory, hooks.clone()).build();
    (mgr, hooks)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn task_panic_is_reported_as_fatal() {
    let factory = QueueTaskFn::arc(|job: Job, _ctx: CancellationToken| async move {
        if job.id > 0 {
            panic!("parser exploded");
        }
        Ok::<u32, TaskError>(0)
    });
    let (mgr, hooks) = build_with(limits(1, 1), factory);
    mgr.init();
    mgr.add_task_to_queue(job(1, "a"));

    let seen = Arc::clone(&hooks);
    eventually(|| !seen.completed().is_empty()).await;
    let (id, outcome) = hooks.completed().remove(0);
    assert_eq!(id, 1);
    let Err(TaskError::Fatal { error }) = outcome else {
        panic!("expected a fatal outcome, got {outcome:?}");
    };
    assert!(error.contains("parser exploded"));
    assert_eq!(mgr.task_count(), 0);

    mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn task_timeout_is_enforced() {
    let factory = QueueTaskFn::arc(|_job: Job, _ctx: CancellationToken| async move {
        sleep(Duration::from_secs(3600)).await;
        Ok::<u32, TaskError>(0)
    });
    let mut cfg = limits(1, 1);
    cfg.task_timeout = Duration::from_millis(50);
    let (mgr, hooks) = build_with(cfg, factory);
    mgr.init();
    mgr.add_task_to_queue(job(1, "a"));

    let seen = Arc::clone(&hooks);
    eventually(|| !seen.completed().is_empty()).await;
    assert_eq!(
        hooks.completed(),
        vec![(
            1,
            Err(TaskError::Timeout {
                timeout: Duration::from_millis(50)
            })
        )]
    );

    mgr.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stuck_task_is_abandoned_after_grace() {
    let (tx, mut started) = mpsc::unbounded_channel();
    let factory = QueueTaskFn::arc(move |job: Job, _ctx: CancellationToken| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(job.id);
            // never yields, so cancellation cannot reach it
            std::thread::sleep(Duration::from_millis(800));
            Ok::<u32, TaskError>(0)
        }
    });
    let mut cfg = limits(1, 1);
    cfg.stop_grace = Duration::from_millis(50);
    let (mgr, hooks) = build_with(cfg, factory);
    let mut events = mgr.subscribe();

    mgr.init();
    mgr.add_task_to_queue(job(1, "a"));
    let first = timeout(Duration::from_secs(5), started.recv()).await;
    assert_eq!(first.ok().flatten(), Some(1));

    mgr.stop().await;
    assert_eq!(mgr.task_count(), 0);
    assert_eq!(hooks.completed(), vec![(1, Err(TaskError::Canceled))]);
    assert!(drain_kinds(&mut events).contains(&EventKind::GraceExceeded));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dropped_stop_still_finishes_teardown() {
    let (tx, mut started) = mpsc::unbounded_channel();
    let factory = QueueTaskFn::arc(move |job: Job, _ctx: CancellationToken| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(job.id);
            std::thread::sleep(Duration::from_millis(300));
            Ok::<u32, TaskError>(job.id)
        }
    });
    let (mgr, hooks) = build_with(limits(1, 1), factory);

    mgr.init();
    mgr.add_task_to_queue(job(1, "a"));
    let first = timeout(Duration::from_secs(5), started.recv()).await;
    assert_eq!(first.ok().flatten(), Some(1));

    let cut_short = timeout(Duration::from_millis(10), mgr.stop()).await;
    assert!(cut_short.is_err());

    let seen = Arc::clone(&hooks);
    eventually(|| seen.completed().len() == 1).await;
    let m = Arc::clone(&mgr);
    eventually(|| {
        m.init();
        m.is_running()
    })
    .await;
    assert_eq!(mgr.task_count(), 0);
    assert_eq!(mgr.restriction_count("a"), 0);

    mgr.stop().await;
}

struct Collect(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Collect {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribers_receive_lifecycle_events() {
    let factory = QueueTaskFn::arc(|job: Job, _ctx: CancellationToken| async move {
        Ok::<u32, TaskError>(job.id)
    });
    let collect = Arc::new(Collect(Mutex::new(Vec::new())));
    let hooks = Arc::new(Hooks::default());
    let mgr = QueueManager::<Job, u32>::builder(limits(2, 1), factory, hooks.clone())
        .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
        .build();

    mgr.init();
    mgr.add_task_to_queue(job(1, "a"));
    let seen = Arc::clone(&hooks);
    eventually(|| !seen.completed().is_empty()).await;
    mgr.stop().await;

    let c = Arc::clone(&collect);
    eventually(|| c.0.lock().unwrap().contains(&EventKind::ManagerStopped)).await;
    let kinds = collect.0.lock().unwrap().clone();
    for kind in [
        EventKind::ManagerStarted,
        EventKind::TaskQueued,
        EventKind::TaskScheduled,
        EventKind::TaskCompleted,
        EventKind::StopRequested,
    ] {
        assert!(kinds.contains(&kind), "missing {kind:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dropping_manager_flushes_subscribers() {
    let factory = QueueTaskFn::arc(|job: Job, _ctx: CancellationToken| async move {
        Ok::<u32, TaskError>(job.id)
    });
    let collect = Arc::new(Collect(Mutex::new(Vec::new())));
    let mgr = QueueManager::<Job, u32>::builder(limits(1, 1), factory, Arc::new(Hooks::default()))
        .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
        .build();

    mgr.init();
    mgr.stop().await;
    drop(mgr);

    let c = Arc::clone(&collect);
    eventually(|| c.0.lock().unwrap().contains(&EventKind::ManagerStopped)).await;
}
