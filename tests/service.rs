use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use groupvisor::{
    BoxError, Config, Event, EventKind, Service, ServiceError, Signal, SignalSource, Subscribe,
    TaskFn,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

fn append(log: &Log, entry: &str) {
    log.lock().unwrap().push(entry.to_string());
}

async fn wait_bounded(svc: &Service) -> Result<(), ServiceError> {
    tokio::time::timeout(Duration::from_secs(5), svc.wait())
        .await
        .expect("service did not stop")
}

#[tokio::test]
async fn hooks_run_newest_first_and_late_hooks_run_inline() {
    let (_token, svc) = Service::new(&CancellationToken::new(), &[Signal::User2]).unwrap();
    let log: Log = Arc::default();

    for entry in ["shutdown-1", "shutdown-2"] {
        let log = log.clone();
        svc.register_shutdown_hook(move || async move { append(&log, entry) })
            .await;
    }

    {
        let log = log.clone();
        svc.spawn(async move {
            append(&log, "go-1");
            Err::<(), BoxError>("test error".into())
        });
    }

    let err = wait_bounded(&svc).await.unwrap_err();
    assert_eq!(err.to_string(), "test error");

    {
        let log = log.clone();
        svc.register_shutdown_hook(move || async move { append(&log, "shutdown-3") })
            .await;
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec!["go-1", "shutdown-2", "shutdown-1", "shutdown-3"]
    );
}

#[tokio::test]
async fn first_failure_cancels_every_sibling() {
    let (token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    let observed = Arc::new(AtomicUsize::new(0));

    for _ in 0..8 {
        let ctx = token.clone();
        let observed = observed.clone();
        svc.spawn(async move {
            ctx.cancelled().await;
            observed.fetch_add(1, Ordering::SeqCst);
            Err::<(), BoxError>("sibling exited late".into())
        });
    }
    svc.spawn(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err::<(), BoxError>("first".into())
    });

    let err = wait_bounded(&svc).await.unwrap_err();
    assert_eq!(err.to_string(), "first");
    assert_eq!(observed.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn wait_does_not_return_before_slow_tasks_finish() {
    let (token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    {
        let ctx = token.clone();
        let finished = finished.clone();
        svc.spawn(async move {
            ctx.cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            finished.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });
    }
    svc.spawn(async { Err::<(), BoxError>("stop".into()) });

    wait_bounded(&svc).await.unwrap_err();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hooks_run_while_tasks_are_still_stopping() {
    let (token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    let log: Log = Arc::default();

    {
        let log = log.clone();
        svc.register_shutdown_hook(move || async move { append(&log, "hook") })
            .await;
    }
    {
        let ctx = token.clone();
        let log = log.clone();
        svc.spawn(async move {
            ctx.cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            append(&log, "slow-task");
            Ok::<_, BoxError>(())
        });
    }
    svc.spawn(async { Err::<(), BoxError>("stop".into()) });

    wait_bounded(&svc).await.unwrap_err();
    assert_eq!(*log.lock().unwrap(), vec!["hook", "slow-task"]);
}

#[tokio::test]
async fn wait_returns_after_slow_hooks_complete() {
    let (_token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    let log: Log = Arc::default();

    {
        let log = log.clone();
        svc.register_shutdown_hook(move || async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            append(&log, "flushed");
        })
        .await;
    }
    svc.spawn(async { Err::<(), BoxError>("stop".into()) });

    wait_bounded(&svc).await.unwrap_err();
    assert_eq!(*log.lock().unwrap(), vec!["flushed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hooks_racing_shutdown_run_exactly_once() {
    const ROUNDS: usize = 200;
    const HOOKS: usize = 16;

    for round in 0..ROUNDS {
        let (_token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
        let runs: Arc<Vec<AtomicUsize>> =
            Arc::new((0..HOOKS).map(|_| AtomicUsize::new(0)).collect());

        let mut registrations = Vec::with_capacity(HOOKS);
        for i in 0..HOOKS {
            let handle = svc.clone();
            let runs = runs.clone();
            registrations.push(tokio::spawn(async move {
                handle.register_shutdown_hook(move || async move {
                    runs[i].fetch_add(1, Ordering::SeqCst);
                })
                .await;
            }));
            if i == HOOKS / 2 {
                svc.spawn(async { Err::<(), BoxError>("x".into()) });
            }
        }

        for registration in registrations {
            tokio::time::timeout(Duration::from_secs(5), registration)
                .await
                .unwrap_or_else(|_| panic!("registration hung in round {round}"))
                .unwrap();
        }
        assert_eq!(wait_bounded(&svc).await.unwrap_err().to_string(), "x");

        for (i, count) in runs.iter().enumerate() {
            assert_eq!(
                count.load(Ordering::SeqCst),
                1,
                "hook {i} ran a wrong number of times in round {round}"
            );
        }
    }
}

#[tokio::test]
async fn parent_cancellation_is_reported_as_canceled() {
    let parent = CancellationToken::new();
    let (token, svc) = Service::new(&parent, &[]).unwrap();

    let ctx = token.clone();
    svc.spawn(async move {
        ctx.cancelled().await;
        Ok::<_, BoxError>(())
    });

    parent.cancel();
    let err = wait_bounded(&svc).await.unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(err.to_string(), "context canceled");
}

#[tokio::test]
async fn derived_token_cancellation_is_reported_as_canceled() {
    let parent = CancellationToken::new();
    let (token, svc) = Service::new(&parent, &[]).unwrap();

    token.cancel();
    let err = wait_bounded(&svc).await.unwrap_err();
    assert!(err.is_canceled());
    assert!(!parent.is_cancelled());
}

#[tokio::test]
async fn service_without_a_cause_keeps_waiting() {
    let (token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    svc.spawn(async { Ok::<_, BoxError>(()) });

    let waited = tokio::time::timeout(Duration::from_millis(100), svc.wait()).await;
    assert!(waited.is_err());
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn panicking_task_shuts_the_service_down() {
    let (_token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    svc.spawn_fn("unstable", |ctx: CancellationToken| async move {
        if !ctx.is_cancelled() {
            panic!("lost invariant");
        }
        Ok::<_, BoxError>(())
    });

    match wait_bounded(&svc).await.unwrap_err() {
        ServiceError::Panicked { task, .. } => assert_eq!(task, "unstable"),
        other => panic!("unexpected cause: {other:?}"),
    }
}

#[tokio::test]
async fn named_task_sees_the_service_token() {
    let (_token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
    let log: Log = Arc::default();

    let watcher_log = log.clone();
    svc.spawn_task(TaskFn::arc("watcher", move |ctx: CancellationToken| {
        let log = watcher_log.clone();
        async move {
            ctx.cancelled().await;
            append(&log, "watcher");
            Ok::<_, BoxError>(())
        }
    }));
    svc.spawn(async { Err::<(), BoxError>("stop".into()) });

    assert_eq!(wait_bounded(&svc).await.unwrap_err().to_string(), "stop");
    assert_eq!(*log.lock().unwrap(), vec!["watcher"]);
}

/// Signals pushed by the test.
struct ChannelSignals(mpsc::UnboundedReceiver<Signal>);

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn recv(&mut self) -> Option<Signal> {
        self.0.recv().await
    }
}

#[tokio::test]
async fn custom_signal_source_drives_shutdown() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (token, svc) = Service::builder(Config::default())
        .with_signal_source(ChannelSignals(rx))
        .build(&CancellationToken::new())
        .unwrap();

    let ctx = token.clone();
    svc.spawn(async move {
        ctx.cancelled().await;
        Ok::<_, BoxError>(())
    });

    tx.send(Signal::Terminate).unwrap();
    let err = wait_bounded(&svc).await.unwrap_err();
    assert_eq!(err.to_string(), "received terminated");
    assert_eq!(err.signal(), Some(Signal::Terminate));
}

#[tokio::test]
async fn task_error_beats_a_later_signal() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (_token, svc) = Service::builder(Config::default())
        .with_signal_source(ChannelSignals(rx))
        .build(&CancellationToken::new())
        .unwrap();

    svc.spawn(async { Err::<(), BoxError>("task first".into()) });
    let err = wait_bounded(&svc).await.unwrap_err();
    let _ = tx.send(Signal::Interrupt);

    assert_eq!(err.to_string(), "task first");
    assert_eq!(wait_bounded(&svc).await.unwrap_err().to_string(), "task first");
}

/// Collects event kinds in delivery order.
#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_observe_the_shutdown() {
    let recorder = Arc::new(Recorder::default());
    let (_token, svc) = Service::builder(Config::default())
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build(&CancellationToken::new())
        .unwrap();

    svc.register_shutdown_hook(|| async {}).await;
    svc.spawn(async { Err::<(), BoxError>("bye".into()) });
    wait_bounded(&svc).await.unwrap_err();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let kinds = recorder.kinds.lock().unwrap().clone();
        if kinds.contains(&EventKind::AllStopped) {
            assert!(kinds.contains(&EventKind::HookRegistered));
            assert!(kinds.contains(&EventKind::TaskFailed));
            assert!(kinds.contains(&EventKind::ShutdownRequested));
            assert!(kinds.contains(&EventKind::HooksDraining));
            assert!(kinds.contains(&EventKind::HookCompleted));
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "events not delivered: {kinds:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
