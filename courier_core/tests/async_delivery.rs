/**
 * End-to-end behaviour of the async notice path: capacity, failure
 * isolation and shutdown.
 */
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use courier_core::transport::{Job, WorkerPool};
use courier_core::{
    AsyncSender, Config, DeliveryError, Notice, Outcome, ResultHandle, Sender,
};
use crossbeam_channel::{Receiver, Sender as ChannelSender};
use serde_json::json;

fn config(workers: usize, queue_size: usize) -> Arc<Config> {
    Arc::new(Config {
        project_id: Some(1),
        project_key: Some("key".into()),
        workers,
        queue_size,
        ..Default::default()
    })
}

/**
 * A sender that blocks on notices titled "slow" until released, and
 * reports each start on `started`.
 */
fn gated_sender(
    started: ChannelSender<String>,
    release: Receiver<()>,
    calls: Arc<AtomicUsize>,
) -> Arc<dyn Sender<Notice>> {
    Arc::new(
        move |notice: &Notice, handle: &ResultHandle, _: &str| -> Result<(), DeliveryError> {
            calls.fetch_add(1, Ordering::SeqCst);
            let message = notice.errors[0].message.clone();
            let _ = started.send(message.clone());
            if message == "slow" {
                let _ = release.recv();
            }
            handle.resolve(json!({ "message": message }));
            Ok(())
        },
    )
}

/**
 * Capacity 1, one worker: with the worker busy and the queue holding one
 * notice, the next offer is rejected on the spot and never reaches the
 * sender.
 */
#[test]
fn test_capacity_rejection_is_synchronous() {
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    let calls = Arc::new(AtomicUsize::new(0));
    let sender = AsyncSender::with_sender(
        config(1, 1),
        gated_sender(started_tx, release_rx, calls.clone()),
    );

    let slow = sender.send(Notice::new("RuntimeError", "slow"), ResultHandle::new());
    assert_eq!(started_rx.recv().unwrap(), "slow");

    let queued = sender.send(Notice::new("RuntimeError", "queued"), ResultHandle::new());
    assert!(queued.is_pending());

    let overflow_notice = Notice::new("RuntimeError", "overflow");
    let primary = overflow_notice.errors[0].clone();
    let overflow = sender.send(overflow_notice, ResultHandle::new());

    match overflow.outcome() {
        Some(Outcome::Rejected(err @ DeliveryError::CapacityExceeded { .. })) => {
            assert_eq!(err.to_string(), "AsyncSender has reached its capacity of 1");
            assert_eq!(
                err,
                DeliveryError::CapacityExceeded {
                    capacity: 1,
                    error: Some(primary),
                }
            );
        }
        other => panic!("expected a capacity rejection, got {other:?}"),
    }

    release_tx.send(()).unwrap();
    assert_eq!(slow.wait(), Outcome::Resolved(json!({ "message": "slow" })));
    assert_eq!(queued.wait(), Outcome::Resolved(json!({ "message": "queued" })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/**
 * A panicking or failing sender rejects only its own job; the worker keeps
 * serving the next ones.
 */
#[test]
fn test_failing_sender_does_not_kill_worker() {
    let sender: Arc<dyn Sender<Notice>> = Arc::new(
        |notice: &Notice, handle: &ResultHandle, _: &str| -> Result<(), DeliveryError> {
            match notice.errors[0].message.as_str() {
                "panic" => panic!("transport blew up"),
                "error" => Err(DeliveryError::Transport("reset by peer".into())),
                _ => {
                    handle.resolve(json!("ok"));
                    Ok(())
                }
            }
        },
    );
    let async_sender = AsyncSender::with_sender(config(1, 10), sender);

    let panicked = async_sender.send(Notice::new("E", "panic"), ResultHandle::new());
    let errored = async_sender.send(Notice::new("E", "error"), ResultHandle::new());
    let fine = async_sender.send(Notice::new("E", "fine"), ResultHandle::new());

    assert_eq!(
        panicked.wait(),
        Outcome::Rejected(DeliveryError::DeliveryFailed(
            "sender panicked: transport blew up".into()
        ))
    );
    assert_eq!(
        errored.wait(),
        Outcome::Rejected(DeliveryError::DeliveryFailed(
            "transport error: reset by peer".into()
        ))
    );
    assert_eq!(fine.wait(), Outcome::Resolved(json!("ok")));
    assert!(async_sender.has_workers());
}

/**
 * After `close()` returns, nothing sent afterwards is executed.
 */
#[test]
fn test_no_execution_after_close() {
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let (_release_tx, release_rx) = crossbeam_channel::unbounded();
    let calls = Arc::new(AtomicUsize::new(0));
    let sender = AsyncSender::with_sender(
        config(2, 10),
        gated_sender(started_tx, release_rx, calls.clone()),
    );

    let handles: Vec<_> = (0..5)
        .map(|i| sender.send(Notice::new("E", format!("n{i}")), ResultHandle::new()))
        .collect();

    sender.close();

    assert!(sender.is_closed());
    assert!(!sender.has_workers());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(handles.iter().all(ResultHandle::is_resolved));
    assert_eq!(started_rx.len(), 5);

    let late = sender.send(Notice::new("E", "late"), ResultHandle::new());
    assert!(matches!(
        late.outcome(),
        Some(Outcome::Rejected(DeliveryError::CapacityExceeded { capacity: 10, .. }))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

/**
 * Many producers racing against a small pool: every offer is either
 * executed exactly once or rejected, never both, never lost.
 */
#[test]
fn test_concurrent_producers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let sender: Arc<dyn Sender<u32>> = Arc::new(
        move |_: &u32, handle: &ResultHandle, _: &str| -> Result<(), DeliveryError> {
            counter.fetch_add(1, Ordering::SeqCst);
            handle.resolve(json!(null));
            Ok(())
        },
    );
    let pool = Arc::new(WorkerPool::new(3, 4, sender));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                (0..50u32)
                    .map(|n| {
                        let handle = ResultHandle::new();
                        let accepted = pool.try_enqueue(Job::new(n, "e", handle.clone())).is_ok();
                        (accepted, handle)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = producers
        .into_iter()
        .flat_map(|p| p.join().unwrap())
        .collect();

    pool.close();

    let accepted = results.iter().filter(|(accepted, _)| *accepted).count();
    assert_eq!(calls.load(Ordering::SeqCst), accepted);
    for (accepted, handle) in &results {
        assert_eq!(*accepted, handle.is_resolved());
    }
}
