/**
 * Fixed-size worker pool draining a bounded job queue.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌──────────────┐   try_enqueue (never blocks)   ┌──────────────────┐
 *  │ Producers    │ ──────────── Job<P> ─────────► │ Worker threads   │
 *  │ (any thread) │     bounded crossbeam queue    │ (N, fixed)       │
 *  └──────────────┘                                └────────┬─────────┘
 *                                                           │
 *                                                  transport::deliver()
 *                                                           │
 *                                                    ┌──────▼──────┐
 *                                                    │ Sender<P>   │
 *                                                    └─────────────┘
 * ```
 *
 * Lifecycle: `Open → Closing → Closed`, one way only.
 *
 * - `Open`: offers are accepted while the queue has room.
 * - `Closing`: entered by `close()`. The queue is disconnected, so no new
 *   job is accepted from this moment on. Workers finish the job in hand
 *   and then drain whatever was already queued.
 * - `Closed`: every worker has exited.
 *
 * Queued-but-unstarted jobs are therefore executed, not discarded, and
 * every accepted job runs exactly once.
 */
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender as QueueSender, TrySendError};

use super::{deliver, Sender};
use crate::promise::ResultHandle;

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/**
 * One delivery unit. Owned by the queue until a worker takes it, then by
 * that worker for the duration of the send.
 */
pub struct Job<P> {
    pub payload: P,
    pub endpoint: String,
    pub handle: ResultHandle,
}

impl<P> Job<P> {
    pub fn new(payload: P, endpoint: impl Into<String>, handle: ResultHandle) -> Self {
        Self {
            payload,
            endpoint: endpoint.into(),
            handle,
        }
    }
}

// ---------------------------------------------------------------------------
// PoolState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Open,
    Closing,
    Closed,
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

struct Shared<P> {
    state: PoolState,

    /// Producer side of the queue. Dropped on `close()`, which is what
    /// lets the workers' `recv()` end once the queue is empty.
    queue: Option<QueueSender<Job<P>>>,

    workers: Vec<JoinHandle<()>>,

    /// Ids of every spawned worker. Outlives `workers`, which `close()`
    /// takes out to join.
    worker_ids: Vec<ThreadId>,
}

/**
 * A fixed set of worker threads and the bounded queue they read from.
 *
 * Safe to share between threads: producers call `try_enqueue`
 * concurrently without any external locking.
 */
pub struct WorkerPool<P> {
    shared: Mutex<Shared<P>>,

    /// Signalled when the pool reaches `Closed`.
    closed: Condvar,

    capacity: usize,
}

impl<P: Send + 'static> WorkerPool<P> {
    /**
     * Creates the queue and spawns `worker_size` threads right away.
     *
     * A thread that fails to spawn is logged and skipped; the pool runs
     * with whatever workers it got (`has_workers` reports `false` if none).
     *
     * # Arguments
     * * `worker_size`: Number of worker threads.
     * * `queue_size`: Maximum number of jobs waiting for a worker.
     * * `sender`: The delegate that actually transmits each job.
     */
    pub fn new(worker_size: usize, queue_size: usize, sender: Arc<dyn Sender<P>>) -> Self {
        let (queue, receiver) = crossbeam_channel::bounded(queue_size);

        let workers: Vec<JoinHandle<()>> = (0..worker_size)
            .filter_map(|id| {
                let receiver = receiver.clone();
                let sender = sender.clone();

                thread::Builder::new()
                    .name(format!("courier-worker-{id}"))
                    .spawn(move || Self::run_loop(id, &receiver, sender.as_ref()))
                    .map_err(|err| tracing::error!(worker = id, %err, "failed to spawn worker thread"))
                    .ok()
            })
            .collect();
        let worker_ids = workers.iter().map(|worker| worker.thread().id()).collect();

        Self {
            shared: Mutex::new(Shared {
                state: PoolState::Open,
                queue: Some(queue),
                workers,
                worker_ids,
            }),
            closed: Condvar::new(),
            capacity: queue_size,
        }
    }

    /**
     * Worker main loop.
     *
     * Blocks on `recv()` while idle. `recv()` returns `Err` only once the
     * producer side is dropped *and* the queue is empty, so closing the
     * pool drains it first.
     */
    fn run_loop(id: usize, receiver: &Receiver<Job<P>>, sender: &dyn Sender<P>) {
        tracing::debug!(worker = id, "worker started");

        while let Ok(job) = receiver.recv() {
            deliver(sender, &job.payload, &job.handle, &job.endpoint);
        }

        tracing::debug!(worker = id, "worker exited");
    }
}

impl<P> WorkerPool<P> {
    /**
     * Offers a job without ever blocking.
     *
     * Returns `Err(job)`, handing the job back untouched, when the queue is
     * full or the pool is no longer open. The caller decides what to tell
     * the job's handle; the pool never retries.
     *
     * A pool with zero capacity refuses every job. A zero-sized crossbeam
     * channel is a rendezvous and would otherwise hand jobs to idle workers.
     */
    pub fn try_enqueue(&self, job: Job<P>) -> Result<(), Job<P>> {
        let shared = self.lock();

        if shared.state != PoolState::Open || self.capacity == 0 {
            return Err(job);
        }

        match &shared.queue {
            Some(queue) => queue.try_send(job).map_err(|err| match err {
                TrySendError::Full(job) | TrySendError::Disconnected(job) => job,
            }),
            None => Err(job),
        }
    }

    /**
     * Stops accepting jobs and waits for the workers to finish.
     *
     * Jobs already queued are drained before this returns. Idempotent: a
     * second caller (concurrent or later) returns once the pool is `Closed`.
     *
     * Called from one of the pool's own workers, that worker is not joined
     * (it would wait on itself) but is still counted out of the pool. A
     * worker arriving while another thread is already closing returns at
     * once: the closer is joining that very worker.
     */
    pub fn close(&self) {
        let current = thread::current().id();

        let workers = {
            let mut shared = self.lock();
            let state = shared.state;

            match state {
                PoolState::Open => {}
                PoolState::Closing if shared.worker_ids.contains(&current) => return,
                PoolState::Closing => {
                    let _closed = self
                        .closed
                        .wait_while(shared, |shared| shared.state != PoolState::Closed)
                        .unwrap_or_else(PoisonError::into_inner);
                    return;
                }
                PoolState::Closed => return,
            }

            shared.state = PoolState::Closing;
            shared.queue = None;
            std::mem::take(&mut shared.workers)
        };

        tracing::debug!(workers = workers.len(), "closing worker pool");

        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                tracing::error!("worker thread panicked while closing the pool");
            }
        }

        self.lock().state = PoolState::Closed;
        self.closed.notify_all();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        self.lock().state
    }

    pub fn is_closed(&self) -> bool {
        self.state() == PoolState::Closed
    }

    /// `true` while the pool is open and at least one worker is alive.
    pub fn has_workers(&self) -> bool {
        let shared = self.lock();
        shared.state == PoolState::Open && shared.workers.iter().any(|w| !w.is_finished())
    }

    /// Number of jobs currently waiting for a worker.
    pub fn queued(&self) -> usize {
        self.lock().queue.as_ref().map_or(0, QueueSender::len)
    }

    /// Maximum number of waiting jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Shared<P>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
