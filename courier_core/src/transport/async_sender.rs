/**
 * Non-blocking front of the worker pool.
 *
 * `AsyncSender::send` offers a notice to the pool and returns the caller's
 * `ResultHandle` straight away:
 * - accepted → the handle is still pending; a worker settles it later.
 * - refused (queue full or pool closed) → the handle is rejected with
 *   `CapacityExceeded` before `send` returns, and one warning is logged.
 *
 * The pool, and the default `SyncSender` bound to it, are built on the
 * first `send` and reused for the lifetime of the `AsyncSender`.
 */
use std::sync::{Arc, OnceLock};

use super::http::SyncSender;
use super::pool::{Job, WorkerPool};
use super::Sender;
use crate::config::Config;
use crate::error::DeliveryError;
use crate::promise::ResultHandle;
use crate::protocol::types::Notice;

pub struct AsyncSender {
    config: Arc<Config>,

    /// Injected delegate. `None` means "build a `SyncSender` from `config`".
    sender: Option<Arc<dyn Sender<Notice>>>,

    pool: OnceLock<WorkerPool<Notice>>,
}

impl AsyncSender {
    /// Delivers through a `SyncSender` built from `config`.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            sender: None,
            pool: OnceLock::new(),
        }
    }

    /// Delivers through the given delegate instead of HTTP.
    pub fn with_sender(config: Arc<Config>, sender: Arc<dyn Sender<Notice>>) -> Self {
        Self {
            config,
            sender: Some(sender),
            pool: OnceLock::new(),
        }
    }

    /// Sends to `Config::notice_endpoint`.
    pub fn send(&self, notice: Notice, handle: ResultHandle) -> ResultHandle {
        let endpoint = self.config.notice_endpoint();
        self.send_to(notice, handle, &endpoint)
    }

    /**
     * Offers the notice to the pool without blocking.
     *
     * Always returns `handle`, either still pending (accepted) or already
     * rejected with `CapacityExceeded` (refused).
     */
    pub fn send_to(&self, notice: Notice, handle: ResultHandle, endpoint: &str) -> ResultHandle {
        let job = Job::new(notice, endpoint, handle.clone());

        if let Err(job) = self.pool().try_enqueue(job) {
            self.will_not_deliver(&job.payload, &handle);
        }

        handle
    }

    /// Closes the pool, draining queued notices. See `WorkerPool::close`.
    pub fn close(&self) {
        self.pool().close();
    }

    /// `false` until the pool exists.
    pub fn is_closed(&self) -> bool {
        self.pool.get().is_some_and(WorkerPool::is_closed)
    }

    /// `false` until the pool exists.
    pub fn has_workers(&self) -> bool {
        self.pool.get().is_some_and(WorkerPool::has_workers)
    }

    /*
     * `close()` goes through here too: closing before the first send must
     * still leave a closed pool behind, or a later send would open one.
     */
    fn pool(&self) -> &WorkerPool<Notice> {
        self.pool.get_or_init(|| {
            let sender: Arc<dyn Sender<Notice>> = match &self.sender {
                Some(sender) => sender.clone(),
                None => Arc::new(SyncSender::new(&self.config)),
            };

            tracing::debug!(
                workers = self.config.workers,
                queue_size = self.config.queue_size,
                "starting worker pool"
            );
            WorkerPool::new(self.config.workers, self.config.queue_size, sender)
        })
    }

    fn will_not_deliver(&self, notice: &Notice, handle: &ResultHandle) {
        let capacity = self.config.queue_size;

        tracing::warn!(
            "{}",
            will_not_deliver_message(&self.config.log_label, capacity, notice)
        );

        handle.reject(DeliveryError::CapacityExceeded {
            capacity,
            error: notice.primary_error().cloned(),
        });
    }
}

/**
 * The diagnostic logged once per refused notice:
 *
 * ```text
 * <label> AsyncSender has reached its capacity of <N> and the following notice will not be delivered Error: <type> - <message>
 * Backtrace: <file>:<line> in `<function>'
 * <file>:<line> in `<function>'
 * ```
 */
pub fn will_not_deliver_message(label: &str, capacity: usize, notice: &Notice) -> String {
    let (kind, message, backtrace) = match notice.primary_error() {
        Some(error) => (error.kind.as_str(), error.message.as_str(), error.render_backtrace()),
        None => ("", "", String::new()),
    };

    format!(
        "{label} AsyncSender has reached its capacity of {capacity} \
         and the following notice will not be delivered \
         Error: {kind} - {message}\nBacktrace: {backtrace}\n"
    )
}
