/**
 * Transport layer: how notices and deploys reach the collector.
 *
 * - `http`: `SyncSender`, the blocking ureq-based delegate
 * - `pool`: bounded job queue and the worker threads draining it
 * - `async_sender`: non-blocking enqueue-or-reject front of the pool
 *
 * The seam between them is the `Sender` trait: anything that can transmit
 * one payload synchronously and settle its `ResultHandle`.
 */
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::DeliveryError;
use crate::promise::ResultHandle;

pub mod async_sender;
pub mod http;
pub mod pool;

pub use async_sender::{will_not_deliver_message, AsyncSender};
pub use http::SyncSender;
pub use pool::{Job, PoolState, WorkerPool};

// ---------------------------------------------------------------------------
// Sender: the delegate capability
// ---------------------------------------------------------------------------

/**
 * Synchronously transmits one payload and settles its handle.
 *
 * Implementations are shared read-only across all worker threads, hence
 * `Send + Sync`. A sender returning `Ok` must have settled the handle.
 * Returning `Err` (or panicking) means the sender gave up
 * before settling the handle; `deliver` then rejects it with
 * `DeliveryError::DeliveryFailed`.
 */
pub trait Sender<P>: Send + Sync {
    fn send(&self, payload: &P, handle: &ResultHandle, endpoint: &str) -> Result<(), DeliveryError>;
}

impl<P, F> Sender<P> for F
where
    F: Fn(&P, &ResultHandle, &str) -> Result<(), DeliveryError> + Send + Sync,
{
    fn send(&self, payload: &P, handle: &ResultHandle, endpoint: &str) -> Result<(), DeliveryError> {
        self(payload, handle, endpoint)
    }
}

// ---------------------------------------------------------------------------
// deliver: run one job through a sender, containing its failures
// ---------------------------------------------------------------------------

/**
 * Runs `sender` for one payload and guarantees that a failing sender can
 * neither unwind into the caller nor leave the handle pending.
 *
 * If the sender already settled the handle before failing, the rejection
 * here is a no-op.
 */
pub fn deliver<P>(sender: &dyn Sender<P>, payload: &P, handle: &ResultHandle, endpoint: &str) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| sender.send(payload, handle, endpoint)));

    let reason = match result {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("sender panicked: {}", panic_message(payload.as_ref())),
    };

    tracing::error!(endpoint, %reason, "delivery failed");
    handle.reject(DeliveryError::DeliveryFailed(reason));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&str>() {
        Some(s) => (*s).to_string(),
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "<unknown panic>".to_string(),
        },
    }
}
