/**
 * `ResultHandle`: a single-resolution future for one delivery.
 *
 * Shared between the caller (any number of readers) and exactly one
 * resolver: the worker that executes the job, or the dispatcher that
 * rejects it up front. Clones share the same state.
 *
 * State machine:
 *
 * ```text
 *            resolve(value)
 *   Pending ───────────────► Resolved(value)
 *      │
 *      └───────────────────► Rejected(error)
 *            reject(error)
 * ```
 *
 * Exactly one terminal transition ever happens. Later `resolve`/`reject`
 * calls are ignored and report it by returning `false`.
 *
 * Readers can poll (`outcome`), block (`wait`, `wait_timeout`) or register
 * a continuation (`on_complete`).
 */
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::error::DeliveryError;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The terminal state of a `ResultHandle`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The collector accepted the payload; holds its parsed response.
    Resolved(Value),

    Rejected(DeliveryError),
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// Converts into a `Result`, handy for `?` in callers.
    pub fn into_result(self) -> Result<Value, DeliveryError> {
        match self {
            Outcome::Resolved(value) => Ok(value),
            Outcome::Rejected(error) => Err(error),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultHandle
// ---------------------------------------------------------------------------

type Callback = Box<dyn FnOnce(&Outcome) + Send>;

struct State {
    outcome: Option<Outcome>,
    callbacks: Vec<Callback>,
}

struct Inner {
    state: Mutex<State>,
    condvar: Condvar,
}

/**
 * Handle to the eventual outcome of one delivery.
 *
 * Cheap to clone; every clone observes the same state.
 */
#[derive(Clone)]
pub struct ResultHandle {
    inner: Arc<Inner>,
}

impl ResultHandle {
    /// Creates a pending handle.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    outcome: None,
                    callbacks: Vec::new(),
                }),
                condvar: Condvar::new(),
            }),
        }
    }

    /**
     * Transitions `Pending → Resolved(value)`.
     *
     * Returns `false` (and changes nothing) if the handle was already settled.
     */
    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Outcome::Resolved(value))
    }

    /**
     * Transitions `Pending → Rejected(error)`.
     *
     * Returns `false` (and changes nothing) if the handle was already settled.
     */
    pub fn reject(&self, error: DeliveryError) -> bool {
        self.settle(Outcome::Rejected(error))
    }

    fn settle(&self, outcome: Outcome) -> bool {
        let callbacks = {
            let mut state = self.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            std::mem::take(&mut state.callbacks)
        };

        self.inner.condvar.notify_all();

        /*
         * Continuations run outside the lock so they may freely read the
         * handle (or register further continuations) themselves.
         */
        for callback in callbacks {
            run_callback(callback, &outcome);
        }

        true
    }

    /// The terminal state, or `None` while pending.
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().outcome.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().outcome.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.lock().outcome, Some(Outcome::Resolved(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.lock().outcome, Some(Outcome::Rejected(_)))
    }

    /// Blocks the calling thread until the handle is settled.
    pub fn wait(&self) -> Outcome {
        let mut state = self.lock();
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            state = self
                .inner
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /**
     * Blocks until the handle is settled or `timeout` elapses.
     *
     * Returns `None` on timeout.
     */
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let guard = self.lock();
        let (state, _) = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |state| state.outcome.is_none())
            .unwrap_or_else(PoisonError::into_inner);

        state.outcome.clone()
    }

    /**
     * Registers a continuation that runs exactly once with the outcome.
     *
     * If the handle is already settled the callback runs immediately on the
     * calling thread; otherwise it runs on whichever thread settles it.
     *
     * A panicking callback is caught and logged. It never unwinds into the
     * settling thread and never stops the callbacks registered after it.
     */
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let settled = {
            let mut state = self.lock();
            if state.outcome.is_none() {
                state.callbacks.push(Box::new(callback));
                return;
            }
            state.outcome.clone()
        };

        if let Some(outcome) = settled {
            run_callback(callback, &outcome);
        }
    }

    /*
     * A panicking continuation cannot leave `State` half-written (callbacks
     * run outside the lock), so a poisoned mutex is safe to keep using.
     */
    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_callback<F>(callback: F, outcome: &Outcome)
where
    F: FnOnce(&Outcome),
{
    if panic::catch_unwind(AssertUnwindSafe(|| callback(outcome))).is_err() {
        tracing::error!(?outcome, "result handle continuation panicked");
    }
}

impl Default for ResultHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("outcome", &self.outcome())
            .finish()
    }
}
