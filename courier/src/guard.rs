/**
 * RAII guard returned by `courier::init()`.
 *
 * ```ignore
 * fn main() {
 *     let _guard = courier::init(config).unwrap();
 *
 *     // ... application logic ...
 *
 * }   // <-- _guard is dropped here, queued notices are delivered
 * ```
 *
 * The guard does not own the `Notifier`: it lives in a `static OnceLock`
 * and outlives the guard. Dropping the guard closes the notifier, so
 * notices sent afterwards are rejected.
 */
use crate::notifier;

pub struct Guard {
    _private: (),
}

impl Guard {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(notifier) = notifier() {
            notifier.close();
            tracing::debug!("courier closed");
        }
    }
}
