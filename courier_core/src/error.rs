/**
 * Error types shared across the SDK.
 *
 * `DeliveryError` is the only error that travels through a `ResultHandle`.
 * Nothing in the delivery path returns it to the caller directly: every
 * failure is settled on the handle instead.
 */
use thiserror::Error;

use crate::protocol::types::NoticeError;

// ---------------------------------------------------------------------------
// DeliveryError
// ---------------------------------------------------------------------------

/**
 * Why a notice or deploy did not reach the collector.
 *
 * `Clone + PartialEq` so that every reader of a `ResultHandle` observes the
 * exact same value.
 */
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// The worker queue was full, or the pool was no longer open, when the
    /// notice was offered. `error` is the primary error of the dropped notice.
    #[error("AsyncSender has reached its capacity of {capacity}")]
    CapacityExceeded {
        capacity: usize,
        error: Option<NoticeError>,
    },

    /// The delegate sender failed or panicked while executing the job.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// The configured environment is listed in `ignore_environments`.
    #[error("The '{0}' environment is ignored")]
    EnvironmentIgnored(String),

    /// The collector answered with a non-success status code.
    #[error("collector responded with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The collector answered 2xx but the body was not valid JSON.
    #[error("invalid collector response: {0}")]
    InvalidResponse(String),

    /// A facade call was made before `init()`.
    #[error("the notifier is not initialized")]
    NotInitialized,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Problems detected by `Config::validate`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("project_id is required")]
    MissingProjectId,

    #[error("project_key is required")]
    MissingProjectKey,

    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("queue_size must be at least 1")]
    EmptyQueue,

    #[error("host must not be empty")]
    EmptyHost,
}
