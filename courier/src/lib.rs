/**
 * Courier: error and deploy reporting for Rust.
 *
 * This is the crate users should depend on. It keeps one `Notifier` per
 * process and exposes free functions over it.
 *
 * # Quick start
 *
 * ```ignore
 * fn main() -> Result<(), courier::InitError> {
 *     let _guard = courier::init(courier::Config {
 *         project_id: Some(113743),
 *         project_key: Some("fd04e13d806a90f96614ad8e529b2822".into()),
 *         environment: Some("production".into()),
 *         ..Default::default()
 *     })?;
 *
 *     if let Err(e) = std::fs::read_to_string("settings.toml") {
 *         courier::notify(&e);
 *     }
 *
 *     Ok(())
 *     // _guard is dropped here → queued notices are delivered first
 * }
 * ```
 *
 * Every call returns a `ResultHandle`; callers that care about the outcome
 * can `wait()` on it or register `on_complete`, everyone else can drop it.
 */
use std::error::Error as StdError;
use std::sync::OnceLock;

use thiserror::Error;

mod guard;

// ---------------------------------------------------------------------------
// Re-exports from courier_core: the public surface area
// ---------------------------------------------------------------------------

pub use courier_core::{
    BacktraceFrame, Config, ConfigError, DeliveryError, DeployInfo, Notice, NoticeError,
    Notifier, Outcome, ResultHandle, NOTIFIER_VERSION,
};
pub use guard::Guard;

// ---------------------------------------------------------------------------
// Global notifier
// ---------------------------------------------------------------------------

static GLOBAL_NOTIFIER: OnceLock<Notifier> = OnceLock::new();

/// The process-wide notifier, or `None` before `init()`.
pub fn notifier() -> Option<&'static Notifier> {
    GLOBAL_NOTIFIER.get()
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("courier is already initialized")]
    AlreadyInitialized,
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

/**
 * Validates `config` and installs the process-wide notifier.
 *
 * # Returns
 * A `Guard`: keep it alive for the duration of your app. When it drops,
 * the notifier is closed and queued notices are delivered.
 */
pub fn init(config: Config) -> Result<Guard, InitError> {
    if GLOBAL_NOTIFIER.get().is_some() {
        return Err(InitError::AlreadyInitialized);
    }

    let notifier = Notifier::new(config)?;

    GLOBAL_NOTIFIER
        .set(notifier)
        .map_err(|_| InitError::AlreadyInitialized)?;

    tracing::debug!(version = NOTIFIER_VERSION, "courier initialized");
    Ok(Guard::new())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Reports an error together with its `source()` chain.
pub fn notify(error: &(dyn StdError + 'static)) -> ResultHandle {
    notify_notice(Notice::from_error(error))
}

/// Reports a plain message. The notice type is `"message"`.
pub fn notify_message(message: &str) -> ResultHandle {
    notify_notice(Notice::new("message", message))
}

/**
 * Queues a pre-built notice.
 *
 * Before `init()` the returned handle is already rejected with
 * `DeliveryError::NotInitialized`.
 */
pub fn notify_notice(notice: Notice) -> ResultHandle {
    match notifier() {
        Some(notifier) => notifier.notify(notice),
        None => not_initialized(),
    }
}

/// Announces a deploy synchronously.
pub fn notify_deploy(deploy_info: DeployInfo) -> ResultHandle {
    match notifier() {
        Some(notifier) => notifier.notify_deploy(deploy_info),
        None => not_initialized(),
    }
}

/**
 * Closes the notifier, blocking until queued notices are delivered.
 *
 * Normally you don't need this: the `Guard` does it on drop.
 */
pub fn close() {
    if let Some(notifier) = notifier() {
        notifier.close();
    }
}

fn not_initialized() -> ResultHandle {
    let handle = ResultHandle::new();
    handle.reject(DeliveryError::NotInitialized);
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    /*
     * The global can only be set once per process, so everything touching
     * it lives in a single test.
     */
    #[test]
    fn test_global_lifecycle() {
        assert_eq!(
            notify_message("too early").outcome(),
            Some(Outcome::Rejected(DeliveryError::NotInitialized))
        );

        assert!(matches!(
            init(Config::default()),
            Err(InitError::Config(ConfigError::MissingProjectId))
        ));

        let guard = init(Config {
            project_id: Some(1),
            project_key: Some("key".into()),
            environment: Some("test".into()),
            ignore_environments: vec!["test".into()],
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            init(Config::default()),
            Err(InitError::AlreadyInitialized)
        ));

        assert_eq!(
            notify_deploy(DeployInfo::default()).outcome(),
            Some(Outcome::Rejected(DeliveryError::EnvironmentIgnored("test".into())))
        );
        assert!(notify(&std::io::Error::other("disk full")).is_rejected());

        drop(guard);
        assert!(notifier().unwrap().is_closed());
    }
}
