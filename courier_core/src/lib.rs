/*!
 * Courier Core: the delivery engine.
 *
 * Delivers error notices and deploy announcements to a remote collector
 * without blocking the caller. End users should depend on the `courier`
 * facade crate, which keeps a process-wide `Notifier` and flushes it on
 * shutdown.
 *
 * # Module structure
 *
 * - `promise`: `ResultHandle`, the single-resolution outcome of a delivery
 * - `transport/`: the `Sender` seam, worker pool, async front, HTTP sender
 * - `deploy`: synchronous, unqueued deploy announcements
 * - `notifier`: one `Config` wired to both paths
 * - `protocol/`: payload types and stack capture
 * - `config`, `error`
 *
 * # Example
 * ```ignore
 * let notifier = courier_core::Notifier::new(courier_core::Config {
 *     project_id: Some(1),
 *     project_key: Some("key".into()),
 *     ..Default::default()
 * })?;
 *
 * let handle = notifier.notify(courier_core::Notice::new("RuntimeError", "boom"));
 * handle.on_complete(|outcome| println!("{outcome:?}"));
 * ```
 */

mod config;
mod deploy;
mod error;
mod notifier;
mod promise;
mod protocol;
pub mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use config::Config;
pub use deploy::DeployNotifier;
pub use error::{ConfigError, DeliveryError};
pub use notifier::Notifier;
pub use promise::{Outcome, ResultHandle};
pub use protocol::constants::{LOG_LABEL, NOTIFIER_NAME, NOTIFIER_VERSION};
pub use protocol::frames::{capture_backtrace, convert_backtrace};
pub use protocol::types::{BacktraceFrame, DeployInfo, Notice, NoticeError};
pub use transport::{AsyncSender, Sender, SyncSender};
