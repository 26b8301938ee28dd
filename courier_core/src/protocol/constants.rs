/**
 * SDK-wide constants.
 *
 * The notifier name and version are stamped into the context of every
 * notice so the collector can tell which SDK produced it.
 */

/// Identifies this SDK to the collector.
pub const NOTIFIER_NAME: &str = "courier-rust";

/// Derived at compile time from the `courier_core` package version.
pub const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of every diagnostic line the SDK writes about itself.
pub const LOG_LABEL: &str = "**Courier:";

/// Collector used when `Config::host` is left at its default.
pub const DEFAULT_HOST: &str = "https://api.airbrake.io";
