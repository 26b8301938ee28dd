/**
 * Notifier configuration.
 *
 * Read-only once handed to `Notifier::new` (it is shared behind an `Arc`).
 * All fields have sensible defaults via `Default`; only `project_id` and
 * `project_key` must be filled in.
 *
 * # Example
 * ```ignore
 * let config = courier_core::Config {
 *     project_id: Some(113743),
 *     project_key: Some("fd04e13d806a90f96614ad8e529b2822".into()),
 *     environment: Some("production".into()),
 *     ignore_environments: vec!["test".into()],
 *     ..Default::default()
 * };
 * ```
 */
use std::time::Duration;

use crate::error::ConfigError;
use crate::protocol::constants::{DEFAULT_HOST, LOG_LABEL};

#[derive(Debug, Clone)]
pub struct Config {
    /// Collector project identifier.
    pub project_id: Option<u64>,

    /// Secret sent as a bearer token with every request.
    pub project_key: Option<String>,

    /// Collector base URL, without a trailing path.
    /// Default: `https://api.airbrake.io`.
    pub host: String,

    /// Environment this process runs in, e.g. `"production"`.
    pub environment: Option<String>,

    /// Environments for which nothing is sent at all.
    pub ignore_environments: Vec<String>,

    /// Number of worker threads delivering notices.
    /// Default: `1`.
    pub workers: usize,

    /// Maximum number of notices waiting for a worker. Offers beyond it
    /// are rejected with `CapacityExceeded`.
    /// Default: `100`.
    pub queue_size: usize,

    /// Per-request timeout of the HTTP transport.
    /// Default: 30 seconds.
    pub timeout: Duration,

    /// Prefix for the SDK's own diagnostic log lines.
    pub log_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            project_key: None,
            host: DEFAULT_HOST.to_string(),
            environment: None,
            ignore_environments: Vec::new(),
            workers: 1,
            queue_size: 100,
            timeout: Duration::from_secs(30),
            log_label: LOG_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Checks that the configuration can be used to deliver anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.is_none() {
            return Err(ConfigError::MissingProjectId);
        }
        if self.project_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingProjectKey);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        Ok(())
    }

    /// `true` when `environment` is set and listed in `ignore_environments`.
    pub fn ignored_environment(&self) -> bool {
        match &self.environment {
            Some(env) => self.ignore_environments.iter().any(|ignored| ignored == env),
            None => false,
        }
    }

    /// Where notices are posted.
    pub fn notice_endpoint(&self) -> String {
        format!(
            "{}/api/v3/projects/{}/notices",
            self.host.trim_end_matches('/'),
            self.project_id.unwrap_or_default()
        )
    }

    /// Where deploys are posted.
    pub fn deploy_endpoint(&self) -> String {
        format!(
            "{}/api/v4/projects/{}/deploys",
            self.host.trim_end_matches('/'),
            self.project_id.unwrap_or_default()
        )
    }
}
