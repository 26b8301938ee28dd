/**
 * Deploy announcements.
 *
 * Unlike notices, deploys are not queued: `DeployNotifier::notify` performs
 * one synchronous send on the calling thread. The `ResultHandle` contract is
 * the same as on the async path, so callers treat both alike.
 */
use std::sync::Arc;

use crate::config::Config;
use crate::error::DeliveryError;
use crate::promise::ResultHandle;
use crate::protocol::types::DeployInfo;
use crate::transport::{deliver, Sender, SyncSender};

pub struct DeployNotifier {
    config: Arc<Config>,
    sender: Arc<dyn Sender<DeployInfo>>,
}

impl DeployNotifier {
    /// Sends over HTTP with a `SyncSender` built from `config`.
    pub fn new(config: Arc<Config>) -> Self {
        let sender = Arc::new(SyncSender::new(&config));
        Self { config, sender }
    }

    pub fn with_sender(config: Arc<Config>, sender: Arc<dyn Sender<DeployInfo>>) -> Self {
        Self { config, sender }
    }

    /**
     * Announces a deploy and returns `handle`, already settled.
     *
     * In an ignored environment the handle is rejected with
     * `EnvironmentIgnored` and nothing is sent. Otherwise a missing
     * `environment` is filled in from the configuration before sending.
     */
    pub fn notify(&self, mut deploy_info: DeployInfo, handle: ResultHandle) -> ResultHandle {
        if self.config.ignored_environment() {
            let environment = self.config.environment.clone().unwrap_or_default();
            handle.reject(DeliveryError::EnvironmentIgnored(environment));
            return handle;
        }

        if deploy_info.environment.is_none() {
            deploy_info.environment = self.config.environment.clone();
        }

        let endpoint = self.config.deploy_endpoint();
        deliver(self.sender.as_ref(), &deploy_info, &handle, &endpoint);

        handle
    }
}
