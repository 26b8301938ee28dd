/**
 * `Notifier`: wires one `Config` to the async notice path and the
 * synchronous deploy path.
 *
 * Constructed explicitly and owned by the caller; the `courier` facade
 * keeps one in a process-wide `OnceLock` for convenience, but nothing here
 * depends on that.
 */
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::Config;
use crate::deploy::DeployNotifier;
use crate::error::{ConfigError, DeliveryError};
use crate::promise::{Outcome, ResultHandle};
use crate::protocol::constants::{NOTIFIER_NAME, NOTIFIER_VERSION};
use crate::protocol::types::{DeployInfo, Notice};
use crate::transport::{deliver, AsyncSender, Sender, SyncSender};

pub struct Notifier {
    config: Arc<Config>,
    async_sender: AsyncSender,
    deploys: DeployNotifier,

    /// Used by `notify_sync`, on the calling thread.
    sync_sender: Arc<dyn Sender<Notice>>,
}

impl Notifier {
    /**
     * Validates `config` and prepares HTTP delivery.
     *
     * No thread is started here; the worker pool comes up on the first
     * `notify`.
     */
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let sync_sender: Arc<dyn Sender<Notice>> = Arc::new(SyncSender::new(&config));

        Ok(Self {
            async_sender: AsyncSender::with_sender(config.clone(), sync_sender.clone()),
            deploys: DeployNotifier::new(config.clone()),
            sync_sender,
            config,
        })
    }

    /// Same as `new`, with injected delegates for notices and deploys.
    pub fn with_senders(
        config: Config,
        notice_sender: Arc<dyn Sender<Notice>>,
        deploy_sender: Arc<dyn Sender<DeployInfo>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            async_sender: AsyncSender::with_sender(config.clone(), notice_sender.clone()),
            deploys: DeployNotifier::with_sender(config.clone(), deploy_sender),
            sync_sender: notice_sender,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /**
     * Queues a notice for delivery and returns its handle without blocking.
     *
     * In an ignored environment the handle comes back already rejected with
     * `EnvironmentIgnored`.
     */
    pub fn notify(&self, notice: Notice) -> ResultHandle {
        let handle = ResultHandle::new();

        match self.prepare(notice) {
            Ok(notice) => self.async_sender.send(notice, handle),
            Err(err) => {
                handle.reject(err);
                handle
            }
        }
    }

    /// Delivers a notice on the calling thread and waits for the outcome.
    pub fn notify_sync(&self, notice: Notice) -> Outcome {
        let handle = ResultHandle::new();

        match self.prepare(notice) {
            Ok(notice) => {
                let endpoint = self.config.notice_endpoint();
                deliver(self.sync_sender.as_ref(), &notice, &handle, &endpoint);
            }
            Err(err) => {
                handle.reject(err);
            }
        }

        handle.wait()
    }

    /// Announces a deploy. See `DeployNotifier::notify`.
    pub fn notify_deploy(&self, deploy_info: DeployInfo) -> ResultHandle {
        self.deploys.notify(deploy_info, ResultHandle::new())
    }

    /// Stops accepting notices and drains the queue.
    pub fn close(&self) {
        self.async_sender.close();
    }

    pub fn is_closed(&self) -> bool {
        self.async_sender.is_closed()
    }

    pub fn has_workers(&self) -> bool {
        self.async_sender.has_workers()
    }

    /*
     * Stamps notifier identity and environment into the context, unless
     * the caller already set them.
     */
    fn prepare(&self, mut notice: Notice) -> Result<Notice, DeliveryError> {
        if self.config.ignored_environment() {
            let environment = self.config.environment.clone().unwrap_or_default();
            return Err(DeliveryError::EnvironmentIgnored(environment));
        }

        notice.context.entry("notifier").or_insert_with(|| {
            json!({
                "name": NOTIFIER_NAME,
                "version": NOTIFIER_VERSION,
            })
        });

        if let Some(environment) = &self.config.environment {
            notice
                .context
                .entry("environment")
                .or_insert_with(|| Value::String(environment.clone()));
        }

        Ok(notice)
    }
}
