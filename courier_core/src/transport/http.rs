/*!
 * Blocking HTTP delegate sender.
 *
 * Uses `ureq`: a pure-Rust blocking HTTP client with no async runtime.
 * Every caller of `SyncSender` is either a pool worker or a thread that
 * explicitly asked for a synchronous send, so blocking I/O is fine here.
 *
 * Outcome mapping:
 * - 2xx → resolve with the parsed JSON body (`null` when empty)
 * - 2xx with a body that is not JSON → reject `InvalidResponse`
 * - any other status → reject `Http { status, body }`
 * - no response at all → reject `Transport`
 *
 * Single attempt, no retries.
 */

use serde::Serialize;
use serde_json::Value;
use ureq::Agent;

use super::Sender;
use crate::config::Config;
use crate::error::DeliveryError;
use crate::promise::ResultHandle;

/**
 * Thin wrapper around `ureq::Agent`.
 *
 * One instance is shared by all pool workers; the agent handles connection
 * pooling and keep-alive internally.
 */
pub struct SyncSender {
    agent: Agent,

    /// Sent as `Authorization: Bearer <key>` when present.
    project_key: Option<String>,
}

impl SyncSender {
    /// Builds an agent whose global timeout is `config.timeout`.
    pub fn new(config: &Config) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            project_key: config.project_key.clone(),
        }
    }

    fn post<P: Serialize>(&self, payload: &P, endpoint: &str) -> Result<Value, DeliveryError> {
        let mut request = self.agent.post(endpoint);
        if let Some(key) = &self.project_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send_json(payload)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .unwrap_or_else(|_| "<unreadable body>".into());

        if !(200..300).contains(&status) {
            tracing::warn!(endpoint, status, %body, "collector rejected payload");
            return Err(DeliveryError::Http { status, body });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|err| DeliveryError::InvalidResponse(err.to_string()))
    }
}

impl<P: Serialize> Sender<P> for SyncSender {
    /*
     * Every failure is settled on the handle here, so this never returns
     * `Err` to the worker loop.
     */
    fn send(&self, payload: &P, handle: &ResultHandle, endpoint: &str) -> Result<(), DeliveryError> {
        match self.post(payload, endpoint) {
            Ok(value) => handle.resolve(value),
            Err(err) => handle.reject(err),
        };
        Ok(())
    }
}
