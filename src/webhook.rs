use std::time::Duration;

use tracing::debug;

use crate::error::{WatchError, WatchResult};
use crate::render::WebhookPayload;

/// Delivers a rendered message somewhere.
pub trait Notifier {
    fn deliver(&self, url: &str, payload: &WebhookPayload) -> WatchResult<()>;
}

/// Posts payloads to a Discord-compatible webhook.
pub struct WebhookClient {
    agent: ureq::Agent,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for WebhookClient {
    fn deliver(&self, url: &str, payload: &WebhookPayload) -> WatchResult<()> {
        let body = serde_json::to_value(payload)?;
        debug!(embeds = payload.embeds.len(), "posting to webhook");

        self.agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    WatchError::Network(format!(
                        "Webhook rejected message (HTTP {}): {}",
                        code,
                        body.chars().take(200).collect::<String>()
                    ))
                }
                ureq::Error::Transport(t) => WatchError::Network(format!("Could not reach webhook: {}", t)),
            })?;
        Ok(())
    }
}
