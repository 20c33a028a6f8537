use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::notify::{ChangeEvent, Notifier};

/// Chat webhooks (Discord, Slack-compatible relays) cap message length.
const MAX_CONTENT_CHARS: usize = 2000;

/// Posts change reports as `{"content": ...}` JSON.
///
/// The request runs on its own task so a slow or unreachable endpoint never
/// holds up a check; its outcome is only logged.
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build webhook client")?;
        Ok(Self { client, url })
    }
}

pub fn build_payload(event: &ChangeEvent) -> Value {
    let mut content = format!("{}\n{}\n{}", event.headline(), event.url, event.report);
    if content.chars().count() > MAX_CONTENT_CHARS {
        content = content.chars().take(MAX_CONTENT_CHARS - 3).collect();
        content.push_str("...");
    }

    json!({ "content": content })
}

/// Deliver one payload and wait for the endpoint's answer.
pub async fn post_payload(client: &Client, url: &Url, payload: &Value) -> Result<()> {
    let response = client
        .post(url.clone())
        .json(payload)
        .send()
        .await
        .with_context(|| format!("Webhook request to {} failed", url))?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    bail!("webhook {} answered {}: {}", url, status, body.trim())
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, event: &ChangeEvent) -> Result<()> {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = build_payload(event);
        let page = event.url.clone();

        tokio::spawn(async move {
            match post_payload(&client, &url, &payload).await {
                Ok(()) => info!("Sent webhook notification for {}", page),
                Err(e) => error!("Webhook notification for {} failed: {:#}", page, e),
            }
        });

        Ok(())
    }
}
