use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{Level, warn};
use url::Url;

use super::config::ServiceContext;

const ALERT_QUEUE_CAPACITY: usize = 256;
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Clone, Debug)]
pub(crate) struct AlertEvent {
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) span_path: Vec<String>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, context: &ServiceContext, event: &AlertEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Posts `{"content": "..."}` to a chat webhook (Discord and Slack style).
pub(crate) struct WebhookAlertSink {
    webhook_url: Url,
    client: reqwest::Client,
}

impl WebhookAlertSink {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, context: &ServiceContext, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": render_alert(context, event) }))
            .send()
            .await
            // reqwest errors embed the URL; keep it out of the logs.
            .map_err(|err| anyhow!("alert webhook request failed (timeout: {})", err.is_timeout()))?;

        if !response.status().is_success() {
            return Err(anyhow!("alert webhook returned {}", response.status()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

pub(crate) fn render_alert(context: &ServiceContext, event: &AlertEvent) -> String {
    let mut lines = vec![
        format!(
            "**{}** `{}` `{}` `{}`",
            context.service_name,
            context.environment,
            context.component,
            event.level
        ),
        format!(
            "`{}` `{}`{}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event.target,
            event
                .location
                .as_ref()
                .map(|location| format!(" `{location}`"))
                .unwrap_or_default()
        ),
    ];

    if let Some(message) = event.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        lines.push(format!("> {message}"));
    }
    if !event.span_path.is_empty() {
        lines.push(format!("spans: `{}`", event.span_path.join(" > ")));
    }
    for (key, value) in &event.fields {
        lines.push(format!("- `{key}` = `{value}`"));
    }

    truncate(lines.join("\n"))
}

fn truncate(content: String) -> String {
    const SUFFIX: &str = "\n… (truncated)";
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content;
    }
    let keep = MAX_CONTENT_CHARS - SUFFIX.chars().count();
    let mut truncated: String = content.chars().take(keep).collect();
    truncated.push_str(SUFFIX);
    truncated
}

/// Hands events to a background task so logging never waits on the network.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(context: ServiceContext, sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(ALERT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for sink in &sinks {
                    if let Err(err) = sink.deliver(&context, &event).await {
                        warn!(sink = sink.name(), error = %err, "alerts: delivery failed");
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn dispatch(&self, event: AlertEvent) {
        if let Err(err) = self.tx.try_send(event) {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            };
            warn!(reason, "alerts: dropping event");
        }
    }
}
