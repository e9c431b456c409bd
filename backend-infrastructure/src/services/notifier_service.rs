// Webhook notifier
// Optional adapter that drains pending dispatch intents and POSTs them to a
// configured webhook, acknowledging each with the delivery outcome.
// Fire-and-forget: a failed delivery is recorded, never retried here (the
// queue keeps at-least-once semantics for external notifiers).

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::warn;

use backend_application::AppState;
use backend_domain::ports::DispatchQueue;
use backend_domain::{DispatchIntent, DispatchOutcome, RuntimeConfig};

const DEFAULT_TEMPLATE: &str =
    r#"{"intent_id":"{intent_id}","alert_id":"{alert_id}","donor_id":"{donor_id}","channels":"{channels}"}"#;

pub struct WebhookNotifier {
    client: Client,
    url: String,
    template: Option<String>,
}

impl WebhookNotifier {
    /// Built only when a webhook url is configured.
    pub fn from_config(config: &RuntimeConfig) -> Option<Result<Self>> {
        let url = config.notifier_webhook_url.clone()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
            .build();
        Some(
            client
                .map(|client| Self {
                    client,
                    url,
                    template: config.notifier_webhook_template.clone(),
                })
                .map_err(anyhow::Error::from),
        )
    }

    pub async fn deliver_pending(&self, state: &AppState) {
        let pending = match state.dispatch.pending().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!("could not read pending dispatch intents: {err:#}");
                return;
            }
        };

        for intent in pending {
            let outcome = if intent.channels.is_empty() {
                DispatchOutcome::Skipped
            } else {
                match self.post(&intent).await {
                    Ok(()) => DispatchOutcome::Delivered,
                    Err(err) => {
                        warn!(intent_id = %intent.id, "webhook delivery failed: {err:#}");
                        DispatchOutcome::Failed
                    }
                }
            };

            match state.dispatch.acknowledge(intent.id, outcome).await {
                Ok(Some(ack)) if !ack.duplicate => state.metrics.record_dispatch_ack(),
                Ok(_) => {}
                Err(err) => warn!(intent_id = %intent.id, "acknowledge failed: {err:#}"),
            }
        }
    }

    async fn post(&self, intent: &DispatchIntent) -> Result<()> {
        let channels = intent
            .channels
            .iter()
            .map(|channel| channel.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let payload = self
            .template
            .as_deref()
            .unwrap_or(DEFAULT_TEMPLATE)
            .replace("{intent_id}", &intent.id.to_string())
            .replace("{alert_id}", &intent.alert_id.to_string())
            .replace("{donor_id}", &intent.donor_id.to_string())
            .replace("{channels}", &channels);

        self.client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
