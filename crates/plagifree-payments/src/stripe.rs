use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use plagifree_core::config::PaymentsConfig;
use plagifree_core::{
    CheckoutRequest, CheckoutSession, PaymentGateway, PlagiError, PlagiResult, TransactionStatus,
    WebhookEvent, WebhookEventKind,
};
use serde::Deserialize;

use crate::signature::verify_signature;

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentsConfig) -> PlagiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlagiError::InternalError(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    async fn read_session(resp: reqwest::Response) -> PlagiResult<SessionObject> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            tracing::warn!(%status, "stripe request failed");
            return Err(PlagiError::Upstream(format!("payment provider returned {status}: {message}")));
        }
        resp.json()
            .await
            .map_err(|e| PlagiError::Upstream(format!("malformed payment provider response: {e}")))
    }
}

/// Form fields for a one-item, one-time-payment checkout session.
fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
    ];
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form
}

fn session_state(status: Option<&str>, payment_status: Option<&str>) -> TransactionStatus {
    match (status, payment_status) {
        (_, Some("paid" | "no_payment_required")) => TransactionStatus::Paid,
        (Some("expired"), _) => TransactionStatus::Expired,
        _ => TransactionStatus::Pending,
    }
}

/// Decode a verified event body.
fn decode_event(payload: &[u8]) -> PlagiResult<WebhookEvent> {
    let envelope: EventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| PlagiError::InvalidRequest(format!("malformed webhook payload: {e}")))?;

    let object = envelope.data.object;
    let session_id = object.get("id").and_then(|v| v.as_str()).map(str::to_string);
    let status = session_state(
        object.get("status").and_then(|v| v.as_str()),
        object.get("payment_status").and_then(|v| v.as_str()),
    );

    let kind = match envelope.kind.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            WebhookEventKind::CheckoutCompleted
        }
        "checkout.session.expired" => WebhookEventKind::CheckoutExpired,
        "checkout.session.async_payment_failed" => WebhookEventKind::CheckoutFailed,
        _ => WebhookEventKind::Other(envelope.kind),
    };
    // The session object still says "unpaid"; the event itself is the verdict.
    let status = match kind {
        WebhookEventKind::CheckoutFailed => TransactionStatus::Failed,
        _ => status,
    };

    Ok(WebhookEvent {
        kind,
        session_id,
        status,
    })
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> PlagiResult<CheckoutSession> {
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|e| PlagiError::Upstream(format!("payment provider unreachable: {e}")))?;

        let session = Self::read_session(resp).await?;
        let url = session.url.ok_or_else(|| {
            PlagiError::Upstream("checkout session has no redirect url".to_string())
        })?;
        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    async fn session_status(&self, session_id: &str) -> PlagiResult<TransactionStatus> {
        let resp = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PlagiError::Upstream(format!("payment provider unreachable: {e}")))?;

        let session = Self::read_session(resp).await?;
        Ok(session_state(
            session.status.as_deref(),
            session.payment_status.as_deref(),
        ))
    }

    fn parse_webhook(&self, payload: &[u8], signature: &str) -> PlagiResult<WebhookEvent> {
        verify_signature(&self.webhook_secret, payload, signature, Utc::now().timestamp())?;
        decode_event(payload)
    }
}
