use async_trait::async_trait;

use crate::error::PlagiResult;
use crate::types::{CheckoutRequest, CheckoutSession, TransactionStatus, WebhookEvent};

/// External text rewriting service (an LLM behind an HTTP API).
#[async_trait]
pub trait RewriteEngine: Send + Sync + 'static {
    async fn rewrite(&self, text: &str, system_instructions: &str) -> PlagiResult<String>;
}

/// External checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_checkout_session(&self, request: &CheckoutRequest)
        -> PlagiResult<CheckoutSession>;

    async fn session_status(&self, session_id: &str) -> PlagiResult<TransactionStatus>;

    /// Verify the provider signature and decode an inbound webhook.
    fn parse_webhook(&self, payload: &[u8], signature: &str) -> PlagiResult<WebhookEvent>;
}

/// Outbound mail. Best-effort: implementations log failures and never block
/// the caller's primary operation.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool;
}
