//! In-process stand-ins for the rewriting engine, checkout provider and mail
//! relay.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use plagifree_core::{
    CheckoutRequest, CheckoutSession, Mailer, PaymentGateway, PlagiError, PlagiResult,
    RewriteEngine, TransactionStatus, WebhookEvent, WebhookEventKind,
};

/// Signature accepted by [`StubGateway::parse_webhook`].
pub const STUB_SIGNATURE: &str = "stub-signature";

/// Rewriting engine returning a fixed reply, or failing when told to.
pub struct StubEngine {
    reply: Mutex<PlagiResult<String>>,
    calls: AtomicUsize,
}

impl StubEngine {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(reply.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Ok(reply.to_string());
    }

    pub fn fail_with(&self, message: &str) {
        *self.reply.lock().unwrap() = Err(PlagiError::Upstream(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RewriteEngine for StubEngine {
    async fn rewrite(&self, _text: &str, _system_instructions: &str) -> PlagiResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.reply.lock().unwrap() {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(PlagiError::Upstream(e.to_string())),
        }
    }
}

/// Checkout provider keeping sessions in memory.
///
/// Webhooks are JSON `{ "type", "session_id" }` and must carry
/// [`STUB_SIGNATURE`].
#[derive(Default)]
pub struct StubGateway {
    sessions: Mutex<HashMap<String, TransactionStatus>>,
    requests: Mutex<Vec<CheckoutRequest>>,
    status_queries: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what the provider reports for `session_id`.
    pub fn set_status(&self, session_id: &str, status: TransactionStatus) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), status);
    }

    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> PlagiResult<CheckoutSession> {
        let mut requests = self.requests.lock().unwrap();
        let session_id = format!("cs_test_{}", requests.len() + 1);
        requests.push(request.clone());
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), TransactionStatus::Pending);

        Ok(CheckoutSession {
            url: format!("https://checkout.test/pay/{session_id}"),
            session_id,
        })
    }

    async fn session_status(&self, session_id: &str) -> PlagiResult<TransactionStatus> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .copied()
            .ok_or_else(|| PlagiError::Upstream(format!("no such session: {session_id}")))
    }

    fn parse_webhook(&self, payload: &[u8], signature: &str) -> PlagiResult<WebhookEvent> {
        if signature != STUB_SIGNATURE {
            return Err(PlagiError::Auth("Invalid webhook signature".to_string()));
        }
        let body: Value = serde_json::from_slice(payload)
            .map_err(|e| PlagiError::InvalidRequest(format!("Invalid webhook payload: {e}")))?;

        let session_id = body["session_id"].as_str().map(str::to_string);
        let (kind, status) = match body["type"].as_str() {
            Some("checkout.session.completed") => {
                (WebhookEventKind::CheckoutCompleted, TransactionStatus::Paid)
            }
            Some("checkout.session.expired") => {
                (WebhookEventKind::CheckoutExpired, TransactionStatus::Expired)
            }
            Some("checkout.session.async_payment_failed") => {
                (WebhookEventKind::CheckoutFailed, TransactionStatus::Failed)
            }
            other => (
                WebhookEventKind::Other(other.unwrap_or_default().to_string()),
                TransactionStatus::Pending,
            ),
        };
        Ok(WebhookEvent {
            kind,
            session_id,
            status,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mailer that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Pull the verification token out of the last verification email sent to `to`.
    pub fn verification_token(&self, to: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .filter(|m| m.to == to)
            .find_map(|m| {
                let start = m.html.find("token=")? + "token=".len();
                let rest = &m.html[start..];
                let end = rest.find('"').unwrap_or(rest.len());
                Some(rest[..end].to_string())
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> bool {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        true
    }
}
