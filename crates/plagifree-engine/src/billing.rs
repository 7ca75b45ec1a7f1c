//! Credit purchases: checkout session creation, status polling and provider
//! webhooks. Every path that observes a paid session funnels into
//! [`PaymentStore::settle_paid`], which credits at most once per session.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use plagifree_core::config::{CreditPackage, PaymentsConfig};
use plagifree_core::{
    CheckoutRequest, PaymentGateway, PaymentStore, PaymentTransaction, PlagiError, PlagiResult,
    Settlement, TransactionStatus, WebhookEventKind,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusReport {
    pub session_id: String,
    pub status: TransactionStatus,
    pub credits: i64,
    /// Credits were added by this call.
    pub credited: bool,
    /// Credits had already been added before this call.
    pub already_credited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Credited { account_id: String, credits: i64 },
    AlreadyCredited,
    Closed(TransactionStatus),
    Ignored,
}

struct Checkout {
    config: PaymentsConfig,
    gateway: Arc<dyn PaymentGateway>,
}

pub struct Billing<P: PaymentStore> {
    payments: Arc<P>,
    checkout: Option<Checkout>,
    public_url: String,
}

fn not_configured() -> PlagiError {
    PlagiError::Upstream("payments are not configured".to_string())
}

impl<P: PaymentStore> Billing<P> {
    /// Billing without a payment provider: packages are empty and purchases fail.
    pub fn new(payments: Arc<P>, public_url: impl Into<String>) -> Self {
        Self {
            payments,
            checkout: None,
            public_url: public_url.into(),
        }
    }

    pub fn with_gateway(mut self, config: PaymentsConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.checkout = Some(Checkout { config, gateway });
        self
    }

    pub fn packages(&self) -> &[CreditPackage] {
        self.checkout
            .as_ref()
            .map(|c| c.config.packages.as_slice())
            .unwrap_or_default()
    }

    /// Open a checkout session for `package_id` and record it as pending.
    pub async fn purchase(&self, account_id: &str, package_id: &str) -> PlagiResult<PurchaseOutcome> {
        let checkout = self.checkout.as_ref().ok_or_else(not_configured)?;
        let package = checkout.config.package(package_id).ok_or_else(|| {
            PlagiError::InvalidRequest(format!("Unknown credit package: {package_id}"))
        })?;

        let base = self.public_url.trim_end_matches('/');
        let success_url = checkout.config.success_url.clone().unwrap_or_else(|| {
            format!("{base}/payment/success?session_id={{CHECKOUT_SESSION_ID}}")
        });
        let cancel_url = checkout
            .config
            .cancel_url
            .clone()
            .unwrap_or_else(|| format!("{base}/pricing"));

        let metadata = BTreeMap::from([
            ("account_id".to_string(), account_id.to_string()),
            ("package_id".to_string(), package.id.clone()),
            ("credits".to_string(), package.credits.to_string()),
        ]);
        let request = CheckoutRequest {
            amount_cents: package.amount_cents,
            currency: checkout.config.currency.clone(),
            product_name: format!("PlagiFree {} ({} credits)", package.name, package.credits),
            metadata,
            success_url,
            cancel_url,
        };

        let session = checkout.gateway.create_checkout_session(&request).await?;

        let now = Utc::now();
        self.payments
            .create_transaction(&PaymentTransaction {
                id: uuid::Uuid::new_v4().to_string(),
                account_id: account_id.to_string(),
                session_id: session.session_id.clone(),
                package_id: package.id.clone(),
                credits: package.credits,
                amount_cents: package.amount_cents,
                currency: checkout.config.currency.clone(),
                status: TransactionStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            account_id,
            package_id = %package.id,
            session_id = %session.session_id,
            "checkout session created"
        );

        Ok(PurchaseOutcome {
            session_id: session.session_id,
            url: session.url,
        })
    }

    /// Report a session's status to its owner, settling it if the provider
    /// says it has been paid.
    pub async fn payment_status(
        &self,
        account_id: &str,
        session_id: &str,
    ) -> PlagiResult<PaymentStatusReport> {
        let tx = self
            .payments
            .get_transaction_by_session(session_id)
            .await?
            .filter(|tx| tx.account_id == account_id)
            .ok_or_else(|| PlagiError::NotFound("Transaction not found".to_string()))?;

        let report = |status, credited, already_credited| PaymentStatusReport {
            session_id: session_id.to_string(),
            status,
            credits: tx.credits,
            credited,
            already_credited,
        };

        match tx.status {
            TransactionStatus::Paid => return Ok(report(TransactionStatus::Paid, false, true)),
            status @ (TransactionStatus::Expired | TransactionStatus::Failed) => {
                return Ok(report(status, false, false));
            }
            TransactionStatus::Pending => {}
        }

        let checkout = self.checkout.as_ref().ok_or_else(not_configured)?;
        let remote = checkout.gateway.session_status(session_id).await?;

        match remote {
            TransactionStatus::Paid => Ok(match self.settle(session_id).await? {
                Settlement::Credited { .. } => report(TransactionStatus::Paid, true, false),
                Settlement::AlreadyCredited => report(TransactionStatus::Paid, false, true),
                Settlement::Closed(status) => report(status, false, false),
            }),
            TransactionStatus::Expired | TransactionStatus::Failed => {
                self.payments.close_transaction(session_id, remote).await?;
                let current = self
                    .payments
                    .get_transaction_by_session(session_id)
                    .await?
                    .map(|tx| tx.status)
                    .unwrap_or(remote);
                let already = current == TransactionStatus::Paid;
                Ok(report(current, false, already))
            }
            TransactionStatus::Pending => Ok(report(TransactionStatus::Pending, false, false)),
        }
    }

    /// Verify and apply a provider webhook.
    ///
    /// Events for sessions this service never created are acknowledged and
    /// ignored; rejecting them would only make the provider retry.
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> PlagiResult<WebhookOutcome> {
        let checkout = self.checkout.as_ref().ok_or_else(not_configured)?;
        let event = checkout.gateway.parse_webhook(payload, signature).map_err(|e| {
            tracing::warn!(error = %e, "rejected payment webhook");
            e
        })?;

        let Some(session_id) = event.session_id else {
            return Ok(WebhookOutcome::Ignored);
        };

        match event.kind {
            WebhookEventKind::CheckoutCompleted if event.status == TransactionStatus::Paid => {
                match self.settle(&session_id).await {
                    Ok(Settlement::Credited {
                        account_id,
                        credits,
                    }) => Ok(WebhookOutcome::Credited {
                        account_id,
                        credits,
                    }),
                    Ok(Settlement::AlreadyCredited) => Ok(WebhookOutcome::AlreadyCredited),
                    Ok(Settlement::Closed(status)) => Ok(WebhookOutcome::Closed(status)),
                    Err(PlagiError::NotFound(_)) => {
                        tracing::warn!(%session_id, "webhook for unknown checkout session");
                        Ok(WebhookOutcome::Ignored)
                    }
                    Err(e) => Err(e),
                }
            }
            WebhookEventKind::CheckoutExpired | WebhookEventKind::CheckoutFailed => {
                let status = match event.kind {
                    WebhookEventKind::CheckoutFailed => TransactionStatus::Failed,
                    _ => TransactionStatus::Expired,
                };
                if self.payments.close_transaction(&session_id, status).await? {
                    Ok(WebhookOutcome::Closed(status))
                } else {
                    Ok(WebhookOutcome::Ignored)
                }
            }
            _ => Ok(WebhookOutcome::Ignored),
        }
    }

    async fn settle(&self, session_id: &str) -> PlagiResult<Settlement> {
        let settlement = self.payments.settle_paid(session_id).await?;
        if let Settlement::Credited {
            account_id,
            credits,
        } = &settlement
        {
            tracing::info!(%account_id, credits, session_id, "credits added");
        }
        Ok(settlement)
    }
}
