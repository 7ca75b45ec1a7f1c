use std::sync::Arc;
use std::time::Duration;

use plagifree_core::config::PlagiConfig;
use plagifree_core::traits::*;
use plagifree_core::{Account, PlagiError, PlagiResult};
use plagifree_engine::{Billing, InstructionTable, Ledger, RewriteService};

/// External services the API depends on.
pub struct Collaborators {
    pub engine: Arc<dyn RewriteEngine>,
    /// Checkout provider; purchases are unavailable without one.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub mailer: Arc<dyn Mailer>,
    pub instructions: InstructionTable,
}

#[derive(Clone)]
pub struct AppState<A, H, P>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    pub account_store: Arc<A>,
    pub history_store: Arc<H>,
    pub payment_store: Arc<P>,
    pub config: Arc<PlagiConfig>,
    pub ledger: Ledger,
    pub rewriter: Arc<RewriteService<A, H>>,
    pub billing: Arc<Billing<P>>,
    pub mailer: Arc<dyn Mailer>,
}

impl<A, H, P> AppState<A, H, P>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    pub fn new(
        config: PlagiConfig,
        account_store: A,
        history_store: H,
        payment_store: P,
        collaborators: Collaborators,
    ) -> PlagiResult<Self> {
        let ledger = Ledger::new(&config.ledger)?;
        let account_store = Arc::new(account_store);
        let history_store = Arc::new(history_store);
        let payment_store = Arc::new(payment_store);

        let rewriter = RewriteService::new(
            account_store.clone(),
            history_store.clone(),
            collaborators.engine,
            Arc::new(collaborators.instructions),
            ledger,
            Duration::from_secs(config.rewriter.timeout_secs),
        );

        let mut billing = Billing::new(payment_store.clone(), config.public_url.clone());
        if let (Some(payments), Some(gateway)) = (&config.payments, collaborators.gateway) {
            billing = billing.with_gateway(payments.clone(), gateway);
        }

        Ok(Self {
            account_store,
            history_store,
            payment_store,
            config: Arc::new(config),
            ledger,
            rewriter: Arc::new(rewriter),
            billing: Arc::new(billing),
            mailer: collaborators.mailer,
        })
    }

    /// Load the caller's account with the daily reset already applied.
    pub async fn current_account(&self, account_id: &str) -> PlagiResult<Account> {
        let account = self
            .account_store
            .get_account_by_id(account_id)
            .await?
            .ok_or(PlagiError::AccountNotFound)?;
        self.ledger.refresh(self.account_store.as_ref(), account).await
    }
}
