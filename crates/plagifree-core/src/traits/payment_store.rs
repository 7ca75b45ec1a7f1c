use async_trait::async_trait;

use crate::error::PlagiResult;
use crate::types::{OwnerPayoutConfig, PaymentTransaction, Settlement, TransactionStatus};

#[async_trait]
pub trait PaymentStore: Send + Sync + 'static {
    async fn create_transaction(&self, transaction: &PaymentTransaction) -> PlagiResult<()>;
    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> PlagiResult<Option<PaymentTransaction>>;

    /// Flip a pending transaction to paid and credit its account, atomically.
    ///
    /// Crediting happens only on the pending → paid transition, so repeated
    /// calls credit at most once. Fails with `NotFound` for unknown sessions.
    async fn settle_paid(&self, session_id: &str) -> PlagiResult<Settlement>;

    /// Close a pending transaction as expired or failed. Returns `false` if it
    /// was no longer pending.
    async fn close_transaction(
        &self,
        session_id: &str,
        status: TransactionStatus,
    ) -> PlagiResult<bool>;

    // Owner payout configuration (single row)
    async fn get_owner_payout(&self) -> PlagiResult<Option<OwnerPayoutConfig>>;
    async fn upsert_owner_payout(&self, config: &OwnerPayoutConfig) -> PlagiResult<()>;
}
