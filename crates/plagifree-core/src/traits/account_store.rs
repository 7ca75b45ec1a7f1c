use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PlagiResult;
use crate::types::{Account, CreateAccountInput};

#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Insert a new account. The first account ever stored becomes the admin.
    ///
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_account(&self, input: &CreateAccountInput) -> PlagiResult<Account>;
    async fn get_account_by_id(&self, id: &str) -> PlagiResult<Option<Account>>;
    async fn get_account_by_email(&self, email: &str) -> PlagiResult<Option<Account>>;

    /// Zero `rewrites_today` and move `reset_date` to `next_reset`, but only if
    /// the stored `reset_date` still equals `observed_reset`.
    ///
    /// Returns `false` when another request already performed the reset.
    async fn reset_daily_usage(
        &self,
        id: &str,
        observed_reset: DateTime<Utc>,
        next_reset: DateTime<Utc>,
    ) -> PlagiResult<bool>;

    async fn set_email_verified(&self, id: &str) -> PlagiResult<()>;

    // Email token management
    async fn create_email_token(&self, purpose: &str, account_id: &str, token: &str)
        -> PlagiResult<()>;
    async fn get_email_token_by_token(
        &self,
        purpose: &str,
        token: &str,
    ) -> PlagiResult<Option<(String, DateTime<Utc>)>>;
    async fn delete_email_token(&self, purpose: &str, account_id: &str) -> PlagiResult<()>;
}
