//! Per-account rewrite entitlement: a daily quota that refreshes at local
//! midnight, plus a balance of purchased credits.
//!
//! The ledger only reads and resets. Debiting happens inside the storage
//! transaction that records the rewrite (see [`HistoryStore::record_rewrite`]),
//! so a check that passes here can still lose a race and be refused there.
//!
//! [`HistoryStore::record_rewrite`]: plagifree_core::HistoryStore::record_rewrite

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use plagifree_core::config::LedgerConfig;
use plagifree_core::{Account, AccountStore, PlagiError, PlagiResult};
use serde::Serialize;

pub const QUOTA_EXCEEDED_MESSAGE: &str = "Daily rewrite limit reached and no credits remaining";

#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    daily_limit: i64,
    offset: FixedOffset,
}

/// Snapshot of an account's entitlement as reported to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub daily_limit: i64,
    pub rewrites_today: i64,
    pub credits: i64,
    pub remaining: i64,
    pub reset_date: DateTime<Utc>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> PlagiResult<Self> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            PlagiError::InternalError(format!(
                "utc_offset_minutes out of range: {}",
                config.utc_offset_minutes
            ))
        })?;
        if config.daily_limit < 0 {
            return Err(PlagiError::InternalError(
                "daily_limit must not be negative".to_string(),
            ));
        }
        Ok(Self {
            daily_limit: config.daily_limit,
            offset,
        })
    }

    /// Quota granted to newly registered accounts.
    pub fn daily_limit(&self) -> i64 {
        self.daily_limit
    }

    /// The first local midnight strictly after `now`.
    pub fn next_reset_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let next_date = local_date.succ_opt().unwrap_or(NaiveDate::MAX);
        let local_midnight = next_date.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc_midnight)
    }

    /// Apply the reset rule, then return the account as currently stored.
    pub async fn refresh<A: AccountStore>(&self, store: &A, account: Account) -> PlagiResult<Account> {
        self.refresh_at(store, account, Utc::now()).await
    }

    /// [`Ledger::refresh`] against an explicit clock.
    ///
    /// Once `now` has reached `reset_date`, usage returns to zero and the next
    /// boundary is computed from `now`, so several missed days collapse into
    /// one reset. The write is a compare-and-set on the observed `reset_date`;
    /// whichever concurrent caller loses simply re-reads the winner's result.
    pub async fn refresh_at<A: AccountStore>(
        &self,
        store: &A,
        account: Account,
        now: DateTime<Utc>,
    ) -> PlagiResult<Account> {
        if now < account.reset_date {
            return Ok(account);
        }

        let next = self.next_reset_boundary(now);
        let applied = store
            .reset_daily_usage(&account.id, account.reset_date, next)
            .await?;
        if applied {
            tracing::debug!(account_id = %account.id, next_reset = %next, "daily usage reset");
        }

        store
            .get_account_by_id(&account.id)
            .await?
            .ok_or(PlagiError::AccountNotFound)
    }

    /// Remaining quota plus credits. Usage above a since-lowered limit does
    /// not eat into credits.
    pub fn available(account: &Account) -> i64 {
        (account.daily_limit - account.rewrites_today).max(0) + account.credits
    }

    pub fn ensure_available(account: &Account) -> PlagiResult<()> {
        if Self::available(account) > 0 {
            Ok(())
        } else {
            Err(PlagiError::QuotaExceeded(QUOTA_EXCEEDED_MESSAGE.to_string()))
        }
    }

    pub fn usage(account: &Account) -> UsageSummary {
        UsageSummary {
            daily_limit: account.daily_limit,
            rewrites_today: account.rewrites_today,
            credits: account.credits,
            remaining: Self::available(account),
            reset_date: account.reset_date,
        }
    }
}
