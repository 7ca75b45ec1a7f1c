use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use plagifree_core::{
    AccountStore, HistoryRecord, HistoryStore, PlagiError, PlagiResult, RewriteEngine,
    RewriteMode, RewriteTone,
};
use serde::Serialize;

use crate::diff::{SentenceChange, changed_sentences};
use crate::ledger::{Ledger, QUOTA_EXCEEDED_MESSAGE};
use crate::prompts::InstructionTable;
use crate::similarity::uniqueness_score;

/// Outcome of one successful rewrite, as returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteResult {
    pub id: String,
    pub rewritten_text: String,
    pub original_word_count: i64,
    pub rewritten_word_count: i64,
    pub mode: RewriteMode,
    pub tone: RewriteTone,
    pub uniqueness_score: f64,
    pub changed_sentences: Vec<SentenceChange>,
    pub timestamp: DateTime<Utc>,
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

pub struct RewriteService<A: AccountStore, H: HistoryStore> {
    accounts: Arc<A>,
    history: Arc<H>,
    engine: Arc<dyn RewriteEngine>,
    instructions: Arc<InstructionTable>,
    ledger: Ledger,
    timeout: Duration,
}

impl<A: AccountStore, H: HistoryStore> RewriteService<A, H> {
    pub fn new(
        accounts: Arc<A>,
        history: Arc<H>,
        engine: Arc<dyn RewriteEngine>,
        instructions: Arc<InstructionTable>,
        ledger: Ledger,
        timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            history,
            engine,
            instructions,
            ledger,
            timeout,
        }
    }

    /// Rewrite `text` for `account_id` and charge one rewrite to the account.
    ///
    /// Arguments are validated before anything else. The entitlement check
    /// runs before the engine is called; the charge is taken together with
    /// the history write after the engine has answered. If the engine fails,
    /// times out or returns nothing, no history is written and nothing is
    /// charged.
    pub async fn submit_rewrite(
        &self,
        account_id: &str,
        text: &str,
        mode: &str,
        tone: &str,
    ) -> PlagiResult<RewriteResult> {
        let mode: RewriteMode = mode.parse()?;
        let tone: RewriteTone = tone.parse()?;
        if text.trim().is_empty() {
            return Err(PlagiError::InvalidRequest(
                "Text to rewrite must not be empty".to_string(),
            ));
        }

        let account = self
            .accounts
            .get_account_by_id(account_id)
            .await?
            .ok_or(PlagiError::AccountNotFound)?;
        let account = self.ledger.refresh(self.accounts.as_ref(), account).await?;
        Ledger::ensure_available(&account)?;

        let original_word_count = word_count(text);
        let system_instructions = self.instructions.system_instructions(mode, tone);
        let rewritten_text = self.call_engine(text, &system_instructions).await?;
        let rewritten_word_count = word_count(&rewritten_text);

        let score = uniqueness_score(text, &rewritten_text);
        let changes = changed_sentences(text, &rewritten_text);

        let record = HistoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account.id.clone(),
            original_text: text.to_string(),
            rewritten_text,
            mode,
            tone,
            original_word_count,
            rewritten_word_count,
            uniqueness_score: score,
            created_at: Utc::now(),
        };

        let Some(bucket) = self.history.record_rewrite(&record).await? else {
            tracing::info!(account_id = %account.id, "rewrite refused: allowance spent concurrently");
            return Err(PlagiError::QuotaExceeded(QUOTA_EXCEEDED_MESSAGE.to_string()));
        };

        tracing::info!(
            account_id = %account.id,
            history_id = %record.id,
            %mode,
            %tone,
            charged = ?bucket,
            uniqueness = score,
            "rewrite completed"
        );

        Ok(RewriteResult {
            id: record.id,
            rewritten_text: record.rewritten_text,
            original_word_count,
            rewritten_word_count,
            mode,
            tone,
            uniqueness_score: score,
            changed_sentences: changes,
            timestamp: record.created_at,
        })
    }

    async fn call_engine(&self, text: &str, system_instructions: &str) -> PlagiResult<String> {
        let response = tokio::time::timeout(
            self.timeout,
            self.engine.rewrite(text, system_instructions),
        )
        .await
        .map_err(|_| {
            tracing::error!(timeout_secs = self.timeout.as_secs(), "rewriting engine timed out");
            PlagiError::Upstream(format!(
                "rewriting engine timed out after {}s",
                self.timeout.as_secs()
            ))
        })?;

        let rewritten = match response {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!(error = %e, "rewriting engine failed");
                return Err(match e {
                    PlagiError::Upstream(_) => e,
                    other => PlagiError::Upstream(other.to_string()),
                });
            }
        };

        if rewritten.is_empty() {
            tracing::error!("rewriting engine returned an empty response");
            return Err(PlagiError::Upstream(
                "rewriting engine returned an empty response".to_string(),
            ));
        }
        Ok(rewritten)
    }
}
