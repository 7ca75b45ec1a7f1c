use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlagiError;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub daily_limit: i64,
    pub rewrites_today: i64,
    pub credits: i64,
    /// Instant at which `rewrites_today` next returns to zero.
    pub reset_date: DateTime<Utc>,
    pub email_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub daily_limit: i64,
    pub reset_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteMode {
    Light,
    Standard,
    Aggressive,
    HumanLike,
}

impl RewriteMode {
    pub const ALL: [RewriteMode; 4] = [
        RewriteMode::Light,
        RewriteMode::Standard,
        RewriteMode::Aggressive,
        RewriteMode::HumanLike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Light => "light",
            RewriteMode::Standard => "standard",
            RewriteMode::Aggressive => "aggressive",
            RewriteMode::HumanLike => "human-like",
        }
    }
}

impl fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewriteMode {
    type Err = PlagiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                PlagiError::InvalidRequest(format!(
                    "Invalid mode. Choose from: {}",
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteTone {
    Academic,
    Professional,
    Casual,
    Creative,
    Formal,
}

impl RewriteTone {
    pub const ALL: [RewriteTone; 5] = [
        RewriteTone::Academic,
        RewriteTone::Professional,
        RewriteTone::Casual,
        RewriteTone::Creative,
        RewriteTone::Formal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteTone::Academic => "academic",
            RewriteTone::Professional => "professional",
            RewriteTone::Casual => "casual",
            RewriteTone::Creative => "creative",
            RewriteTone::Formal => "formal",
        }
    }
}

impl fmt::Display for RewriteTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewriteTone {
    type Err = PlagiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                PlagiError::InvalidRequest(format!(
                    "Invalid tone. Choose from: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// An immutable record of one successful rewrite.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: String,
    pub account_id: String,
    pub original_text: String,
    pub rewritten_text: String,
    pub mode: RewriteMode,
    pub tone: RewriteTone,
    pub original_word_count: i64,
    pub rewritten_word_count: i64,
    pub uniqueness_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Which allowance paid for a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebitBucket {
    Quota,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Expired,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Expired => "expired",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = PlagiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "expired" => Ok(TransactionStatus::Expired),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(PlagiError::Storage(format!(
                "unknown transaction status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentTransaction {
    pub id: String,
    pub account_id: String,
    pub session_id: String,
    pub package_id: String,
    pub credits: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of settling a transaction as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The transaction moved from pending to paid and the account was credited.
    Credited { account_id: String, credits: i64 },
    /// The transaction was already paid; nothing changed.
    AlreadyCredited,
    /// The transaction had already closed as expired or failed.
    Closed(TransactionStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerPayoutConfig {
    pub payout_email: String,
    pub business_name: String,
    pub stripe_account_id: Option<String>,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub product_name: String,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    CheckoutCompleted,
    CheckoutExpired,
    /// A delayed payment method was declined after the session completed.
    CheckoutFailed,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub kind: WebhookEventKind,
    pub session_id: Option<String>,
    pub status: TransactionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_parse_from_wire_names() {
        assert_eq!("light".parse::<RewriteMode>().unwrap(), RewriteMode::Light);
        assert_eq!(
            "human-like".parse::<RewriteMode>().unwrap(),
            RewriteMode::HumanLike
        );
    }

    #[test]
    fn invalid_mode_names_allowed_set() {
        let err = "extreme".parse::<RewriteMode>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid mode. Choose from: light, standard, aggressive, human-like"
        );
    }

    #[test]
    fn invalid_tone_names_allowed_set() {
        let err = "Academic".parse::<RewriteTone>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid tone. Choose from: academic, professional, casual, creative, formal"
        );
    }

    #[test]
    fn serde_names_match_display() {
        for mode in RewriteMode::ALL {
            let json = serde_json::to_value(mode).unwrap();
            assert_eq!(json, mode.as_str());
        }
        for tone in RewriteTone::ALL {
            let json = serde_json::to_value(tone).unwrap();
            assert_eq!(json, tone.as_str());
        }
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Paid.is_terminal());
        assert!(TransactionStatus::Expired.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }
}
