use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PlagiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Base URL of the web frontend, used for links in emails and as the
    /// default checkout return target.
    pub public_url: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    pub rewriter: RewriterConfig,
    /// Stripe checkout settings. Purchases are unavailable when absent.
    #[serde(default)]
    pub payments: Option<PaymentsConfig>,
    /// SMTP relay. Mail is only logged when absent.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Rewrites granted per reset period to newly registered accounts.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: i64,
    /// Offset from UTC of the midnight at which daily quotas refresh.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriterConfig {
    /// Base URL of an OpenAI-compatible API, e.g. "https://api.openai.com/v1".
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// TOML file overriding entries of the built-in mode/tone instruction table.
    #[serde(default)]
    pub instructions_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_payments_api_base")]
    pub api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
    #[serde(default = "default_packages")]
    pub packages: Vec<CreditPackage>,
}

impl PaymentsConfig {
    pub fn package(&self, id: &str) -> Option<&CreditPackage> {
        self.packages.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct CreditPackage {
    pub id: String,
    pub name: String,
    pub credits: i64,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_expiration_hours() -> i64 {
    168
}

fn default_daily_limit() -> i64 {
    10
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_payments_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_packages() -> Vec<CreditPackage> {
    vec![
        CreditPackage {
            id: "starter".to_string(),
            name: "Starter".to_string(),
            credits: 10,
            amount_cents: 499,
        },
        CreditPackage {
            id: "standard".to_string(),
            name: "Standard".to_string(),
            credits: 50,
            amount_cents: 1999,
        },
        CreditPackage {
            id: "pro".to_string(),
            name: "Pro".to_string(),
            credits: 150,
            amount_cents: 4999,
        },
    ]
}

impl PlagiConfig {
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PLAGIFREE_").split("__"))
            .extract()
    }
}
