pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::PlagiConfig;
pub use error::{PlagiError, PlagiResult};
pub use traits::{AccountStore, HistoryStore, Mailer, PaymentGateway, PaymentStore, RewriteEngine};
pub use types::{
    Account, CheckoutRequest, CheckoutSession, CreateAccountInput, DebitBucket, HistoryRecord,
    OwnerPayoutConfig, PaymentTransaction, RewriteMode, RewriteTone, Settlement,
    TransactionStatus, WebhookEvent, WebhookEventKind,
};
