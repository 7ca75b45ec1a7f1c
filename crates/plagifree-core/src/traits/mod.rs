pub mod account_store;
pub mod collaborators;
pub mod history_store;
pub mod payment_store;

pub use account_store::AccountStore;
pub use collaborators::{Mailer, PaymentGateway, RewriteEngine};
pub use history_store::HistoryStore;
pub use payment_store::PaymentStore;
