pub mod billing;
pub mod diff;
pub mod ledger;
pub mod orchestrator;
pub mod prompts;
pub mod similarity;

pub use billing::{Billing, PaymentStatusReport, PurchaseOutcome, WebhookOutcome};
pub use diff::{SentenceChange, changed_sentences};
pub use ledger::{Ledger, UsageSummary};
pub use orchestrator::{RewriteResult, RewriteService, word_count};
pub use prompts::InstructionTable;
pub use similarity::uniqueness_score;
