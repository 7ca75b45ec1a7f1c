pub mod signature;
pub mod stripe;

pub use signature::{SIGNATURE_TOLERANCE_SECS, sign_payload, verify_signature};
pub use stripe::StripeGateway;
