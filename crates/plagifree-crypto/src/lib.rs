pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{AccessTokenClaims, create_access_token, validate_access_token};
pub use password::{hash_password, verify_password};
pub use token::generate_email_token;
