pub mod auth;
pub mod email;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, JwtSecret};
pub use email::{LogMailer, SmtpMailer};
pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, Collaborators};
