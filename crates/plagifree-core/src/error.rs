use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlagiError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    /// Neither the daily quota nor purchased credits can cover another rewrite.
    #[error("{0}")]
    QuotaExceeded(String),

    /// A collaborator (rewriting engine, payment provider) failed or timed out.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A valid token names an account that no longer exists.
    #[error("User not found")]
    AccountNotFound,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type PlagiResult<T> = Result<T, PlagiError>;
