use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Duration, Utc};
use plagifree_core::traits::*;
use plagifree_core::{Account, CreateAccountInput, PlagiError, PlagiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::email::{owner_setup_email, verification_email};
use crate::error::ApiError;
use crate::state::AppState;

const CONFIRM_EMAIL: &str = "confirm_email";
const VERIFICATION_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub daily_limit: i64,
    pub rewrites_today: i64,
    pub credits: i64,
    pub reset_date: DateTime<Utc>,
    pub email_verified: bool,
    pub is_admin: bool,
}

impl From<&Account> for Profile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            daily_limit: account.daily_limit,
            rewrites_today: account.rewrites_today,
            credits: account.credits,
            reset_date: account.reset_date,
            email_verified: account.email_verified,
            is_admin: account.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Validate an email address the way outbound mail will parse it.
pub(crate) fn parse_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim();
    email
        .parse::<lettre::Address>()
        .map(|_| email.to_string())
        .map_err(|_| ApiError::invalid_request("Invalid email address"))
}

fn issue_token<A, H, P>(state: &AppState<A, H, P>, account: &Account) -> Result<String, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    Ok(plagifree_crypto::create_access_token(
        &account.id,
        &state.config.jwt.secret,
        state.config.jwt.expiration_hours,
    )?)
}

async fn send_verification<A, H, P>(state: &AppState<A, H, P>, account: &Account) -> PlagiResult<()>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let token = plagifree_crypto::generate_email_token();
    state
        .account_store
        .create_email_token(CONFIRM_EMAIL, &account.id, &token)
        .await?;

    let (subject, html) = verification_email(&state.config.public_url, &token);
    if !state.mailer.send(&account.email, &subject, &html).await {
        tracing::warn!(account_id = %account.id, "verification email not delivered");
    }
    Ok(())
}

// ── register ────────────────────────────────────────────────────────────

pub async fn register<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let email = parse_email(&body.email)?;
    if body.password.is_empty() {
        return Err(ApiError::invalid_request("Password must not be empty"));
    }

    let password_hash = plagifree_crypto::hash_password(&body.password)?;
    let input = CreateAccountInput {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash,
        daily_limit: state.ledger.daily_limit(),
        reset_date: state.ledger.next_reset_boundary(Utc::now()),
    };
    let account = state.account_store.create_account(&input).await?;
    tracing::info!(account_id = %account.id, is_admin = account.is_admin, "account created");

    // The account already exists; a missing token only costs a resend.
    if let Err(e) = send_verification(&state, &account).await {
        tracing::warn!(account_id = %account.id, error = %e, "verification token not stored");
    }
    if account.is_admin {
        let (subject, html) = owner_setup_email(&state.config.public_url);
        if !state.mailer.send(&account.email, &subject, &html).await {
            tracing::warn!(account_id = %account.id, "owner setup reminder not delivered");
        }
    }

    let token = issue_token(&state, &account)?;
    Ok(Json(TokenResponse {
        token,
        user: Profile::from(&account),
    }))
}

// ── login ───────────────────────────────────────────────────────────────

pub async fn login<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let account = state
        .account_store
        .get_account_by_email(body.email.trim())
        .await?
        .ok_or(PlagiError::InvalidCredentials)?;

    if !plagifree_crypto::verify_password(&body.password, &account.password_hash)? {
        return Err(PlagiError::InvalidCredentials.into());
    }

    let account = state.ledger.refresh(state.account_store.as_ref(), account).await?;
    let token = issue_token(&state, &account)?;
    Ok(Json(TokenResponse {
        token,
        user: Profile::from(&account),
    }))
}

pub async fn me<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
) -> Result<Json<Profile>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let account = state.current_account(&user.account_id).await?;
    Ok(Json(Profile::from(&account)))
}

// ── email verification ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

pub async fn verify_email<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let invalid = || ApiError::invalid_request("Invalid or expired verification token");

    let (account_id, requested_at) = state
        .account_store
        .get_email_token_by_token(CONFIRM_EMAIL, &body.token)
        .await?
        .ok_or_else(invalid)?;

    if Utc::now() - requested_at > Duration::hours(VERIFICATION_TTL_HOURS) {
        state
            .account_store
            .delete_email_token(CONFIRM_EMAIL, &account_id)
            .await?;
        return Err(invalid());
    }

    state.account_store.set_email_verified(&account_id).await?;
    state
        .account_store
        .delete_email_token(CONFIRM_EMAIL, &account_id)
        .await?;
    tracing::info!(%account_id, "email verified");

    Ok(Json(json!({ "message": "Email verified successfully" })))
}

pub async fn resend_verification<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let account = state
        .account_store
        .get_account_by_id(&user.account_id)
        .await?
        .ok_or(PlagiError::AccountNotFound)?;
    if account.email_verified {
        return Err(ApiError::invalid_request("Email already verified"));
    }

    send_verification(&state, &account).await?;
    Ok(Json(json!({ "message": "Verification email sent" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_parsing_trims_and_validates() {
        assert_eq!(parse_email("  a@b.test ").unwrap(), "a@b.test");
        assert!(parse_email("not-an-email").is_err());
        assert!(parse_email("").is_err());
    }
}
