use axum::Json;
use axum::extract::State;
use chrono::Utc;
use plagifree_core::traits::*;
use plagifree_core::{OwnerPayoutConfig, PlagiError};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::routes::auth::parse_email;
use crate::state::AppState;

async fn require_admin<A, H, P>(state: &AppState<A, H, P>, user: &AuthenticatedUser) -> Result<(), ApiError>
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
    if !account.is_admin {
        return Err(PlagiError::Forbidden("Admin access required".to_string()).into());
    }
    Ok(())
}

pub async fn get_owner_payout<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    require_admin(&state, &user).await?;
    let payout = state.payment_store.get_owner_payout().await?;
    Ok(Json(json!({
        "configured": payout.is_some(),
        "payout": payout,
    })))
}

#[derive(Debug, Deserialize)]
pub struct OwnerPayoutRequest {
    pub payout_email: String,
    pub business_name: String,
    #[serde(default)]
    pub stripe_account_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

pub async fn configure_owner_payout<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Json(body): Json<OwnerPayoutRequest>,
) -> Result<Json<OwnerPayoutConfig>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    require_admin(&state, &user).await?;

    let payout_email = parse_email(&body.payout_email)?;
    let business_name = body.business_name.trim().to_string();
    if business_name.is_empty() {
        return Err(ApiError::invalid_request("Business name must not be empty"));
    }
    let currency = body
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("usd")
        .to_lowercase();
    let stripe_account_id = body
        .stripe_account_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let config = OwnerPayoutConfig {
        payout_email,
        business_name,
        stripe_account_id,
        currency,
        updated_at: Utc::now(),
    };
    state.payment_store.upsert_owner_payout(&config).await?;
    tracing::info!(account_id = %user.account_id, "owner payout configuration updated");

    Ok(Json(config))
}
