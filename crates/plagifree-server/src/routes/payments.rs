use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use plagifree_core::config::CreditPackage;
use plagifree_core::traits::*;
use plagifree_core::PlagiError;
use plagifree_engine::{PaymentStatusReport, PurchaseOutcome, WebhookOutcome};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_packages<A, H, P>(
    State(state): State<AppState<A, H, P>>,
) -> Json<Vec<CreditPackage>>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    Json(state.billing.packages().to_vec())
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequestBody {
    pub package_id: String,
}

pub async fn checkout<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Json(body): Json<CheckoutRequestBody>,
) -> Result<Json<PurchaseOutcome>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let outcome = state
        .billing
        .purchase(&user.account_id, &body.package_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn payment_status<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<Json<PaymentStatusReport>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let report = state
        .billing
        .payment_status(&user.account_id, &session_id)
        .await?;
    Ok(Json(report))
}

pub async fn webhook<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PlagiError::Auth("Missing webhook signature".to_string()))?;

    let outcome = state.billing.handle_webhook(&body, signature).await?;
    if let WebhookOutcome::Closed(status) = &outcome {
        tracing::info!(%status, "checkout session closed by webhook");
    }
    Ok(Json(json!({ "received": true })))
}
