use axum::Json;
use axum::extract::State;
use plagifree_core::traits::*;
use plagifree_engine::RewriteResult;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RewriteRequest {
    pub text: String,
    pub mode: String,
    pub tone: String,
}

pub async fn submit_rewrite<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
    Json(body): Json<RewriteRequest>,
) -> Result<Json<RewriteResult>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let result = state
        .rewriter
        .submit_rewrite(&user.account_id, &body.text, &body.mode, &body.tone)
        .await?;
    Ok(Json(result))
}
