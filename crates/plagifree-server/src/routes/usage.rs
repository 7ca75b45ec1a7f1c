use axum::Json;
use axum::extract::State;
use plagifree_core::traits::*;
use plagifree_engine::{Ledger, UsageSummary};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_usage<A, H, P>(
    State(state): State<AppState<A, H, P>>,
    user: AuthenticatedUser,
) -> Result<Json<UsageSummary>, ApiError>
where
    A: AccountStore,
    H: HistoryStore,
    P: PaymentStore,
{
    let account = state.current_account(&user.account_id).await?;
    Ok(Json(Ledger::usage(&account)))
}
